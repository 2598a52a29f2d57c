//! Local filesystem snapshot storage.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── {provider}/
//!     ├── served_areas.json
//!     └── services_in_area.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SnapshotKind;
use crate::storage::SnapshotStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path of a provider's snapshot.
    pub fn path(&self, provider: &str, kind: SnapshotKind) -> PathBuf {
        self.root_dir.join(provider).join(kind.file_name())
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_dir(path).await?;

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn read_snapshot(&self, provider: &str, kind: SnapshotKind) -> Result<Option<Vec<u8>>> {
        let path = self.path(provider, kind);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_snapshot(
        &self,
        provider: &str,
        kind: SnapshotKind,
        bytes: &[u8],
    ) -> Result<()> {
        let path = self.path(provider, kind);
        Self::write_atomic(&path, bytes)
            .await
            .map_err(|e| AppError::persistence(path.display(), e))
    }

    fn location(&self, provider: &str, kind: SnapshotKind) -> String {
        self.path(provider, kind).display().to_string()
    }
}
