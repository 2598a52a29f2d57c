//! Snapshot persistence.
//!
//! Each provider owns a directory holding one JSON document per snapshot
//! kind:
//!
//! ```text
//! storage/providers/
//! ├── POhWER/
//! │   ├── served_areas.json       # AreaMap
//! │   └── services_in_area.json   # ServiceMap
//! └── VoiceAbility/
//!     └── served_areas.json
//! ```
//!
//! Reads are permissive: a missing, unreadable or malformed snapshot loads
//! as `None` and the provider starts over from empty. Writes replace the
//! whole document and surface failures as [`AppError::Persistence`].

pub mod local;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::SnapshotKind;

// Re-export for convenience
pub use local::LocalStorage;

/// Byte-level snapshot backend.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read a snapshot, returning `Ok(None)` when none was ever written.
    async fn read_snapshot(&self, provider: &str, kind: SnapshotKind) -> Result<Option<Vec<u8>>>;

    /// Replace a snapshot with `bytes`.
    async fn write_snapshot(&self, provider: &str, kind: SnapshotKind, bytes: &[u8])
    -> Result<()>;

    /// Human-readable location, used in diagnostics.
    fn location(&self, provider: &str, kind: SnapshotKind) -> String {
        format!("{provider}/{}", kind.file_name())
    }
}

/// Load and decode a snapshot.
///
/// Never fails: read and decode errors are logged and treated as "no prior
/// snapshot".
pub async fn load<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    provider: &str,
    kind: SnapshotKind,
) -> Option<T> {
    let bytes = match store.read_snapshot(provider, kind).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            log::warn!(
                "Could not read {} snapshot for {}: {}. Starting from empty.",
                kind.as_str(),
                provider,
                e
            );
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(
                "Ignoring malformed {} snapshot at {}: {}",
                kind.as_str(),
                store.location(provider, kind),
                e
            );
            None
        }
    }
}

/// Encode and persist a snapshot as pretty-printed JSON.
pub async fn save<T: Serialize + ?Sized>(
    store: &dyn SnapshotStore,
    provider: &str,
    kind: SnapshotKind,
    value: &T,
) -> Result<()> {
    let location = store.location(provider, kind);
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| AppError::persistence(&location, e))?;

    store
        .write_snapshot(provider, kind, &bytes)
        .await
        .map_err(|e| match e {
            AppError::Persistence { .. } => e,
            other => AppError::persistence(&location, other),
        })?;

    log::debug!("Saved {} snapshot to {}", kind.as_str(), location);
    Ok(())
}
