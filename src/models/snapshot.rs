// src/models/snapshot.rs

//! Snapshot payloads produced by provider scrapers.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Area display name → area page URL.
pub type AreaMap = BTreeMap<String, String>;

/// Area name → service labels offered there.
pub type ServiceMap = BTreeMap<String, Vec<String>>;

/// Raw output of a service scrape, before failed areas are resolved.
pub type ServiceFetch = BTreeMap<String, AreaServices>;

/// Services found for one area, or the reason they could not be fetched.
///
/// Untagged so a failed entry reads `{"error": "..."}` on disk and in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaServices {
    Listed(Vec<String>),
    Failed { error: String },
}

impl AreaServices {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }
}

/// The two independently persisted snapshot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Areas,
    Services,
}

impl SnapshotKind {
    /// File name inside the provider's snapshot directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Areas => "served_areas.json",
            SnapshotKind::Services => "services_in_area.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Areas => "areas",
            SnapshotKind::Services => "services",
        }
    }
}

/// Drop repeated labels, keeping the first occurrence.
pub fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_entry_wire_shape() {
        let mut fetch = ServiceFetch::new();
        fetch.insert("North".into(), AreaServices::failed("timed out"));
        fetch.insert(
            "South".into(),
            AreaServices::Listed(vec!["Advocacy".into()]),
        );

        let json = serde_json::to_value(&fetch).unwrap();
        assert_eq!(json["North"], serde_json::json!({"error": "timed out"}));
        assert_eq!(json["South"], serde_json::json!(["Advocacy"]));

        let back: ServiceFetch = serde_json::from_value(json).unwrap();
        assert!(matches!(back["North"], AreaServices::Failed { .. }));
        assert!(matches!(back["South"], AreaServices::Listed(_)));
    }

    #[test]
    fn test_dedup_labels_keeps_first() {
        let labels = vec!["IMHA".into(), "Care Act".into(), "IMHA".into()];
        assert_eq!(dedup_labels(labels), vec!["IMHA", "Care Act"]);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(SnapshotKind::Areas.file_name(), "served_areas.json");
        assert_eq!(SnapshotKind::Services.file_name(), "services_in_area.json");
    }
}
