// src/models/outcome.rs

//! Diff results and per-provider run outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Difference between two area maps. All lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AreaDiff {
    /// Areas present only in the new map
    pub added: Vec<String>,
    /// Areas present only in the old map
    pub removed: Vec<String>,
    /// Areas present in both whose URL differs
    pub changed: Vec<String>,
}

impl AreaDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

}

/// Service changes for a single area. Lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ServiceDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Sparse map: only areas whose service set differs appear.
pub type ServiceDiffMap = BTreeMap<String, ServiceDiff>;

/// Everything learned about one provider during a run.
#[derive(Debug, Clone, Default)]
pub struct ProviderResult {
    pub changed: bool,
    pub area_diff: AreaDiff,
    pub service_diff: ServiceDiffMap,
    /// At least one snapshot kind was written for the first time
    pub bootstrapped: bool,
    /// Rendered change report, present only when `changed`
    pub report: Option<String>,
}

/// What the orchestrator forwards for each provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderOutcome {
    Changed { changed: Flag<true>, detail: String },
    Error { error: Flag<true>, detail: String },
    Unchanged {
        changed: Flag<false>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        bootstrapped: bool,
    },
}

impl ProviderOutcome {
    pub fn changed(detail: impl Into<String>) -> Self {
        Self::Changed {
            changed: Flag,
            detail: detail.into(),
        }
    }

    pub fn unchanged(bootstrapped: bool) -> Self {
        Self::Unchanged {
            changed: Flag,
            bootstrapped,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self::Error {
            error: Flag,
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Report or diagnostic text, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Changed { detail, .. } | Self::Error { detail, .. } => Some(detail),
            Self::Unchanged { .. } => None,
        }
    }
}

impl From<ProviderResult> for ProviderOutcome {
    fn from(result: ProviderResult) -> Self {
        match result.report {
            Some(report) if result.changed => Self::changed(report),
            _ => Self::unchanged(result.bootstrapped),
        }
    }
}

/// Outcomes of one run keyed by provider id.
pub type RunSummary = BTreeMap<String, ProviderOutcome>;

/// A boolean that always serializes to `VALUE` and only deserializes from it.
///
/// Lets the untagged outcome enum keep the `{"changed": true, ...}` shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag<const VALUE: bool>;

impl<const VALUE: bool> Serialize for Flag<VALUE> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(VALUE)
    }
}

impl<'de, const VALUE: bool> Deserialize<'de> for Flag<VALUE> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value == VALUE {
            Ok(Flag)
        } else {
            Err(serde::de::Error::custom(format!("expected {VALUE}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_wire_shapes() {
        assert_eq!(
            serde_json::to_value(ProviderOutcome::changed("report")).unwrap(),
            json!({"changed": true, "detail": "report"})
        );
        assert_eq!(
            serde_json::to_value(ProviderOutcome::unchanged(false)).unwrap(),
            json!({"changed": false})
        );
        assert_eq!(
            serde_json::to_value(ProviderOutcome::error("boom")).unwrap(),
            json!({"error": true, "detail": "boom"})
        );
    }

    #[test]
    fn test_outcome_round_trip_picks_right_variant() {
        let parsed: ProviderOutcome =
            serde_json::from_value(json!({"error": true, "detail": "x"})).unwrap();
        assert!(parsed.is_error());

        let parsed: ProviderOutcome = serde_json::from_value(json!({"changed": false})).unwrap();
        assert_eq!(parsed, ProviderOutcome::unchanged(false));
    }

    #[test]
    fn test_result_without_report_is_unchanged() {
        let result = ProviderResult {
            bootstrapped: true,
            ..ProviderResult::default()
        };
        assert_eq!(ProviderOutcome::from(result), ProviderOutcome::unchanged(true));
    }

    #[test]
    fn test_area_diff_counts() {
        let diff = AreaDiff {
            added: vec!["A".into()],
            removed: vec![],
            changed: vec!["B".into(), "C".into()],
        };
        assert!(diff.has_changes());
        assert!(!AreaDiff::default().has_changes());
    }
}
