//! Diff calculation between snapshots.
//!
//! Pure functions: no I/O, exact string comparison, sorted output so that
//! reports are reproducible.

use std::collections::BTreeSet;

use crate::models::{AreaDiff, AreaMap, ServiceDiff, ServiceDiffMap, ServiceMap};

/// Compare two area maps.
pub fn diff_areas(old: &AreaMap, new: &AreaMap) -> AreaDiff {
    // BTreeMap keys iterate in order, so the lists come out sorted.
    let added = new
        .keys()
        .filter(|name| !old.contains_key(*name))
        .cloned()
        .collect();

    let removed = old
        .keys()
        .filter(|name| !new.contains_key(*name))
        .cloned()
        .collect();

    let changed = new
        .iter()
        .filter(|(name, url)| old.get(*name).is_some_and(|prev| prev != *url))
        .map(|(name, _)| name.clone())
        .collect();

    AreaDiff {
        added,
        removed,
        changed,
    }
}

/// Compare two service maps, set-wise per area.
///
/// An area missing on one side counts as having no services there. Areas
/// whose sets match are left out of the result.
pub fn diff_services(old: &ServiceMap, new: &ServiceMap) -> ServiceDiffMap {
    let areas: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    areas
        .into_iter()
        .filter_map(|area| {
            let before = label_set(old.get(area));
            let after = label_set(new.get(area));

            let diff = ServiceDiff {
                added: after.difference(&before).map(|s| s.to_string()).collect(),
                removed: before.difference(&after).map(|s| s.to_string()).collect(),
            };

            diff.has_changes().then(|| (area.clone(), diff))
        })
        .collect()
}

fn label_set(labels: Option<&Vec<String>>) -> BTreeSet<&str> {
    labels
        .map(|labels| labels.iter().map(String::as_str).collect())
        .unwrap_or_default()
}
