//! Human-readable change reports.

use crate::models::{AreaDiff, ServiceDiffMap};

/// Render a provider's changes as indented text.
///
/// Categories without changes are left out entirely.
pub fn build_report(provider: &str, area_diff: &AreaDiff, service_diff: &ServiceDiffMap) -> String {
    let mut lines = vec![format!("Changes Detected in {provider}:"), String::new()];

    if area_diff.has_changes() {
        lines.push("\tProvided Areas Have changed:".to_string());
        push_section(&mut lines, "Added:", &area_diff.added);
        push_section(&mut lines, "Removed:", &area_diff.removed);
        push_section(&mut lines, "Changed URLs:", &area_diff.changed);
        lines.push(String::new());
    }

    for (area, changes) in service_diff.iter().filter(|(_, d)| d.has_changes()) {
        lines.push(format!("\tServices have changed in {area}:"));
        push_section(&mut lines, "Added:", &changes.added);
        push_section(&mut lines, "Removed:", &changes.removed);
    }

    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("\t\t{title}"));
    lines.extend(items.iter().map(|item| format!("\t\t\t{item}")));
}
