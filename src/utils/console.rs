// src/utils/console.rs

//! Console formatting for run progress and summaries.
//!
//! Lines go through the `log` facade so they share the binary's
//! timestamps and level filter.

use crate::models::{ProviderOutcome, RunSummary};

const WIDTH: usize = 60;

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(WIDTH);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a separator line
pub fn separator() {
    log::info!("{}", "─".repeat(WIDTH));
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}

/// One-word status for a provider outcome.
pub fn status(outcome: &ProviderOutcome) -> &'static str {
    match outcome {
        ProviderOutcome::Changed { .. } => "changed",
        ProviderOutcome::Error { .. } => "error",
        ProviderOutcome::Unchanged {
            bootstrapped: true, ..
        } => "initial snapshot",
        ProviderOutcome::Unchanged { .. } => "unchanged",
    }
}

/// Counts of (changed, unchanged, error) outcomes.
pub fn tally(run: &RunSummary) -> (usize, usize, usize) {
    run.values().fold((0, 0, 0), |(c, u, e), outcome| match outcome {
        ProviderOutcome::Changed { .. } => (c + 1, u, e),
        ProviderOutcome::Error { .. } => (c, u, e + 1),
        ProviderOutcome::Unchanged { .. } => (c, u + 1, e),
    })
}

/// Print the end-of-run report.
pub fn run_summary(run: &RunSummary) {
    separator();
    for (provider, outcome) in run {
        sub_item(&format!("{provider}: {}", status(outcome)));
    }

    let (changed, unchanged, errors) = tally(run);
    summary(
        "Run complete",
        &[
            ("Providers", run.len().to_string()),
            ("Changed", changed.to_string()),
            ("Unchanged", unchanged.to_string()),
            ("Errors", errors.to_string()),
        ],
    );
}
