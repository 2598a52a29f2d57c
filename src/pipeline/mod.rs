//! Change detection pipeline.
//!
//! - `diff`: pure comparisons between snapshots
//! - `report`: renders a diff as text
//! - `check`: the per-provider state machine
//! - `run`: one pass over every registered provider

pub mod check;
pub mod diff;
pub mod report;
pub mod run;

pub use check::{CheckError, CheckStage, check_provider};
pub use diff::{diff_areas, diff_services};
pub use report::build_report;
pub use run::{process_provider, run_once};
