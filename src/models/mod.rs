// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains the data structures shared by the scrapers, the
//! snapshot store, the diff engine and the orchestrator.

mod config;
mod outcome;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, NotifyConfig, PathsConfig, ProviderSelection, SiteDefinition,
};
pub use outcome::{
    AreaDiff, Flag, ProviderOutcome, ProviderResult, RunSummary, ServiceDiff, ServiceDiffMap,
};
pub use snapshot::{AreaMap, AreaServices, ServiceFetch, ServiceMap, SnapshotKind, dedup_labels};
