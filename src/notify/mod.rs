//! Outcome sinks.
//!
//! Every provider outcome of a run is handed to each configured sink:
//! the append-only [`RunLog`] and, when a URL is configured, the
//! [`WebhookNotifier`].

mod run_log;
mod webhook;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ProviderOutcome;

pub use run_log::RunLog;
pub use webhook::WebhookNotifier;

/// Consumer of per-provider outcomes.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    /// Short name used when a sink failure is logged.
    fn name(&self) -> &str;

    async fn record(&self, provider: &str, outcome: &ProviderOutcome) -> Result<()>;
}
