//! One orchestration pass over every registered provider.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::error_chain;
use crate::models::{ProviderOutcome, RunSummary};
use crate::notify::OutcomeSink;
use crate::pipeline::check::check_provider;
use crate::providers::{ProviderRegistry, ProviderScraper, ScrapeContext};
use crate::storage::SnapshotStore;

/// Check every provider once and forward each outcome to the sinks.
///
/// Providers run one after another in id order. A failing or panicking
/// provider only affects its own entry in the summary.
pub async fn run_once(
    registry: &ProviderRegistry,
    store: &dyn SnapshotStore,
    ctx: &ScrapeContext,
    sinks: &[Box<dyn OutcomeSink>],
) -> RunSummary {
    let mut summary = RunSummary::new();

    for rejection in registry.rejections() {
        // Duplicate ids were warned about at registration; the registered one runs.
        if registry.get(&rejection.provider).is_some() {
            continue;
        }
        let outcome = ProviderOutcome::error(format!(
            "[{}] {}",
            rejection.error.kind(),
            error_chain(&rejection.error)
        ));
        dispatch(sinks, &rejection.provider, &outcome).await;
        summary.insert(rejection.provider.clone(), outcome);
    }

    for scraper in registry.iter() {
        let outcome = process_provider(scraper, store, ctx).await;
        dispatch(sinks, scraper.id(), &outcome).await;
        summary.insert(scraper.id().to_string(), outcome);
    }

    summary
}

/// Check a single provider, turning failures and panics into an error outcome.
pub async fn process_provider(
    scraper: &dyn ProviderScraper,
    store: &dyn SnapshotStore,
    ctx: &ScrapeContext,
) -> ProviderOutcome {
    let id = scraper.id();
    log::info!("Checking {id}...");

    match AssertUnwindSafe(check_provider(scraper, store, ctx))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => {
            if result.changed {
                log::info!("{id}: changes detected");
            } else if result.bootstrapped {
                log::info!("{id}: initial snapshot recorded");
            } else {
                log::info!("{id}: no changes");
            }
            ProviderOutcome::from(result)
        }
        Ok(Err(e)) => {
            let diagnostic = e.diagnostic();
            log::error!("{diagnostic}");
            ProviderOutcome::error(diagnostic)
        }
        Err(panic) => {
            let diagnostic = format!("[panic] {id} panicked: {}", panic_message(panic.as_ref()));
            log::error!("{diagnostic}");
            ProviderOutcome::error(diagnostic)
        }
    }
}

async fn dispatch(sinks: &[Box<dyn OutcomeSink>], provider: &str, outcome: &ProviderOutcome) {
    for sink in sinks {
        if let Err(e) = sink.record(provider, outcome).await {
            log::warn!("{} could not record {provider}: {e}", sink.name());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
