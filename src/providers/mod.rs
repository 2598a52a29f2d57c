//! Provider scraper contract and plugins.
//!
//! A provider plugin implements [`ProviderScraper`]. `fetch_areas` is the
//! only required capability; a plugin that can also list services per area
//! returns a [`ServiceScraper`] from [`ProviderScraper::services`].
//!
//! Built-in plugins:
//! - `VoiceAbility` (`VoiceAbilityScraper`)
//! - `POhWER` (`PohwerScraper`)
//!
//! Additional plugins are declared as `[[sites]]` in the config file and
//! handled by `SiteScraper`.

mod pohwer;
mod registry;
mod site;
mod voiceability;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::{AreaMap, AreaServices, ServiceFetch};

pub use pohwer::PohwerScraper;
pub use registry::{ProviderRegistry, Rejection};
pub use site::SiteScraper;
pub use voiceability::VoiceAbilityScraper;

/// Shared state handed to every scraper call.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    pub client: Client,
    /// Per-request timeout, enforced by the client
    pub timeout: Duration,
}

impl ScrapeContext {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch a page body, treating non-2xx statuses as transport errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

/// The capability every provider plugin must expose.
#[async_trait]
pub trait ProviderScraper: Send + Sync {
    /// Provider identifier; also names the snapshot directory.
    fn id(&self) -> &str;

    /// Scrape the provider's served areas.
    ///
    /// Partial failures should be skipped; a failure to reach the provider
    /// at all is returned as an error.
    async fn fetch_areas(&self, ctx: &ScrapeContext) -> Result<AreaMap>;

    /// Optional per-area service listing.
    fn services(&self) -> Option<&dyn ServiceScraper> {
        None
    }
}

/// Optional capability: list the services offered in each area.
#[async_trait]
pub trait ServiceScraper: Send + Sync {
    /// Scrape services for every area in `areas`.
    ///
    /// An area whose page cannot be fetched or parsed is reported as
    /// [`AreaServices::Failed`](crate::models::AreaServices::Failed) rather
    /// than failing the whole call.
    async fn fetch_services(&self, areas: &AreaMap, ctx: &ScrapeContext) -> Result<ServiceFetch>;
}

/// Fetch and parse every area page, one at a time.
///
/// A fetch or parse failure is recorded against that area only.
pub(crate) async fn fetch_each_area<F>(
    areas: &AreaMap,
    ctx: &ScrapeContext,
    parse: F,
) -> ServiceFetch
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    let mut results = ServiceFetch::new();
    for (area, url) in areas {
        let entry = match ctx.fetch_text(url).await.and_then(|html| parse(&html)) {
            Ok(labels) => AreaServices::Listed(labels),
            Err(e) => {
                log::warn!("Services unavailable for {area} ({url}): {e}");
                AreaServices::failed(e)
            }
        };
        results.insert(area.clone(), entry);
    }
    results
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Capitalize like a sentence: first character upper, the rest lower.
pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Element text with each text node trimmed, then concatenated.
pub(crate) fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.map(str::trim).collect()
}
