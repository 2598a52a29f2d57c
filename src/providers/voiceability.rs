//! VoiceAbility: one index page linking every area page.

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::{AreaMap, ServiceFetch, dedup_labels};
use crate::providers::{
    ProviderScraper, ScrapeContext, ServiceScraper, clean_text, fetch_each_area, parse_selector,
};

const ID: &str = "VoiceAbility";
const INDEX_URL: &str = "https://www.voiceability.org/support-and-help/services-in-your-area";
const AREA_HREF_MARKER: &str = "/services-by-location/";
const SERVICE_SPANS: &str = ".row__advocacyByServiceLocation span";

#[derive(Debug, Clone)]
pub struct VoiceAbilityScraper {
    index_url: String,
}

impl VoiceAbilityScraper {
    pub fn new() -> Self {
        Self::with_index_url(INDEX_URL)
    }

    pub fn with_index_url(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
        }
    }

    /// Extract area links from the index page. The first link per name wins.
    pub fn parse_areas(html: &str, base: &Url) -> Result<AreaMap> {
        let document = Html::parse_document(html);
        let links = parse_selector("a[href]")?;

        let mut areas = AreaMap::new();
        for link in document.select(&links) {
            let Some(href) = link.value().attr("href").map(str::trim) else {
                continue;
            };
            if !href.contains(AREA_HREF_MARKER) {
                continue;
            }
            let name = clean_text(link.text());
            if name.is_empty() {
                continue;
            }
            let Ok(url) = base.join(href) else {
                continue;
            };
            areas.entry(name).or_insert_with(|| url.to_string());
        }
        Ok(areas)
    }

    /// Extract service labels from an area page.
    pub fn parse_services(html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let spans = parse_selector(SERVICE_SPANS)?;

        let labels = document
            .select(&spans)
            .map(|span| clean_text(span.text()))
            .filter(|label| !label.is_empty())
            .collect();
        Ok(dedup_labels(labels))
    }
}

impl Default for VoiceAbilityScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderScraper for VoiceAbilityScraper {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch_areas(&self, ctx: &ScrapeContext) -> Result<AreaMap> {
        let base = Url::parse(&self.index_url)?;
        let html = ctx.fetch_text(&self.index_url).await?;
        Self::parse_areas(&html, &base)
    }

    fn services(&self) -> Option<&dyn ServiceScraper> {
        Some(self)
    }
}

#[async_trait]
impl ServiceScraper for VoiceAbilityScraper {
    async fn fetch_services(&self, areas: &AreaMap, ctx: &ScrapeContext) -> Result<ServiceFetch> {
        Ok(fetch_each_area(areas, ctx, Self::parse_services).await)
    }
}
