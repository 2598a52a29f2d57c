//! Selector-driven provider declared in the config file.

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AreaMap, ServiceFetch, SiteDefinition, dedup_labels};
use crate::providers::{
    ProviderScraper, ScrapeContext, ServiceScraper, clean_text, fetch_each_area, parse_selector,
};

/// A provider whose pages can be read with two CSS selectors.
#[derive(Debug, Clone)]
pub struct SiteScraper {
    definition: SiteDefinition,
    base: Url,
}

impl SiteScraper {
    /// Build a scraper, checking the definition's URL and selectors up front.
    pub fn from_definition(definition: SiteDefinition) -> Result<Self> {
        let base = Url::parse(&definition.areas_url)
            .map_err(|e| AppError::contract(&definition.id, format!("bad areas_url: {e}")))?;

        parse_selector(&definition.area_link_selector)
            .map_err(|e| AppError::contract(&definition.id, e))?;
        if let Some(selector) = &definition.service_selector {
            parse_selector(selector).map_err(|e| AppError::contract(&definition.id, e))?;
        }

        Ok(Self { definition, base })
    }

    fn parse_areas(&self, html: &str) -> Result<AreaMap> {
        let document = Html::parse_document(html);
        let links = parse_selector(&self.definition.area_link_selector)?;

        let mut areas = AreaMap::new();
        for link in document.select(&links) {
            let Some(href) = link.value().attr("href").map(str::trim) else {
                continue;
            };
            if let Some(marker) = &self.definition.href_contains {
                if !href.contains(marker.as_str()) {
                    continue;
                }
            }
            let name = clean_text(link.text());
            if name.is_empty() {
                continue;
            }
            if let Ok(url) = self.base.join(href) {
                areas.entry(name).or_insert_with(|| url.to_string());
            }
        }
        Ok(areas)
    }

    fn parse_services(selector: &str, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let labels = parse_selector(selector)?;

        let labels = document
            .select(&labels)
            .map(|el| clean_text(el.text()))
            .filter(|label| !label.is_empty())
            .collect();
        Ok(dedup_labels(labels))
    }
}

#[async_trait]
impl ProviderScraper for SiteScraper {
    fn id(&self) -> &str {
        &self.definition.id
    }

    async fn fetch_areas(&self, ctx: &ScrapeContext) -> Result<AreaMap> {
        let html = ctx.fetch_text(self.base.as_str()).await?;
        self.parse_areas(&html)
    }

    fn services(&self) -> Option<&dyn ServiceScraper> {
        self.definition
            .service_selector
            .as_ref()
            .map(|_| self as &dyn ServiceScraper)
    }
}

#[async_trait]
impl ServiceScraper for SiteScraper {
    async fn fetch_services(&self, areas: &AreaMap, ctx: &ScrapeContext) -> Result<ServiceFetch> {
        let Some(selector) = self.definition.service_selector.as_deref() else {
            return Err(AppError::contract(
                &self.definition.id,
                "no service_selector configured",
            ));
        };

        let parse = |html: &str| Self::parse_services(selector, html);
        Ok(fetch_each_area(areas, ctx, parse).await)
    }
}
