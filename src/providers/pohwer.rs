//! POhWER: an index of regional section pages, each linking area pages.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AreaMap, ServiceFetch, dedup_labels};
use crate::providers::{
    ProviderScraper, ScrapeContext, ServiceScraper, capitalize, clean_text, fetch_each_area,
    parse_selector,
};

const ID: &str = "POhWER";
const BASE_URL: &str = "https://www.pohwer.net";
const INDEX_URL: &str = "https://www.pohwer.net/Pages/Category/in-your-area";

/// Links on section pages that are never areas.
const EXCLUDED_HREFS: &[&str] = &["contact", "e-hill-neighbourhood-network-scheme-nns", "cdn-cgi"];

const SECTION_LINKS: &str = "div.content.listContent div.listedPostText a[href]";
const AREA_LINKS: &str = "div.content.postContent.pageContent a[href]";
const SERVICE_SECTION: &str = "section.headerTextSubsite";

#[derive(Debug, Clone)]
pub struct PohwerScraper {
    base_url: String,
    index_url: String,
}

impl PohwerScraper {
    pub fn new() -> Self {
        Self::with_urls(BASE_URL, INDEX_URL)
    }

    pub fn with_urls(base_url: impl Into<String>, index_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            index_url: index_url.into(),
        }
    }

    /// Section page URLs listed on the index, in page order.
    pub fn parse_sections(html: &str, base: &Url) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let links = parse_selector(SECTION_LINKS)?;

        let mut sections: Vec<String> = Vec::new();
        for link in document.select(&links) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Ok(url) = base.join(href.trim()) else {
                continue;
            };
            let url = url.to_string();
            if !sections.contains(&url) {
                sections.push(url);
            }
        }
        Ok(sections)
    }

    /// Area links on one section page, merged into `areas`.
    ///
    /// Later links overwrite earlier ones with the same name.
    pub fn parse_section_areas(
        html: &str,
        section: &Url,
        base_url: &str,
        areas: &mut AreaMap,
    ) -> Result<()> {
        let document = Html::parse_document(html);
        let links = parse_selector(AREA_LINKS)?;

        for link in document.select(&links) {
            let Some(href) = link.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.is_empty() || EXCLUDED_HREFS.iter().any(|x| href.contains(x)) {
                continue;
            }
            let Ok(full) = section.join(href) else {
                continue;
            };
            let full_str = full.to_string();
            if !full_str.starts_with(base_url) {
                continue;
            }

            let text = clean_text(link.text());
            let name = if text.is_empty() {
                capitalize(&full.path().trim_matches('/').replace('-', " "))
            } else {
                capitalize(&text)
            };
            areas.insert(name, full_str);
        }
        Ok(())
    }

    /// Service labels from an area page.
    pub fn parse_services(html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let section_sel = parse_selector(SERVICE_SECTION)?;
        let list_sel = parse_selector("ul")?;
        let item_sel = parse_selector("li")?;
        let spans = parse_selector("span")?;
        let anchors = parse_selector("a")?;

        // Only the first list of the first services section is read.
        let list = document
            .select(&section_sel)
            .next()
            .and_then(|section| section.select(&list_sel).next())
            .ok_or_else(|| {
                AppError::parse(
                    "POhWER area page",
                    "no service list under section.headerTextSubsite",
                )
            })?;

        let mut labels = Vec::new();
        for item in list.select(&item_sel) {
            let item_spans: Vec<ElementRef> = item.select(&spans).collect();
            if item_spans.is_empty() {
                labels.push(clean_text(item.text()));
                continue;
            }
            labels.extend(
                item_spans
                    .into_iter()
                    .filter(|span| span.select(&anchors).next().is_some())
                    .map(|span| clean_text(span.text())),
            );
        }
        labels.retain(|label| !label.is_empty());
        Ok(dedup_labels(labels))
    }
}

impl Default for PohwerScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderScraper for PohwerScraper {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch_areas(&self, ctx: &ScrapeContext) -> Result<AreaMap> {
        let base = Url::parse(&self.base_url)?;
        let mut areas = AreaMap::new();

        // An unreachable index must not read as every area being withdrawn.
        let index = ctx.fetch_text(&self.index_url).await?;
        let sections = Self::parse_sections(&index, &base)?;
        log::debug!("{ID}: {} section pages", sections.len());

        for section in sections {
            let html = match ctx.fetch_text(&section).await {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("{ID}: skipping section {section}: {e}");
                    continue;
                }
            };
            let section_url = Url::parse(&section)?;
            Self::parse_section_areas(&html, &section_url, &self.base_url, &mut areas)?;
        }
        Ok(areas)
    }

    fn services(&self) -> Option<&dyn ServiceScraper> {
        Some(self)
    }
}

#[async_trait]
impl ServiceScraper for PohwerScraper {
    async fn fetch_services(&self, areas: &AreaMap, ctx: &ScrapeContext) -> Result<ServiceFetch> {
        Ok(fetch_each_area(areas, ctx, Self::parse_services).await)
    }
}
