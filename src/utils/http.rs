// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;

use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::providers::ScrapeContext;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Client plus per-request timeout, ready to hand to the scrapers.
pub fn create_context(config: &CrawlerConfig) -> Result<ScrapeContext> {
    let client = create_client(config)?;
    Ok(ScrapeContext::new(
        client,
        Duration::from_secs(config.timeout_secs),
    ))
}
