//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Snapshot and log locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Change notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Which registered providers take part in a run
    #[serde(default)]
    pub providers: ProviderSelection,

    /// Selector-driven provider definitions
    #[serde(default)]
    pub sites: Vec<SiteDefinition>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.paths.snapshot_dir.as_os_str().is_empty() {
            return Err(AppError::validation("paths.snapshot_dir is empty"));
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.id.trim().is_empty() {
                return Err(AppError::validation("sites[].id is empty"));
            }
            if !seen.insert(site.id.as_str()) {
                return Err(AppError::validation(format!(
                    "sites[].id '{}' is defined twice",
                    site.id
                )));
            }
            url::Url::parse(&site.areas_url).map_err(|e| {
                AppError::validation(format!("sites '{}' has bad areas_url: {e}", site.id))
            })?;
        }
        Ok(())
    }

    /// Resolve the webhook URL from config first, then the environment.
    pub fn webhook_url(&self) -> Option<String> {
        self.notify
            .webhook_url
            .clone()
            .or_else(|| std::env::var(&self.notify.webhook_env).ok())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory holding one sub-directory per provider
    #[serde(default = "defaults::snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Append-only run log
    #[serde(default = "defaults::run_log")]
    pub run_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: defaults::snapshot_dir(),
            run_log: defaults::run_log(),
        }
    }
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Explicit webhook URL; takes precedence over the environment
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Environment variable consulted when `webhook_url` is unset
    #[serde(default = "defaults::webhook_env")]
    pub webhook_env: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_env: defaults::webhook_env(),
        }
    }
}

/// Provider enable/disable lists.
///
/// An empty `enabled` list means every registered provider runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderSelection {
    #[serde(default)]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub disabled: Vec<String>,
}

/// A provider described entirely by CSS selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Provider identifier (also the snapshot directory name)
    pub id: String,

    /// Page listing the served areas
    pub areas_url: String,

    /// Selector for area links on `areas_url`
    #[serde(default = "defaults::area_link_selector")]
    pub area_link_selector: String,

    /// Keep only links whose href contains this substring
    #[serde(default)]
    pub href_contains: Option<String>,

    /// Selector for service labels on each area page
    #[serde(default)]
    pub service_selector: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; areawatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    pub fn snapshot_dir() -> PathBuf {
        PathBuf::from("storage/providers")
    }
    pub fn run_log() -> PathBuf {
        PathBuf::from("storage/changes.log")
    }

    pub fn webhook_env() -> String {
        "DISCORD_WEBHOOK".into()
    }

    pub fn area_link_selector() -> String {
        "a[href]".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_config_error() {
        let err = Config::load("does/not/exist/config.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("does/not/exist/config.toml"));
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.crawler.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_sites_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 5

            [[sites]]
            id = "Acme"
            areas_url = "https://acme.example/areas"
            href_contains = "/area/"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.timeout_secs, 5);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].area_link_selector, "a[href]");
        assert!(config.sites[0].service_selector.is_none());
        assert_eq!(config.notify.webhook_env, "DISCORD_WEBHOOK");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_site_ids() {
        let site = SiteDefinition {
            id: "Acme".into(),
            areas_url: "https://acme.example/".into(),
            area_link_selector: "a".into(),
            href_contains: None,
            service_selector: None,
        };
        let config = Config {
            sites: vec![site.clone(), site],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_webhook_url_wins() {
        let mut config = Config::default();
        config.notify.webhook_url = Some(" https://hooks.example/abc ".into());
        config.notify.webhook_env = "AREAWATCH_TEST_UNSET_VAR".into();
        assert_eq!(
            config.webhook_url().as_deref(),
            Some("https://hooks.example/abc")
        );
    }

    #[test]
    fn missing_webhook_disables_notification() {
        let mut config = Config::default();
        config.notify.webhook_env = "AREAWATCH_TEST_SURELY_UNSET_VAR".into();
        assert!(config.webhook_url().is_none());
    }
}
