//! Provider registry.
//!
//! Maps provider ids to scraper plugins. Plugins are validated when they
//! are registered; a plugin that fails validation is kept as a
//! [`Rejection`] so the run can report it instead of silently skipping it.

use std::collections::{BTreeMap, HashSet};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::providers::{PohwerScraper, ProviderScraper, SiteScraper, VoiceAbilityScraper};

/// A provider that could not be registered.
#[derive(Debug)]
pub struct Rejection {
    pub provider: String,
    pub error: AppError,
}

/// Registered provider plugins, iterated in id order.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn ProviderScraper>>,
    rejections: Vec<Rejection>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in plugins only.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_or_reject(Box::new(VoiceAbilityScraper::new()));
        registry.register_or_reject(Box::new(PohwerScraper::new()));
        registry
    }

    /// Built-in plugins plus `[[sites]]`, filtered by `[providers]`.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();

        for site in &config.sites {
            match SiteScraper::from_definition(site.clone()) {
                Ok(scraper) => registry.register_or_reject(Box::new(scraper)),
                Err(error) => registry.reject(site.id.clone(), error),
            }
        }

        let selection = &config.providers;
        for id in &selection.disabled {
            if registry.providers.remove(id).is_some() {
                log::info!("Provider {id} disabled by config");
            }
        }

        // A rejected entry is only reported if it would otherwise have run.
        let mut reported = HashSet::new();
        registry.rejections.retain(|r| {
            !selection.disabled.contains(&r.provider)
                && (selection.enabled.is_empty() || selection.enabled.contains(&r.provider))
                && reported.insert(r.provider.clone())
        });

        if !selection.enabled.is_empty() {
            registry
                .providers
                .retain(|id, _| selection.enabled.iter().any(|e| e == id));

            for id in &selection.enabled {
                let known = registry.providers.contains_key(id)
                    || registry.rejections.iter().any(|r| &r.provider == id);
                if !known && !selection.disabled.contains(id) {
                    registry.reject(
                        id.clone(),
                        AppError::contract(id, "enabled in config but no scraper is registered"),
                    );
                }
            }
        }

        registry
    }

    /// Validate and add a plugin.
    pub fn register(&mut self, scraper: Box<dyn ProviderScraper>) -> Result<()> {
        let id = scraper.id().to_string();
        validate_id(&id)?;
        if self.providers.contains_key(&id) {
            return Err(AppError::contract(&id, "a provider with this id is already registered"));
        }
        log::debug!(
            "Registered provider {id} (services: {})",
            if scraper.services().is_some() { "yes" } else { "no" }
        );
        self.providers.insert(id, scraper);
        Ok(())
    }

    fn register_or_reject(&mut self, scraper: Box<dyn ProviderScraper>) {
        let id = scraper.id().to_string();
        if let Err(error) = self.register(scraper) {
            self.reject(id, error);
        }
    }

    fn reject(&mut self, provider: String, error: AppError) {
        log::warn!("Rejected provider {provider}: {error}");
        self.rejections.push(Rejection { provider, error });
    }

    pub fn get(&self, id: &str) -> Option<&dyn ProviderScraper> {
        self.providers.get(id).map(|p| p.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ProviderScraper> {
        self.providers.values().map(|p| p.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("rejections", &self.rejections)
            .finish()
    }
}

/// Provider ids double as directory names.
fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppError::contract(id, "provider id is empty"));
    }
    if id != id.trim() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(AppError::contract(
            id,
            "provider id must be usable as a directory name",
        ));
    }
    Ok(())
}
