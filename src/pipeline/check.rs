//! Per-provider change check.
//!
//! ```text
//! FetchAreas → DiffAreas → [PersistAreas]
//!            → FetchServices? → DiffServices → [PersistServices]
//!            → BuildReport? → Done
//! ```
//!
//! Any failing stage ends the check with a [`CheckError`] naming the stage.
//! When a snapshot kind has no prior snapshot, the fresh data is saved and
//! no changes are reported for it.

use std::fmt;

use thiserror::Error;

use crate::error::{AppError, error_chain};
use crate::models::{
    AreaMap, AreaServices, ProviderResult, ServiceDiffMap, ServiceFetch, ServiceMap, SnapshotKind,
    dedup_labels,
};
use crate::pipeline::diff::{diff_areas, diff_services};
use crate::pipeline::report::build_report;
use crate::providers::{ProviderScraper, ScrapeContext};
use crate::storage::{self, SnapshotStore};

/// Steps of a provider check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStage {
    FetchAreas,
    DiffAreas,
    PersistAreas,
    FetchServices,
    DiffServices,
    PersistServices,
    BuildReport,
    Done,
}

impl fmt::Display for CheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckStage::FetchAreas => "fetch_areas",
            CheckStage::DiffAreas => "diff_areas",
            CheckStage::PersistAreas => "persist_areas",
            CheckStage::FetchServices => "fetch_services",
            CheckStage::DiffServices => "diff_services",
            CheckStage::PersistServices => "persist_services",
            CheckStage::BuildReport => "build_report",
            CheckStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A provider check that stopped early.
#[derive(Debug, Error)]
#[error("{provider} failed at {stage}")]
pub struct CheckError {
    pub provider: String,
    pub stage: CheckStage,
    #[source]
    pub source: AppError,
}

impl CheckError {
    fn at(provider: &str, stage: CheckStage) -> impl FnOnce(AppError) -> Self + '_ {
        move |source| Self {
            provider: provider.to_string(),
            stage,
            source,
        }
    }

    /// Full diagnostic: category, stage and the whole error chain.
    pub fn diagnostic(&self) -> String {
        format!("[{}] {}", self.source.kind(), error_chain(self))
    }
}

/// Run one provider through fetch, diff, persist and report.
pub async fn check_provider(
    scraper: &dyn ProviderScraper,
    store: &dyn SnapshotStore,
    ctx: &ScrapeContext,
) -> Result<ProviderResult, CheckError> {
    let id = scraper.id();
    let mut result = ProviderResult::default();

    log::debug!("{id}: {}", CheckStage::FetchAreas);
    let areas = scraper
        .fetch_areas(ctx)
        .await
        .map_err(CheckError::at(id, CheckStage::FetchAreas))?;
    log::info!("{id}: found {} areas", areas.len());

    log::debug!("{id}: {}", CheckStage::DiffAreas);
    match storage::load::<AreaMap>(store, id, SnapshotKind::Areas).await {
        Some(previous) => {
            result.area_diff = diff_areas(&previous, &areas);
            if result.area_diff.has_changes() {
                log::info!(
                    "{id}: {} added, {} removed, {} changed areas",
                    result.area_diff.added.len(),
                    result.area_diff.removed.len(),
                    result.area_diff.changed.len()
                );
                storage::save(store, id, SnapshotKind::Areas, &areas)
                    .await
                    .map_err(CheckError::at(id, CheckStage::PersistAreas))?;
            }
        }
        None => {
            log::info!("{id}: no areas snapshot yet, recording {} areas", areas.len());
            storage::save(store, id, SnapshotKind::Areas, &areas)
                .await
                .map_err(CheckError::at(id, CheckStage::PersistAreas))?;
            result.bootstrapped = true;
        }
    }

    if let Some(service_scraper) = scraper.services() {
        log::debug!("{id}: {}", CheckStage::FetchServices);
        let fetched = service_scraper
            .fetch_services(&areas, ctx)
            .await
            .map_err(CheckError::at(id, CheckStage::FetchServices))?;

        log::debug!("{id}: {}", CheckStage::DiffServices);
        let previous = storage::load::<ServiceMap>(store, id, SnapshotKind::Services).await;
        let services = resolve_services(id, fetched, previous.as_ref());

        match previous {
            Some(previous) => {
                result.service_diff = diff_services(&previous, &services);
                if !result.service_diff.is_empty() {
                    log::info!(
                        "{id}: services changed in {} areas",
                        result.service_diff.len()
                    );
                    storage::save(store, id, SnapshotKind::Services, &services)
                        .await
                        .map_err(CheckError::at(id, CheckStage::PersistServices))?;
                }
            }
            None => {
                log::info!("{id}: no services snapshot yet, recording {} areas", services.len());
                storage::save(store, id, SnapshotKind::Services, &services)
                    .await
                    .map_err(CheckError::at(id, CheckStage::PersistServices))?;
                result.bootstrapped = true;
            }
        }
    }

    result.changed = result.area_diff.has_changes() || has_service_changes(&result.service_diff);
    if result.changed {
        log::debug!("{id}: {}", CheckStage::BuildReport);
        result.report = Some(build_report(id, &result.area_diff, &result.service_diff));
    }

    log::debug!("{id}: {}", CheckStage::Done);
    Ok(result)
}

/// Turn a raw service fetch into a snapshot.
///
/// Failed areas keep their previous services, so an unreachable page is
/// never reported as every service being withdrawn.
fn resolve_services(
    provider: &str,
    fetched: ServiceFetch,
    previous: Option<&ServiceMap>,
) -> ServiceMap {
    let mut services = ServiceMap::new();
    for (area, entry) in fetched {
        match entry {
            AreaServices::Listed(labels) => {
                services.insert(area, dedup_labels(labels));
            }
            AreaServices::Failed { error } => {
                let carried = previous.and_then(|p| p.get(&area)).cloned();
                log::warn!(
                    "{provider}: services for {area} unavailable ({error}); {}",
                    if carried.is_some() {
                        "keeping last known list"
                    } else {
                        "no previous list to keep"
                    }
                );
                if let Some(labels) = carried {
                    services.insert(area, labels);
                }
            }
        }
    }
    services
}

fn has_service_changes(diff: &ServiceDiffMap) -> bool {
    diff.values().any(|d| d.has_changes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::providers::ServiceScraper;
    use crate::storage::{LocalStorage, load, save};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fake {
        areas: AreaMap,
        services: Option<ServiceFetch>,
    }

    #[async_trait]
    impl ProviderScraper for Fake {
        fn id(&self) -> &str {
            "Fake"
        }

        async fn fetch_areas(&self, _ctx: &ScrapeContext) -> Result<AreaMap> {
            Ok(self.areas.clone())
        }

        fn services(&self) -> Option<&dyn ServiceScraper> {
            self.services.as_ref().map(|_| self as &dyn ServiceScraper)
        }
    }

    #[async_trait]
    impl ServiceScraper for Fake {
        async fn fetch_services(
            &self,
            _areas: &AreaMap,
            _ctx: &ScrapeContext,
        ) -> Result<ServiceFetch> {
            Ok(self.services.clone().unwrap_or_default())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ProviderScraper for Unreachable {
        fn id(&self) -> &str {
            "Unreachable"
        }

        async fn fetch_areas(&self, _ctx: &ScrapeContext) -> Result<AreaMap> {
            Err(AppError::parse("index page", "list container missing"))
        }
    }

    fn ctx() -> ScrapeContext {
        ScrapeContext::new(reqwest::Client::new(), Duration::from_secs(1))
    }

    fn areas(pairs: &[(&str, &str)]) -> AreaMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn listed(pairs: &[(&str, &[&str])]) -> ServiceFetch {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    AreaServices::Listed(v.iter().map(|s| s.to_string()).collect()),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cold_start_persists_without_reporting() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let fake = Fake {
            areas: areas(&[("North", "http://x/n")]),
            services: Some(listed(&[("North", &["IMHA"])])),
        };

        let result = check_provider(&fake, &store, &ctx()).await.unwrap();
        assert!(!result.changed);
        assert!(result.bootstrapped);
        assert!(result.report.is_none());

        let saved: AreaMap = load(&store, "Fake", SnapshotKind::Areas).await.unwrap();
        assert_eq!(saved, fake.areas);
        let saved: ServiceMap = load(&store, "Fake", SnapshotKind::Services).await.unwrap();
        assert_eq!(saved["North"], vec!["IMHA"]);
    }

    #[tokio::test]
    async fn test_second_run_without_changes() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let fake = Fake {
            areas: areas(&[("North", "http://x/n")]),
            services: None,
        };

        check_provider(&fake, &store, &ctx()).await.unwrap();
        let result = check_provider(&fake, &store, &ctx()).await.unwrap();
        assert!(!result.changed);
        assert!(!result.bootstrapped);
        assert!(!result.area_diff.has_changes());
    }

    #[tokio::test]
    async fn test_area_change_is_reported_and_saved() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        save(&store, "Fake", SnapshotKind::Areas, &areas(&[("A", "http://a/1")]))
            .await
            .unwrap();

        let fake = Fake {
            areas: areas(&[("A", "http://a/2"), ("B", "http://b")]),
            services: None,
        };
        let result = check_provider(&fake, &store, &ctx()).await.unwrap();

        assert!(result.changed);
        assert_eq!(result.area_diff.changed, vec!["A"]);
        assert_eq!(result.area_diff.added, vec!["B"]);
        let report = result.report.unwrap();
        assert!(report.starts_with("Changes Detected in Fake:"));
        assert!(report.contains("\t\tChanged URLs:\n\t\t\tA"));

        let saved: AreaMap = load(&store, "Fake", SnapshotKind::Areas).await.unwrap();
        assert_eq!(saved, fake.areas);
    }

    #[tokio::test]
    async fn test_service_change_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let current = areas(&[("A", "http://a")]);
        save(&store, "Fake", SnapshotKind::Areas, &current)
            .await
            .unwrap();
        let mut old = ServiceMap::new();
        old.insert("A".into(), vec!["Advocacy".into()]);
        save(&store, "Fake", SnapshotKind::Services, &old)
            .await
            .unwrap();

        let fake = Fake {
            areas: current,
            services: Some(listed(&[("A", &["Advocacy", "Befriending", "Befriending"])])),
        };
        let result = check_provider(&fake, &store, &ctx()).await.unwrap();

        assert!(result.changed);
        assert!(!result.area_diff.has_changes());
        assert_eq!(result.service_diff["A"].added, vec!["Befriending"]);
        assert!(result.service_diff["A"].removed.is_empty());

        let saved: ServiceMap = load(&store, "Fake", SnapshotKind::Services).await.unwrap();
        assert_eq!(saved["A"], vec!["Advocacy", "Befriending"]);
    }

    #[tokio::test]
    async fn test_failed_area_keeps_previous_services() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let current = areas(&[("A", "http://a"), ("B", "http://b")]);
        save(&store, "Fake", SnapshotKind::Areas, &current)
            .await
            .unwrap();
        let mut old = ServiceMap::new();
        old.insert("A".into(), vec!["IMHA".into()]);
        old.insert("B".into(), vec!["Care Act".into()]);
        save(&store, "Fake", SnapshotKind::Services, &old)
            .await
            .unwrap();

        let mut fetched = listed(&[("B", &["Care Act"])]);
        fetched.insert("A".into(), AreaServices::failed("timed out"));
        let fake = Fake {
            areas: current,
            services: Some(fetched),
        };

        let result = check_provider(&fake, &store, &ctx()).await.unwrap();
        assert!(!result.changed);
        assert!(result.service_diff.is_empty());

        let saved: ServiceMap = load(&store, "Fake", SnapshotKind::Services).await.unwrap();
        assert_eq!(saved, old);
    }

    #[tokio::test]
    async fn test_fetch_failure_names_stage() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());

        let err = check_provider(&Unreachable, &store, &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.stage, CheckStage::FetchAreas);
        assert!(matches!(err.source, AppError::Parse { .. }));

        let diagnostic = err.diagnostic();
        assert!(diagnostic.starts_with("[parse] Unreachable failed at fetch_areas"));
        assert!(diagnostic.contains("list container missing"));
        assert!(load::<AreaMap>(&store, "Unreachable", SnapshotKind::Areas)
            .await
            .is_none());
    }

    #[test]
    fn test_resolve_services_drops_unknown_failures() {
        let mut fetched = listed(&[("A", &["X", "X", "Y"])]);
        fetched.insert("New".into(), AreaServices::failed("503"));

        let services = resolve_services("Fake", fetched, None);
        assert_eq!(services.len(), 1);
        assert_eq!(services["A"], vec!["X", "Y"]);
    }
}
