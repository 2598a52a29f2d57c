//! areawatch CLI
//!
//! Checks every registered advocacy provider for changes to the areas it
//! serves and the services it offers there.

use std::path::{Path, PathBuf};

use areawatch::{
    error::{AppError, Result},
    models::Config,
    notify::{OutcomeSink, RunLog, WebhookNotifier},
    pipeline,
    providers::{ProviderRegistry, ProviderScraper},
    storage::LocalStorage,
    utils::{console, http},
};
use clap::{Parser, Subcommand};

/// areawatch - advocacy provider coverage watcher
#[derive(Parser, Debug)]
#[command(
    name = "areawatch",
    version,
    about = "Detects changes to advocacy providers' served areas and services"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every provider once (default)
    Run,

    /// Validate the configuration and provider registry
    Validate,

    /// List registered providers and their capabilities
    Providers,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the webhook is optional.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&cli.config).await,
        Command::Validate => validate(&cli.config),
        Command::Providers => {
            let config = Config::load_or_default(&cli.config);
            list_providers(&config);
            Ok(())
        }
    }
}

async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path);
    console::header("areawatch");
    log::info!("Snapshots: {}", config.paths.snapshot_dir.display());

    let registry = ProviderRegistry::from_config(&config);
    let ctx = http::create_context(&config.crawler)?;
    let store = LocalStorage::new(&config.paths.snapshot_dir);

    let mut sinks: Vec<Box<dyn OutcomeSink>> = vec![Box::new(RunLog::new(&config.paths.run_log))];
    match WebhookNotifier::from_config(&config, ctx.client.clone()) {
        Some(webhook) => sinks.push(Box::new(webhook)),
        None => log::info!(
            "No webhook configured (set notify.webhook_url or {}); notifications disabled",
            config.notify.webhook_env
        ),
    }

    let summary = pipeline::run_once(&registry, &store, &ctx, &sinks).await;
    console::run_summary(&summary);

    // Provider errors are reported through the sinks, not the exit code.
    Ok(())
}

fn validate(config_path: &Path) -> Result<()> {
    log::info!("Validating {}...", config_path.display());

    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        log::warn!("{} not found, validating defaults", config_path.display());
        Config::default()
    };

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {e}");
        return Err(e);
    }
    log::info!("✓ Config OK");

    let registry = ProviderRegistry::from_config(&config);
    if let Some(first) = registry.rejections().first() {
        for rejection in registry.rejections() {
            log::error!("✗ {}: {}", rejection.provider, rejection.error);
        }
        return Err(AppError::validation(format!(
            "{} provider(s) rejected, first: {}",
            registry.rejections().len(),
            first.provider
        )));
    }
    log::info!("✓ {} providers registered", registry.len());

    log::info!("All validations passed!");
    Ok(())
}

fn list_providers(config: &Config) {
    let registry = ProviderRegistry::from_config(config);
    console::header("Providers");
    for scraper in registry.iter() {
        let capabilities = if scraper.services().is_some() {
            "areas, services"
        } else {
            "areas"
        };
        console::sub_item(&format!("{} ({capabilities})", scraper.id()));
    }
    for rejection in registry.rejections() {
        console::sub_item(&format!("{} (rejected: {})", rejection.provider, rejection.error));
    }
}
