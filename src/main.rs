use anyhow::{Context, Result};
use rental_scout::notify::{LogNotifier, Notifier, SlackNotifier};
use rental_scout::sources::CraigslistSource;
use rental_scout::store::SqliteStore;
use rental_scout::{Config, Scout, Supervisor};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rental_scout=info")),
        )
        .init();

    info!("🏠 Rental Scout - Craigslist housing watcher");

    let config_path = std::env::var("SCOUT_CONFIG").unwrap_or_else(|_| "scout.toml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    info!(
        "Watching {} on {} ({} regions, {} stations)",
        config.search.areas.join(", "),
        config.search.site,
        config.geo.regions.len(),
        config.geo.stations.len()
    );

    let store = Arc::new(
        SqliteStore::connect(&config.store.database_url)
            .await
            .context("Failed to open listing store")?,
    );
    let source = Arc::new(CraigslistSource::new().context("Failed to create HTTP client")?);
    let notifier: Arc<dyn Notifier> = match config.slack.token.clone() {
        Some(token) => Arc::new(SlackNotifier::new(token, &config.slack)?),
        None => {
            warn!("No Slack token set, listings will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let scout = Scout::new(config, source, store.clone(), notifier);
    let supervisor = Supervisor::new(scout);

    let summary = supervisor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        "Exiting after {} successful and {} failed cycles",
        summary.cycles_ok, summary.cycles_failed
    );
    store.close().await;

    Ok(())
}
