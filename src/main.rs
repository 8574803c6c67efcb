// src/main.rs
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use subsentry::baseline::BaselineStore;
use subsentry::cli::Cli;
use subsentry::config::Config;
use subsentry::crtsh::CrtShClient;
use subsentry::monitor::Monitor;
use subsentry::notifier::{EmailNotifier, Notify};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    cli.validate()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting subsentry...");

    // A missing or unreadable config is the one fatal startup error
    let config = Config::from_file(Path::new(&cli.config))
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {:#}", cli.config, e))?;

    if config.domains_to_monitor.is_empty() {
        anyhow::bail!("No domains configured in domains_to_monitor");
    }

    tracing::info!(
        "Monitoring {} domain(s) every {} hour(s)",
        config.domains_to_monitor.len(),
        config.monitoring_interval_hours
    );

    let client = CrtShClient::new()?;
    let store = BaselineStore::new(PathBuf::from(&cli.baseline));
    let notifier: Arc<dyn Notify> = Arc::new(EmailNotifier::new(config.email_settings.clone())?);

    let monitor = Monitor::new(
        config.domains_to_monitor.clone(),
        Duration::from_secs(config.interval_secs()),
        client,
        store,
        notifier,
    );

    // Shutdown signal, checked between domains and during the sleep
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    if cli.once {
        tracing::info!("Running a single cycle (--once)");
        let summary = monitor.run_cycle(&shutdown_rx).await?;
        let new_total: usize = summary
            .results
            .iter()
            .map(|r| r.new_subdomains.len())
            .sum();
        tracing::info!(
            "Cycle complete: {} new subdomain(s), saved={}",
            new_total,
            summary.saved
        );
        return Ok(());
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down...");
            shutdown_tx.send(true).ok();
        }
    });

    monitor.run(shutdown_rx).await;

    Ok(())
}
