// src/monitor.rs
//! Cycle orchestrator: fetch, diff, notify, persist, sleep

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::baseline::BaselineStore;
use crate::crtsh::CrtShClient;
use crate::diff;
use crate::notifier::Notify;
use crate::types::{CycleSummary, DiscoveryResult};

/// Drives the discovery loop over all monitored domains.
///
/// Domains are processed sequentially in configured order. The baseline is
/// re-read at the start of every cycle and written back at most once, after
/// all domains have been processed, and only when something changed.
pub struct Monitor {
    domains: Vec<String>,
    interval: Duration,
    client: CrtShClient,
    store: BaselineStore,
    notifier: Arc<dyn Notify>,
}

impl Monitor {
    pub fn new(
        domains: Vec<String>,
        interval: Duration,
        client: CrtShClient,
        store: BaselineStore,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            domains,
            interval,
            client,
            store,
            notifier,
        }
    }

    /// Main monitoring loop; runs until the shutdown signal fires.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "Starting monitor for {} domain(s), interval {:?}",
            self.domains.len(),
            self.interval
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // Failures inside a cycle are per-domain and already handled;
            // an error here means the baseline itself could not be read.
            // The next cycle retries from the unchanged file.
            match self.run_cycle(&shutdown_rx).await {
                Ok(summary) => {
                    let new_total: usize = summary
                        .results
                        .iter()
                        .map(|r| r.new_subdomains.len())
                        .sum();
                    info!(
                        "Cycle complete: {} new subdomain(s) across {} domain(s), saved={}",
                        new_total,
                        summary.results.len(),
                        summary.saved
                    );
                }
                Err(e) => {
                    error!("Cycle aborted: {:#}", e);
                }
            }

            info!("Sleeping {:?} until next cycle", self.interval);

            // Sleep until next cycle or shutdown
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Monitor stopped");
    }

    /// Run one full pass over all monitored domains.
    pub async fn run_cycle(
        &self,
        shutdown_rx: &watch::Receiver<bool>,
    ) -> anyhow::Result<CycleSummary> {
        // Re-read every cycle so external edits to the file are honored
        let mut baseline = self.store.load().await?;

        let mut results = Vec::with_capacity(self.domains.len());
        let mut dirty = false;

        for domain in &self.domains {
            if *shutdown_rx.borrow() {
                info!("Shutdown requested, stopping cycle early");
                break;
            }

            let known = baseline.get(domain).cloned().unwrap_or_default();
            info!("Checking {} ({} known subdomains)", domain, known.len());

            let current = match self.client.fetch(domain).await {
                Ok(current) => current,
                Err(e) => {
                    // Skip this domain until the next cycle; no baseline
                    // change, no notification.
                    warn!("Fetch failed for {}: {:#}", domain, e);
                    results.push(DiscoveryResult {
                        domain: domain.clone(),
                        known_count: known.len(),
                        current: None,
                        new_subdomains: Default::default(),
                    });
                    continue;
                }
            };

            info!("Fetched {} subdomains for {}", current.len(), domain);

            let new_subdomains = diff::new_subdomains(&known, &current);

            if new_subdomains.is_empty() {
                info!("No new subdomains for {}", domain);
            } else {
                info!(
                    "Found {} new subdomain(s) for {}",
                    new_subdomains.len(),
                    domain
                );

                // Best-effort delivery: a lost report is better than
                // re-reporting the same names every future cycle.
                match self.notifier.notify(domain, &new_subdomains).await {
                    Ok(()) => info!("Notification sent for {}", domain),
                    Err(e) => warn!("Notification failed for {}: {:#}", domain, e),
                }

                baseline
                    .entry(domain.clone())
                    .or_default()
                    .extend(new_subdomains.iter().cloned());
                dirty = true;
            }

            results.push(DiscoveryResult {
                domain: domain.clone(),
                known_count: known.len(),
                current: Some(current),
                new_subdomains,
            });
        }

        // Single save per cycle, covering every domain's in-memory state.
        // On failure the old file stays in place and the same names will be
        // rediscovered and re-notified next cycle.
        let saved = if dirty {
            match self.store.save(&baseline).await {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to save baseline: {:#}", e);
                    false
                }
            }
        } else {
            false
        };

        Ok(CycleSummary {
            results,
            dirty,
            saved,
        })
    }
}
