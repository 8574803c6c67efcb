// src/baseline.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::types::Baseline;

/// Store for the known-subdomains baseline.
///
/// On disk the baseline is a JSON object mapping each parent domain to an
/// array of subdomain strings; in memory the arrays become sets. The file is
/// re-read at the start of every cycle so external edits between cycles are
/// picked up.
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the persisted baseline.
    ///
    /// A missing or empty file is a first run, not an error, and yields an
    /// empty baseline.
    pub async fn load(&self) -> Result<Baseline> {
        if !self.path.exists() {
            info!("Baseline file {:?} does not exist, starting fresh", self.path);
            return Ok(Baseline::new());
        }

        let contents = fs::read_to_string(&self.path)
            .await
            .context("Failed to read baseline file")?;

        if contents.trim().is_empty() {
            info!("Baseline file {:?} is empty, starting fresh", self.path);
            return Ok(Baseline::new());
        }

        let baseline: Baseline =
            serde_json::from_str(&contents).context("Failed to parse baseline file")?;

        debug!(
            "Loaded baseline for {} domains from {:?}",
            baseline.len(),
            self.path
        );

        Ok(baseline)
    }

    /// Persist the full baseline, replacing any previous state.
    ///
    /// Writes to a temporary file and renames it into place so a failed
    /// write never leaves a truncated baseline behind.
    pub async fn save(&self, baseline: &Baseline) -> Result<()> {
        debug!(
            "Saving baseline for {} domains to {:?}",
            baseline.len(),
            self.path
        );

        let json = serde_json::to_string_pretty(baseline)
            .context("Failed to serialize baseline to JSON")?;

        let temp_path = self.path.with_extension("tmp");

        fs::write(&temp_path, json)
            .await
            .context("Failed to write baseline to temporary file")?;

        fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to rename temporary baseline file")?;

        debug!("Baseline saved successfully");

        Ok(())
    }
}
