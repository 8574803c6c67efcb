// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// SMTP settings for discovery notifications.
#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Parent domains to monitor, checked in this order every cycle.
    pub domains_to_monitor: Vec<String>,
    #[serde(default = "default_interval_hours")]
    pub monitoring_interval_hours: u64,
    pub email_settings: EmailSettings,
}

fn default_interval_hours() -> u64 {
    24
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Polling interval converted to seconds.
    pub fn interval_secs(&self) -> u64 {
        self.monitoring_interval_hours * 3600
    }
}
