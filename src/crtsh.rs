// src/crtsh.rs
//! Snapshot fetcher for the crt.sh certificate transparency index

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use crate::types::CrtShEntry;

const CRTSH_BASE_URL: &str = "https://crt.sh";

// crt.sh can take a long time to answer wide queries
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for crt.sh subdomain queries
pub struct CrtShClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CrtShClient {
    /// Create a new client against the public crt.sh instance
    pub fn new() -> Result<Self> {
        Self::with_base_url(CRTSH_BASE_URL.to_string())
    }

    /// Create a client against an alternative endpoint (used by tests)
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Fetch the current snapshot of subdomains for `domain`.
    ///
    /// Queries `%.{domain}` and returns every name that survives filtering:
    /// wildcard entries are dropped, names outside the parent domain are
    /// dropped, survivors are lower-cased. Duplicates collapse into the set.
    ///
    /// Does not retry; a transport error or malformed body is returned to the
    /// caller, which skips the domain until the next cycle.
    pub async fn fetch(&self, domain: &str) -> Result<BTreeSet<String>> {
        debug!("Querying crt.sh for %.{}", domain);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("q", format!("%.{}", domain)), ("output", "json".to_string())])
            .send()
            .await
            .context("Failed to query crt.sh")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "crt.sh query for {} failed with status {}",
                domain,
                response.status()
            );
        }

        // crt.sh sometimes returns non-JSON when overloaded
        let entries: Vec<CrtShEntry> = response
            .json()
            .await
            .context("Failed to parse crt.sh JSON")?;

        debug!("crt.sh returned {} entries for {}", entries.len(), domain);

        let mut subdomains = BTreeSet::new();
        for entry in &entries {
            // name_value may pack several names into one entry
            for name in entry.name_value.split('\n') {
                if let Some(normalized) = filter_candidate(name, domain) {
                    subdomains.insert(normalized);
                }
            }
        }

        Ok(subdomains)
    }
}

/// Apply the per-candidate filtering policy.
///
/// Returns the lower-cased name if it is wildcard-free and ends with
/// `.{domain}` (case-insensitive), `None` otherwise.
pub fn filter_candidate(name: &str, domain: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name.contains('*') {
        return None;
    }

    let lowered = name.to_lowercase();
    let suffix = format!(".{}", domain.to_lowercase());
    if !lowered.ends_with(&suffix) {
        return None;
    }

    Some(lowered)
}
