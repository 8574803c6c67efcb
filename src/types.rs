// src/types.rs
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Known subdomains per monitored parent domain.
///
/// Sets are ordered so the persisted JSON arrays are stable across saves.
pub type Baseline = HashMap<String, BTreeSet<String>>;

/// One record from a crt.sh JSON query.
///
/// `name_value` may contain several DNS names separated by newlines; each
/// line is a separate candidate. Other fields of the response are ignored.
#[derive(Debug, Deserialize)]
pub struct CrtShEntry {
    #[serde(default)]
    pub name_value: String,
}

/// Outcome of checking a single domain within one cycle.
#[derive(Debug)]
pub struct DiscoveryResult {
    /// The monitored parent domain.
    pub domain: String,

    /// Baseline size for this domain before the check.
    pub known_count: usize,

    /// Full set returned by the snapshot fetch; `None` means the fetch
    /// failed and the domain was skipped this cycle.
    pub current: Option<BTreeSet<String>>,

    /// Names present in the current snapshot but not in the baseline.
    pub new_subdomains: BTreeSet<String>,
}

impl DiscoveryResult {
    /// Whether the fetch for this domain succeeded.
    pub fn fetched(&self) -> bool {
        self.current.is_some()
    }
}

/// Outcome of one full pass over all monitored domains.
#[derive(Debug)]
pub struct CycleSummary {
    pub results: Vec<DiscoveryResult>,

    /// Whether at least one domain gained new subdomains this cycle.
    pub dirty: bool,

    /// Whether the baseline file was written this cycle.
    pub saved: bool,
}
