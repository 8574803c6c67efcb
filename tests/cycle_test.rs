// End-to-end cycle tests: fetch, diff, notify, persist
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subsentry::baseline::BaselineStore;
use subsentry::crtsh::CrtShClient;
use subsentry::monitor::Monitor;
use subsentry::notifier::Notify;
use subsentry::types::Baseline;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier stub that records every delivery
#[derive(Default)]
struct RecordingNotifier {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingNotifier {
    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, domain: &str, new_subdomains: &BTreeSet<String>) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((
            domain.to_string(),
            new_subdomains.iter().cloned().collect(),
        ));
        Ok(())
    }
}

/// Notifier stub whose transport always fails
struct FailingNotifier;

#[async_trait]
impl Notify for FailingNotifier {
    async fn notify(&self, _domain: &str, _new: &BTreeSet<String>) -> anyhow::Result<()> {
        anyhow::bail!("relay rejected the message")
    }
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn mount_crtsh(server: &MockServer, domain: &str, names: &[&str]) {
    let body: Vec<serde_json::Value> = names
        .iter()
        .map(|n| serde_json::json!({ "name_value": n }))
        .collect();

    Mock::given(method("GET"))
        .and(query_param("q", format!("%.{}", domain)))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn monitor_for(
    domains: &[&str],
    server: &MockServer,
    baseline_path: PathBuf,
    notifier: Arc<dyn Notify>,
) -> Monitor {
    Monitor::new(
        domains.iter().map(|d| d.to_string()).collect(),
        Duration::from_secs(3600),
        CrtShClient::with_base_url(server.uri()).unwrap(),
        BaselineStore::new(baseline_path),
        notifier,
    )
}

async fn load_baseline(path: &PathBuf) -> Baseline {
    BaselineStore::new(path.clone()).load().await.unwrap()
}

#[tokio::test]
async fn test_first_discovery_notifies_and_persists() {
    let server = MockServer::start().await;
    mount_crtsh(
        &server,
        "ex.com",
        &["a.ex.com", "b.ex.com", "*.c.ex.com", "d.other.com"],
    )
    .await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");
    let notifier = Arc::new(RecordingNotifier::default());

    let monitor = monitor_for(&["ex.com"], &server, baseline_path.clone(), notifier.clone());

    let (_tx, rx) = tokio::sync::watch::channel(false);
    let summary = monitor.run_cycle(&rx).await.unwrap();

    assert!(summary.dirty);
    assert!(summary.saved);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].known_count, 0);
    assert_eq!(
        summary.results[0].new_subdomains,
        set(&["a.ex.com", "b.ex.com"])
    );

    // Exactly one notification, names in lexicographic order
    let calls = notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ex.com");
    assert_eq!(calls[0].1, vec!["a.ex.com", "b.ex.com"]);

    // Persisted baseline reflects the filtered names
    let saved = load_baseline(&baseline_path).await;
    assert_eq!(saved["ex.com"], set(&["a.ex.com", "b.ex.com"]));
}

#[tokio::test]
async fn test_second_cycle_is_idempotent() {
    let server = MockServer::start().await;
    mount_crtsh(&server, "ex.com", &["a.ex.com", "b.ex.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");
    let notifier = Arc::new(RecordingNotifier::default());

    let monitor = monitor_for(&["ex.com"], &server, baseline_path, notifier.clone());

    let (_tx, rx) = tokio::sync::watch::channel(false);

    let first = monitor.run_cycle(&rx).await.unwrap();
    assert!(first.saved);

    // The remote set has not changed: nothing new, nothing saved
    let second = monitor.run_cycle(&rx).await.unwrap();
    assert!(!second.dirty);
    assert!(!second.saved);
    assert!(second.results[0].new_subdomains.is_empty());
    assert_eq!(second.results[0].known_count, 2);

    assert_eq!(notifier.calls().len(), 1);
}

#[tokio::test]
async fn test_known_subdomains_produce_no_notification() {
    let server = MockServer::start().await;
    mount_crtsh(&server, "ex.com", &["a.ex.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");

    // Pre-seed the baseline with the name the fetch will return
    let mut seeded = Baseline::new();
    seeded.insert("ex.com".to_string(), set(&["a.ex.com"]));
    BaselineStore::new(baseline_path.clone())
        .save(&seeded)
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor_for(&["ex.com"], &server, baseline_path, notifier.clone());

    let (_tx, rx) = tokio::sync::watch::channel(false);
    let summary = monitor.run_cycle(&rx).await.unwrap();

    assert!(!summary.dirty);
    assert!(!summary.saved);
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_skips_domain_but_cycle_continues() {
    let server = MockServer::start().await;

    // bad.com fails at the transport level, good.com succeeds with news
    Mock::given(method("GET"))
        .and(query_param("q", "%.bad.com"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_crtsh(&server, "good.com", &["new.good.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");

    let mut seeded = Baseline::new();
    seeded.insert("bad.com".to_string(), set(&["old.bad.com"]));
    BaselineStore::new(baseline_path.clone())
        .save(&seeded)
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor_for(
        &["bad.com", "good.com"],
        &server,
        baseline_path.clone(),
        notifier.clone(),
    );

    let (_tx, rx) = tokio::sync::watch::channel(false);
    let summary = monitor.run_cycle(&rx).await.unwrap();

    assert!(summary.saved);
    assert_eq!(summary.results.len(), 2);
    assert!(!summary.results[0].fetched());
    assert!(summary.results[1].fetched());

    // Single save persisted both: the failing domain verbatim, the
    // succeeding one updated
    let saved = load_baseline(&baseline_path).await;
    assert_eq!(saved["bad.com"], set(&["old.bad.com"]));
    assert_eq!(saved["good.com"], set(&["new.good.com"]));

    let calls = notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "good.com");
}

#[tokio::test]
async fn test_delivery_failure_does_not_block_baseline_update() {
    let server = MockServer::start().await;
    mount_crtsh(&server, "ex.com", &["a.ex.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");

    let monitor = monitor_for(
        &["ex.com"],
        &server,
        baseline_path.clone(),
        Arc::new(FailingNotifier),
    );

    let (_tx, rx) = tokio::sync::watch::channel(false);
    let summary = monitor.run_cycle(&rx).await.unwrap();

    // The report was lost but the names are still accepted
    assert!(summary.dirty);
    assert!(summary.saved);

    let saved = load_baseline(&baseline_path).await;
    assert_eq!(saved["ex.com"], set(&["a.ex.com"]));
}

#[tokio::test]
async fn test_baseline_only_grows() {
    let server = MockServer::start().await;
    // The fetch no longer returns old.ex.com
    mount_crtsh(&server, "ex.com", &["new.ex.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");

    let mut seeded = Baseline::new();
    seeded.insert("ex.com".to_string(), set(&["old.ex.com"]));
    BaselineStore::new(baseline_path.clone())
        .save(&seeded)
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor_for(&["ex.com"], &server, baseline_path.clone(), notifier);

    let (_tx, rx) = tokio::sync::watch::channel(false);
    let summary = monitor.run_cycle(&rx).await.unwrap();
    assert!(summary.saved);

    // Disappearance is not tracked: old ∪ new
    let saved = load_baseline(&baseline_path).await;
    assert_eq!(saved["ex.com"], set(&["old.ex.com", "new.ex.com"]));
}

#[tokio::test]
async fn test_shutdown_stops_cycle_between_domains() {
    let server = MockServer::start().await;
    mount_crtsh(&server, "ex.com", &["a.ex.com"]).await;

    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("known.json");

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor_for(&["ex.com"], &server, baseline_path, notifier.clone());

    // Signal raised before the cycle starts: no domain is processed
    let (tx, rx) = tokio::sync::watch::channel(false);
    tx.send(true).unwrap();

    let summary = monitor.run_cycle(&rx).await.unwrap();
    assert!(summary.results.is_empty());
    assert!(!summary.saved);
    assert!(notifier.calls().is_empty());
}
