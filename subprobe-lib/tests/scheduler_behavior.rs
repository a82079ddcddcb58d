//! End-to-end scheduler behavior against scripted probes.
//!
//! These tests drive the real scheduler and classifier with fake DNS
//! and liveness probes, so every property here runs offline and
//! deterministically.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use subprobe_lib::{
    aggregate, normalize, normalize_entries, DnsProbe, DomainEntry, DomainStatus, LivenessProbe,
    ProbeConfig, ProbeError, ProbeKind, ProbeOutcome, ProbeScheduler, ProgressCallback,
};

/// DNS stub that resolves everything except the listed hosts.
struct ScriptedDns {
    calls: AtomicUsize,
    failing: HashSet<String>,
}

impl ScriptedDns {
    fn resolving_all() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: HashSet::new(),
        }
    }

    fn failing_for(hosts: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProbe for ScriptedDns {
    async fn probe(&self, host: &str) -> subprobe_lib::Result<ProbeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(host) {
            Ok(ProbeOutcome::failure(ProbeKind::Dns, "dns failure"))
        } else {
            Ok(ProbeOutcome::success(ProbeKind::Dns)
                .with_ips(vec!["192.0.2.10".to_string()])
                .with_latency(Duration::from_millis(2)))
        }
    }
}

/// What a scripted liveness probe should do for every host.
enum LivenessScript {
    /// Answer with this HTTP status code
    Respond(u16),
    /// Answer an echo request
    Echo,
    /// Fail with a timeout
    TimeOut,
    /// Fail at the transport level
    Refuse,
    /// Blow up the probe machinery itself
    Break,
}

struct ScriptedLiveness {
    calls: AtomicUsize,
    kind: ProbeKind,
    script: LivenessScript,
}

impl ScriptedLiveness {
    fn http(script: LivenessScript) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            kind: ProbeKind::Http,
            script,
        }
    }

    fn ping(script: LivenessScript) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            kind: ProbeKind::Ping,
            script,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for ScriptedLiveness {
    async fn probe(&self, host: &str) -> subprobe_lib::Result<ProbeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            LivenessScript::Respond(code) => {
                let mut outcome = ProbeOutcome::success(self.kind)
                    .with_latency(Duration::from_millis(40))
                    .with_detail(format!("HTTP {} (https)", code));
                outcome.status_code = Some(*code);
                Ok(outcome)
            }
            LivenessScript::Echo => Ok(ProbeOutcome::success(self.kind)
                .with_latency(Duration::from_millis(12))
                .with_detail("echo reply received")),
            LivenessScript::TimeOut => Ok(ProbeOutcome::timeout(self.kind)),
            LivenessScript::Refuse => {
                Ok(ProbeOutcome::failure(self.kind, "connection refused"))
            }
            LivenessScript::Break => Err(ProbeError::probe(host, "probe binary missing")),
        }
    }
}

/// Liveness probe that tracks how many pipelines run it at once.
struct GaugedLiveness {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    delay: Duration,
}

impl GaugedLiveness {
    fn with_delay(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            delay,
        }
    }

    fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for GaugedLiveness {
    async fn probe(&self, _host: &str) -> subprobe_lib::Result<ProbeOutcome> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ProbeOutcome::success(ProbeKind::Http)
            .with_latency(self.delay)
            .with_detail("HTTP 200 (https)"))
    }
}

fn entries_for(hosts: &[&str]) -> Vec<DomainEntry> {
    hosts.iter().map(|h| normalize(h).unwrap()).collect()
}

fn status_of<'a>(results: &'a [subprobe_lib::DomainResult], host: &str) -> &'a DomainStatus {
    &results
        .iter()
        .find(|r| r.host == host)
        .unwrap_or_else(|| panic!("no result for {}", host))
        .status
}

#[tokio::test]
async fn every_entry_yields_exactly_one_result() {
    let dns = Arc::new(ScriptedDns::failing_for(&["dead.example.com"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler =
        ProbeScheduler::with_probes(ProbeConfig::default(), dns.clone(), liveness.clone());

    let entries = entries_for(&[
        "up.example.com",
        "dead.example.com",
        "*.example.com",
        "up.example.com",
    ]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results.len(), 4);
    let dupes = results
        .iter()
        .filter(|r| r.host == "up.example.com")
        .count();
    assert_eq!(dupes, 2);
}

#[tokio::test]
async fn duplicate_entries_are_probed_independently() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler =
        ProbeScheduler::with_probes(ProbeConfig::default(), dns.clone(), liveness.clone());

    let entries = entries_for(&["api.example.com", "api.example.com"]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results.len(), 2);
    assert_eq!(dns.calls(), 2);
    assert_eq!(liveness.calls(), 2);
}

#[tokio::test]
async fn wildcard_entries_never_touch_the_network() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler =
        ProbeScheduler::with_probes(ProbeConfig::default(), dns.clone(), liveness.clone());

    let entries = entries_for(&["*.example.com", "cdn.*.internal.example.com"]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, DomainStatus::SkippedWildcard);
        assert!(result.ips.is_empty());
    }
    assert_eq!(dns.calls(), 0);
    assert_eq!(liveness.calls(), 0);
}

#[tokio::test]
async fn dns_failure_skips_liveness_probing() {
    let dns = Arc::new(ScriptedDns::failing_for(&["gone.example.com"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler =
        ProbeScheduler::with_probes(ProbeConfig::default(), dns.clone(), liveness.clone());

    let entries = entries_for(&["gone.example.com"]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results[0].status, DomainStatus::NoResponseDnsFailed);
    assert_eq!(results[0].detail, "dns failure");
    assert_eq!(liveness.calls(), 0);
}

#[tokio::test]
async fn liveness_timeout_classifies_no_response_timeout() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::TimeOut));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler
        .run(entries_for(&["slow.example.com"]), None)
        .await;

    assert_eq!(results[0].status, DomainStatus::NoResponseTimeout);
}

#[tokio::test]
async fn any_status_code_counts_as_active() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(503)));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler
        .run(entries_for(&["broken.example.com"]), None)
        .await;

    assert_eq!(results[0].status, DomainStatus::Active);
    assert_eq!(results[0].status_code, Some(503));
}

#[tokio::test]
async fn refused_http_flags_possible_dangling() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Refuse));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler
        .run(entries_for(&["stale.example.com"]), None)
        .await;

    assert_eq!(results[0].status, DomainStatus::PossibleDanglingDns);
    assert!(!results[0].ips.is_empty());
}

#[tokio::test]
async fn refused_ping_flags_ping_failed() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::ping(LivenessScript::Refuse));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler
        .run(entries_for(&["quiet.example.com"]), None)
        .await;

    assert_eq!(results[0].status, DomainStatus::NoResponsePingFailed);
}

#[tokio::test]
async fn echo_reply_classifies_active() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::ping(LivenessScript::Echo));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler.run(entries_for(&["up.example.com"]), None).await;

    assert_eq!(results[0].status, DomainStatus::Active);
    assert!(results[0].status_code.is_none());
}

#[tokio::test]
async fn broken_probe_becomes_error_row_and_run_continues() {
    let dns = Arc::new(ScriptedDns::failing_for(&["gone.example.com"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Break));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let entries = entries_for(&[
        "first.example.com",
        "gone.example.com",
        "last.example.com",
    ]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        *status_of(&results, "first.example.com"),
        DomainStatus::Error
    );
    assert_eq!(
        *status_of(&results, "gone.example.com"),
        DomainStatus::NoResponseDnsFailed
    );
    assert_eq!(
        *status_of(&results, "last.example.com"),
        DomainStatus::Error
    );
}

#[tokio::test]
async fn aggregation_is_completion_order_independent() {
    let hosts = [
        "cdn.example.com",
        "api.example.com",
        "dead.example.com",
        "*.example.com",
        "mail.example.com",
    ];

    let mut orderings = Vec::new();
    for concurrency in [1, 8] {
        let dns = Arc::new(ScriptedDns::failing_for(&["dead.example.com"]));
        let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
        let scheduler = ProbeScheduler::with_probes(
            ProbeConfig::default().with_concurrency(concurrency),
            dns,
            liveness,
        );

        let results = scheduler.run(entries_for(&hosts), None).await;
        let (ordered, summary) = aggregate(results);
        let host_order: Vec<String> = ordered.iter().map(|r| r.host.clone()).collect();
        orderings.push((host_order, summary));
    }

    assert_eq!(orderings[0], orderings[1]);
}

#[tokio::test]
async fn summary_counts_match_result_statuses() {
    let dns = Arc::new(ScriptedDns::failing_for(&["dead.example.com"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Refuse));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let entries = entries_for(&[
        "stale.example.com",
        "dead.example.com",
        "*.example.com",
        "old.example.com",
    ]);
    let results = scheduler.run(entries, None).await;
    let (ordered, summary) = aggregate(results);

    assert_eq!(summary.total(), ordered.len());
    assert_eq!(summary.dangling, 2);
    assert_eq!(summary.no_response, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.active, 0);
    assert_eq!(summary.error, 0);
}

#[tokio::test]
async fn mixed_input_end_to_end() {
    let lines = vec![
        "https://good.example.com".to_string(),
        "*.example.com".to_string(),
        "nonexistent-xyz123.invalid".to_string(),
    ];
    let (entries, rejected) = normalize_entries(&lines);
    assert_eq!(entries.len(), 3);
    assert!(rejected.is_empty());

    let dns = Arc::new(ScriptedDns::failing_for(&["nonexistent-xyz123.invalid"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let results = scheduler.run(entries, None).await;

    assert_eq!(
        *status_of(&results, "good.example.com"),
        DomainStatus::Active
    );
    assert_eq!(
        *status_of(&results, "*.example.com"),
        DomainStatus::SkippedWildcard
    );
    assert_eq!(
        *status_of(&results, "nonexistent-xyz123.invalid"),
        DomainStatus::NoResponseDnsFailed
    );

    let (ordered, summary) = aggregate(results);
    assert_eq!(ordered[0].host, "good.example.com");
    assert_eq!(summary.active, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.no_response, 1);
}

#[tokio::test]
async fn concurrency_high_water_mark_stays_bounded() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(GaugedLiveness::with_delay(Duration::from_millis(25)));
    let scheduler = ProbeScheduler::with_probes(
        ProbeConfig::default().with_concurrency(4),
        dns,
        liveness.clone(),
    );

    let hosts: Vec<String> = (0..32).map(|i| format!("h{:02}.example.com", i)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let results = scheduler.run(entries_for(&host_refs), None).await;

    assert_eq!(results.len(), 32);
    assert!(
        liveness.high_water() <= 4,
        "high water mark was {}",
        liveness.high_water()
    );
    assert!(liveness.high_water() >= 1);
}

#[tokio::test]
async fn progress_reports_every_completion() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Box::new(move |done, total, _result| {
        sink.lock().unwrap().push((done, total));
    });

    let hosts: Vec<String> = (0..6).map(|i| format!("h{}.example.com", i)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    scheduler.run(entries_for(&host_refs), Some(progress)).await;

    let mut events = seen.lock().unwrap().clone();
    events.sort();
    let expected: Vec<(usize, usize)> = (1..=6).map(|i| (i, 6)).collect();
    assert_eq!(events, expected);
}

#[tokio::test]
async fn cancel_before_run_yields_error_rows() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler =
        ProbeScheduler::with_probes(ProbeConfig::default(), dns.clone(), liveness.clone());

    scheduler.cancel_handle().cancel();

    let entries = entries_for(&["a.example.com", "b.example.com"]);
    let results = scheduler.run(entries, None).await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, DomainStatus::Error);
        assert!(result.detail.contains("cancelled"));
    }
    assert_eq!(dns.calls(), 0);
    assert_eq!(liveness.calls(), 0);
}

#[tokio::test]
async fn cancel_mid_run_stops_remaining_pipelines() {
    let dns = Arc::new(ScriptedDns::resolving_all());
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler = ProbeScheduler::with_probes(
        ProbeConfig::default().with_concurrency(1),
        dns,
        liveness,
    );

    // Cancel from the progress callback after the first completion;
    // with concurrency 1 the remaining pipelines must all short-circuit.
    let cancel = scheduler.cancel_handle();
    let progress: ProgressCallback = Box::new(move |done, _total, _result| {
        if done == 1 {
            cancel.cancel();
        }
    });

    let hosts: Vec<String> = (0..5).map(|i| format!("h{}.example.com", i)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let results = scheduler.run(entries_for(&host_refs), Some(progress)).await;

    assert_eq!(results.len(), 5);
    let active = results
        .iter()
        .filter(|r| r.status == DomainStatus::Active)
        .count();
    let cancelled = results
        .iter()
        .filter(|r| r.status == DomainStatus::Error && r.detail.contains("cancelled"))
        .count();
    assert_eq!(active, 1);
    assert_eq!(cancelled, 4);
}

#[tokio::test]
async fn stream_yields_one_result_per_entry() {
    let dns = Arc::new(ScriptedDns::failing_for(&["dead.example.com"]));
    let liveness = Arc::new(ScriptedLiveness::http(LivenessScript::Respond(200)));
    let scheduler = ProbeScheduler::with_probes(ProbeConfig::default(), dns, liveness);

    let entries = entries_for(&["up.example.com", "dead.example.com", "*.example.com"]);
    let mut stream = scheduler.run_stream(entries);

    let mut hosts = HashSet::new();
    while let Some(result) = stream.next().await {
        hosts.insert(result.host);
    }

    assert_eq!(hosts.len(), 3);
    assert!(hosts.contains("up.example.com"));
    assert!(hosts.contains("*.example.com"));
}

#[test]
fn status_taxonomy_strings_are_stable() {
    let expectations = [
        (DomainStatus::Active, "ACTIVE"),
        (DomainStatus::NoResponseDnsFailed, "NO_RESPONSE_DNS_FAILED"),
        (DomainStatus::NoResponseTimeout, "NO_RESPONSE_TIMEOUT"),
        (DomainStatus::NoResponsePingFailed, "NO_RESPONSE_PING_FAILED"),
        (DomainStatus::PossibleDanglingDns, "POSSIBLE_DANGLING_DNS"),
        (DomainStatus::SkippedWildcard, "SKIPPED_WILDCARD"),
        (DomainStatus::Error, "ERROR"),
    ];

    for (status, expected) in expectations {
        assert_eq!(status.as_str(), expected);
        assert_eq!(status.to_string(), expected);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            format!("\"{}\"", expected)
        );
    }
}
