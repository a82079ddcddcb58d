//! Core types for subdomain reachability probing.
//!
//! This module defines the data structures used throughout the library
//! for representing normalized input entries, probe outcomes, classified
//! results, and probing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-probe timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of concurrently probed hosts.
pub(crate) const DEFAULT_CONCURRENCY: usize = 20;

/// A normalized input entry ready for probing.
///
/// Produced by the normalizer from a raw input line. Wildcard entries
/// are carried through to the results but never probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Original input text, kept for diagnostics
    pub raw: String,

    /// Cleaned hostname (lowercased, scheme and path stripped)
    pub host: String,

    /// True if the entry contains a `*` wildcard label
    pub is_wildcard: bool,
}

/// Which probe produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    /// DNS resolution probe
    #[serde(rename = "dns")]
    Dns,

    /// ICMP-style echo probe via the system ping binary
    #[serde(rename = "ping")]
    Ping,

    /// HTTP(S) request probe
    #[serde(rename = "http")]
    Http,
}

/// Raw result of a single probe attempt against one host.
///
/// Outcomes are facts, not judgements: the classifier turns the set of
/// outcomes for a host into a [`DomainStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Which probe ran
    pub kind: ProbeKind,

    /// Whether the probe got a definitive positive signal
    pub succeeded: bool,

    /// IP addresses discovered by this probe (DNS only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_ips: Vec<String>,

    /// Wall-clock time the probe took, when meaningful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,

    /// True when the failure was specifically a timeout
    pub timed_out: bool,

    /// HTTP status code, for HTTP probes that got a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Server header value, for HTTP probes that got a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Short human-readable note about what happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeOutcome {
    /// Create a successful outcome with no extra detail yet.
    pub fn success(kind: ProbeKind) -> Self {
        ProbeOutcome {
            kind,
            succeeded: true,
            resolved_ips: Vec::new(),
            latency: None,
            timed_out: false,
            status_code: None,
            server: None,
            detail: None,
        }
    }

    /// Create a failed outcome with a detail note.
    pub fn failure<D: Into<String>>(kind: ProbeKind, detail: D) -> Self {
        ProbeOutcome {
            kind,
            succeeded: false,
            resolved_ips: Vec::new(),
            latency: None,
            timed_out: false,
            status_code: None,
            server: None,
            detail: Some(detail.into()),
        }
    }

    /// Create a failed outcome marking a timeout.
    pub fn timeout(kind: ProbeKind) -> Self {
        let mut outcome = Self::failure(kind, "timeout");
        outcome.timed_out = true;
        outcome
    }

    /// Attach resolved IP addresses.
    pub fn with_ips(mut self, ips: Vec<String>) -> Self {
        self.resolved_ips = ips;
        self
    }

    /// Attach a measured latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Attach or replace the detail note.
    pub fn with_detail<D: Into<String>>(mut self, detail: D) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Classified reachability status of a probed host.
///
/// The serialized names form a stable taxonomy that downstream tooling
/// keys on; they are never renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainStatus {
    /// Host resolved and answered a liveness probe
    #[serde(rename = "ACTIVE")]
    Active,

    /// DNS resolution failed, nothing else was attempted
    #[serde(rename = "NO_RESPONSE_DNS_FAILED")]
    NoResponseDnsFailed,

    /// Host resolved but every liveness attempt timed out
    #[serde(rename = "NO_RESPONSE_TIMEOUT")]
    NoResponseTimeout,

    /// Host resolved but the echo probe got no reply
    #[serde(rename = "NO_RESPONSE_PING_FAILED")]
    NoResponsePingFailed,

    /// Host resolved but refused or ignored HTTP(S); takeover candidate
    #[serde(rename = "POSSIBLE_DANGLING_DNS")]
    PossibleDanglingDns,

    /// Wildcard entry, never probed
    #[serde(rename = "SKIPPED_WILDCARD")]
    SkippedWildcard,

    /// The pipeline itself failed unexpectedly
    #[serde(rename = "ERROR")]
    Error,
}

impl DomainStatus {
    /// Stable string form of the status, matching the serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Active => "ACTIVE",
            DomainStatus::NoResponseDnsFailed => "NO_RESPONSE_DNS_FAILED",
            DomainStatus::NoResponseTimeout => "NO_RESPONSE_TIMEOUT",
            DomainStatus::NoResponsePingFailed => "NO_RESPONSE_PING_FAILED",
            DomainStatus::PossibleDanglingDns => "POSSIBLE_DANGLING_DNS",
            DomainStatus::SkippedWildcard => "SKIPPED_WILDCARD",
            DomainStatus::Error => "ERROR",
        }
    }

    /// True for the statuses that mean "resolved but unreachable".
    pub fn is_no_response(&self) -> bool {
        matches!(
            self,
            DomainStatus::NoResponseDnsFailed
                | DomainStatus::NoResponseTimeout
                | DomainStatus::NoResponsePingFailed
        )
    }
}

/// Final classified result for a single input entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResult {
    /// The normalized hostname this result is about
    pub host: String,

    /// Classified reachability status
    pub status: DomainStatus,

    /// All IP addresses discovered while probing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,

    /// Latency of the most informative successful probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,

    /// HTTP status code, when an HTTP probe got a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Server header value, when an HTTP probe got a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Human-readable reason for the classification
    pub detail: String,
}

impl DomainResult {
    /// Build an ERROR row for a host whose pipeline failed outright.
    pub fn error<H: Into<String>, D: Into<String>>(host: H, detail: D) -> Self {
        DomainResult {
            host: host.into(),
            status: DomainStatus::Error,
            ips: Vec::new(),
            latency: None,
            status_code: None,
            server: None,
            detail: detail.into(),
        }
    }
}

/// Which liveness probe a run uses after DNS resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivenessMode {
    /// HEAD/GET requests over HTTPS with HTTP fallback
    #[serde(rename = "http")]
    Http,

    /// Single echo request via the system ping binary
    #[serde(rename = "ping")]
    Ping,
}

/// Configuration for a probing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Maximum number of hosts probed at once
    pub concurrency: usize,

    /// Per-probe timeout
    #[serde(skip)]
    pub timeout: Duration,

    /// Liveness probe selection
    pub liveness: LivenessMode,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            liveness: LivenessMode::Http,
        }
    }
}

impl ProbeConfig {
    /// Set the concurrency level, clamped to a sane range.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the liveness probe.
    pub fn with_liveness(mut self, liveness: LivenessMode) -> Self {
        self.liveness = liveness;
        self
    }
}

/// Per-status counts for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Hosts classified ACTIVE
    pub active: usize,

    /// Hosts in any NO_RESPONSE_* status
    pub no_response: usize,

    /// Hosts classified POSSIBLE_DANGLING_DNS
    pub dangling: usize,

    /// Wildcard entries that were skipped
    pub skipped: usize,

    /// Hosts whose pipeline errored
    pub error: usize,
}

impl RunSummary {
    /// Add one result's status to the counts.
    pub fn record(&mut self, status: DomainStatus) {
        match status {
            DomainStatus::Active => self.active += 1,
            DomainStatus::NoResponseDnsFailed
            | DomainStatus::NoResponseTimeout
            | DomainStatus::NoResponsePingFailed => self.no_response += 1,
            DomainStatus::PossibleDanglingDns => self.dangling += 1,
            DomainStatus::SkippedWildcard => self.skipped += 1,
            DomainStatus::Error => self.error += 1,
        }
    }

    /// Total number of results recorded.
    pub fn total(&self) -> usize {
        self.active + self.no_response + self.dangling + self.skipped + self.error
    }
}

// Implement Display for user-facing output

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::Dns => write!(f, "DNS"),
            ProbeKind::Ping => write!(f, "PING"),
            ProbeKind::Http => write!(f, "HTTP"),
        }
    }
}

impl std::fmt::Display for LivenessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LivenessMode::Http => write!(f, "http"),
            LivenessMode::Ping => write!(f, "ping"),
        }
    }
}
