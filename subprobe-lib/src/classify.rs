//! Status classification rules.
//!
//! The classifier is a pure function from an entry and its probe
//! outcomes to a [`DomainStatus`]. It never looks at the network; the
//! probes already captured everything it needs. Keeping it pure makes
//! the triage rules trivially testable and keeps policy out of the
//! probe implementations.

use std::collections::HashSet;
use std::time::Duration;

use crate::types::{DomainEntry, DomainResult, DomainStatus, ProbeKind, ProbeOutcome};

/// Classify a host from its probe outcomes.
///
/// Rules, applied in order:
/// 1. Wildcard entries are SKIPPED_WILDCARD, no probes consulted
/// 2. DNS failure means NO_RESPONSE_DNS_FAILED
/// 3. A liveness failure that was purely timeouts is NO_RESPONSE_TIMEOUT
/// 4. Any other liveness failure is POSSIBLE_DANGLING_DNS for HTTP
///    probing, NO_RESPONSE_PING_FAILED for echo probing
/// 5. DNS and liveness both succeeding is ACTIVE
///
/// Returns the status plus a human-readable reason.
pub fn classify(entry: &DomainEntry, outcomes: &[ProbeOutcome]) -> (DomainStatus, String) {
    if entry.is_wildcard {
        return (
            DomainStatus::SkippedWildcard,
            "wildcard entry, not probed".to_string(),
        );
    }

    let dns = match outcomes.iter().find(|o| o.kind == ProbeKind::Dns) {
        Some(outcome) => outcome,
        None => {
            return (
                DomainStatus::Error,
                "no probe outcomes recorded".to_string(),
            )
        }
    };

    if !dns.succeeded {
        let reason = dns.detail.clone().unwrap_or_else(|| "dns failure".to_string());
        return (DomainStatus::NoResponseDnsFailed, reason);
    }

    let liveness = match outcomes
        .iter()
        .find(|o| matches!(o.kind, ProbeKind::Http | ProbeKind::Ping))
    {
        Some(outcome) => outcome,
        None => {
            return (
                DomainStatus::Error,
                "liveness probe did not run".to_string(),
            )
        }
    };

    if liveness.succeeded {
        let reason = liveness
            .detail
            .clone()
            .unwrap_or_else(|| "responded".to_string());
        return (DomainStatus::Active, reason);
    }

    if liveness.timed_out {
        let reason = liveness
            .detail
            .clone()
            .unwrap_or_else(|| "timeout".to_string());
        return (DomainStatus::NoResponseTimeout, reason);
    }

    match liveness.kind {
        ProbeKind::Http => {
            let why = liveness
                .detail
                .clone()
                .unwrap_or_else(|| "no response on any scheme".to_string());
            (
                DomainStatus::PossibleDanglingDns,
                format!("resolves but never responds ({})", why),
            )
        }
        _ => {
            let reason = liveness
                .detail
                .clone()
                .unwrap_or_else(|| "ping failed".to_string());
            (DomainStatus::NoResponsePingFailed, reason)
        }
    }
}

/// Fold an entry and its outcomes into a final [`DomainResult`].
///
/// Collects the union of resolved IPs (input order, deduplicated),
/// picks the most informative latency, and copies HTTP extras when an
/// HTTP probe got a response.
pub fn build_result(entry: &DomainEntry, outcomes: &[ProbeOutcome]) -> DomainResult {
    let (status, detail) = classify(entry, outcomes);

    let mut seen = HashSet::new();
    let mut ips = Vec::new();
    for outcome in outcomes {
        for ip in &outcome.resolved_ips {
            if seen.insert(ip.clone()) {
                ips.push(ip.clone());
            }
        }
    }

    let http = outcomes.iter().find(|o| o.kind == ProbeKind::Http);

    DomainResult {
        host: entry.host.clone(),
        status,
        ips,
        latency: best_latency(outcomes),
        status_code: http.and_then(|o| o.status_code),
        server: http.and_then(|o| o.server.clone()),
        detail,
    }
}

/// The liveness probe's latency is the response time a reader cares
/// about; DNS latency is only reported when nothing deeper succeeded.
fn best_latency(outcomes: &[ProbeOutcome]) -> Option<Duration> {
    let liveness = outcomes
        .iter()
        .find(|o| matches!(o.kind, ProbeKind::Http | ProbeKind::Ping));
    if let Some(outcome) = liveness {
        if outcome.succeeded && outcome.latency.is_some() {
            return outcome.latency;
        }
    }

    outcomes
        .iter()
        .find(|o| o.kind == ProbeKind::Dns)
        .and_then(|o| if o.succeeded { o.latency } else { None })
}
