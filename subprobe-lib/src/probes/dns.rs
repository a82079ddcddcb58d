//! DNS resolution probe.
//!
//! Resolves A and AAAA records against Google's public resolvers. This
//! is the gate for the whole pipeline: a host that does not resolve is
//! never probed further. Resolution failures are ordinary outcomes,
//! not errors, so one dead host can never abort a run.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use super::DnsProbe;
use crate::error::ProbeError;
use crate::types::{ProbeKind, ProbeOutcome};

/// Async DNS resolver probing A/AAAA records for one host at a time.
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsResolver {
    /// Create a resolver with the default timeout (5 seconds).
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a resolver with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        // One attempt only; resolution failures are terminal for a host
        opts.attempts = 1;
        opts.use_hosts_file = false;

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::google(), opts);

        Self { resolver, timeout }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsProbe for DnsResolver {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        let start = Instant::now();
        let lookup = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host)).await;
        let latency = start.elapsed();

        match lookup {
            Ok(Ok(response)) => {
                let ips: Vec<String> = response.iter().map(|ip| ip.to_string()).collect();
                if ips.is_empty() {
                    debug!(host = %host, "lookup returned no addresses");
                    return Ok(ProbeOutcome::failure(ProbeKind::Dns, "dns failure"));
                }
                debug!(host = %host, addresses = ips.len(), "resolved");
                Ok(ProbeOutcome::success(ProbeKind::Dns)
                    .with_ips(ips)
                    .with_latency(latency))
            }
            Ok(Err(e)) => {
                debug!(host = %host, error = %e, "resolution failed");
                Ok(ProbeOutcome::failure(ProbeKind::Dns, "dns failure"))
            }
            Err(_) => {
                debug!(host = %host, timeout = ?self.timeout, "resolution timed out");
                let mut outcome = ProbeOutcome::failure(ProbeKind::Dns, "dns failure");
                outcome.timed_out = true;
                Ok(outcome)
            }
        }
    }
}
