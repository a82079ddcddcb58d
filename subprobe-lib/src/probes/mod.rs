//! Probe implementations for subdomain reachability checking.
//!
//! This module contains the probes a pipeline runs against each host:
//!
//! - **DNS**: resolution against public resolvers, gates everything else
//! - **HTTP**: HEAD/GET requests over HTTPS with plain-HTTP fallback
//! - **Ping**: a single echo request via the system ping binary
//!
//! Probes are behind small async traits so the scheduler can be driven
//! by scripted fakes in tests and by custom transports in embedders.

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::types::ProbeOutcome;

/// DNS resolution capability.
///
/// A failed resolution is still an `Ok` outcome with `succeeded` false;
/// `Err` is reserved for the probe machinery itself breaking.
#[async_trait]
pub trait DnsProbe: Send + Sync {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Liveness probing capability, run only after DNS resolution succeeds.
///
/// Same error contract as [`DnsProbe`]: unreachable hosts are encoded
/// in the outcome, `Err` means the probe could not run at all.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError>;
}

pub mod dns;
pub mod http;
pub mod ping;

// Re-export probe implementations for convenience
pub use dns::DnsResolver;
pub use http::HttpProbe;
pub use ping::{is_ping_available, PingProbe};
