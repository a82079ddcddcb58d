//! # subprobe-lib
//!
//! A fast, concurrent library for probing subdomain reachability and
//! surfacing dangling-DNS takeover candidates.
//!
//! ## Features
//!
//! - **Input normalization**: schemes, paths and case stripped, wildcards flagged
//! - **DNS-gated pipelines**: hosts that don't resolve are never probed further
//! - **Two liveness probes**: HTTP(S) with fallback ladder, or system ping
//! - **Stable status taxonomy**: classification downstream tooling can key on
//! - **Bounded concurrency**: hundreds of hosts without flooding the network
//! - **Deterministic reports**: canonical ordering however probing interleaved
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subprobe_lib::{aggregate, normalize_entries, ProbeConfig, ProbeScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lines = vec![
//!         "api.example.com".to_string(),
//!         "*.example.com".to_string(),
//!         "old-cdn.example.com".to_string(),
//!     ];
//!     let (entries, _rejected) = normalize_entries(&lines);
//!
//!     let scheduler = ProbeScheduler::new(ProbeConfig::default())?;
//!     let results = scheduler.run(entries, None).await;
//!
//!     let (ordered, summary) = aggregate(results);
//!     for result in &ordered {
//!         println!("{}: {}", result.host, result.status);
//!     }
//!     println!("{} active, {} possible dangling", summary.active, summary.dangling);
//!     Ok(())
//! }
//! ```

// Re-export main types for easy access
pub use aggregate::aggregate;
pub use classify::{build_result, classify};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::ProbeError;
pub use normalize::{normalize, normalize_entries};
pub use probes::{is_ping_available, DnsProbe, DnsResolver, HttpProbe, LivenessProbe, PingProbe};
pub use scheduler::{CancelHandle, ProbeScheduler, ProgressCallback};
pub use types::{
    DomainEntry, DomainResult, DomainStatus, LivenessMode, ProbeConfig, ProbeKind, ProbeOutcome,
    RunSummary,
};

// Internal modules
mod aggregate;
mod classify;
mod config;
mod error;
mod normalize;
mod probes;
mod scheduler;
mod types;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Library version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
