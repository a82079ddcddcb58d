//! Bounded-concurrency probe scheduling.
//!
//! The scheduler drives the per-host pipeline (DNS, then liveness, then
//! classification) across a whole entry list without ever exceeding the
//! configured concurrency. Every entry produces exactly one result:
//! pipeline failures are caught and folded into ERROR rows rather than
//! aborting the run.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::classify::build_result;
use crate::error::ProbeError;
use crate::probes::{DnsProbe, DnsResolver, HttpProbe, LivenessProbe, PingProbe};
use crate::types::{DomainEntry, DomainResult, LivenessMode, ProbeConfig};

/// Callback invoked after each host completes: (done, total, result).
pub type ProgressCallback = Box<dyn Fn(usize, usize, &DomainResult) + Send + Sync>;

/// Cooperative cancellation flag shared between a scheduler and its
/// caller.
///
/// Cancelling does not interrupt probes already on the wire; it stops
/// pipelines at their next stage boundary. Cancelled hosts still
/// produce a result row so accounting stays complete.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a fresh, unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Concurrent scheduler for subdomain probing pipelines.
///
/// # Examples
///
/// ```rust,no_run
/// use subprobe_lib::{normalize, ProbeConfig, ProbeScheduler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scheduler = ProbeScheduler::new(ProbeConfig::default())?;
///     let entry = normalize("api.example.com")?;
///     let result = scheduler.probe_host(&entry).await;
///     println!("{}: {}", result.host, result.status);
///     Ok(())
/// }
/// ```
pub struct ProbeScheduler {
    config: ProbeConfig,
    dns: Arc<dyn DnsProbe>,
    liveness: Arc<dyn LivenessProbe>,
    cancel: CancelHandle,
}

impl ProbeScheduler {
    /// Create a scheduler with real probes built from the config.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let dns: Arc<dyn DnsProbe> = Arc::new(DnsResolver::with_timeout(config.timeout));
        let liveness: Arc<dyn LivenessProbe> = match config.liveness {
            LivenessMode::Http => Arc::new(HttpProbe::with_timeout(config.timeout)?),
            LivenessMode::Ping => Arc::new(PingProbe::with_timeout(config.timeout)),
        };

        Ok(Self {
            config,
            dns,
            liveness,
            cancel: CancelHandle::new(),
        })
    }

    /// Create a scheduler with caller-supplied probes.
    ///
    /// This is the seam tests and embedders use to swap in scripted or
    /// custom transports.
    pub fn with_probes(
        config: ProbeConfig,
        dns: Arc<dyn DnsProbe>,
        liveness: Arc<dyn LivenessProbe>,
    ) -> Self {
        Self {
            config,
            dns,
            liveness,
            cancel: CancelHandle::new(),
        }
    }

    /// The configuration this scheduler runs with.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// A handle that can cancel this scheduler's runs from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run the full pipeline for a single entry.
    ///
    /// Never fails: pipeline errors come back as ERROR rows.
    pub async fn probe_host(&self, entry: &DomainEntry) -> DomainResult {
        match self.run_pipeline(entry).await {
            Ok(result) => result,
            Err(e) => {
                warn!(host = %entry.host, error = %e, "probe pipeline failed");
                DomainResult::error(entry.host.as_str(), e.to_string())
            }
        }
    }

    async fn run_pipeline(&self, entry: &DomainEntry) -> Result<DomainResult, ProbeError> {
        if entry.is_wildcard {
            debug!(host = %entry.host, "wildcard entry, skipping probes");
            return Ok(build_result(entry, &[]));
        }

        if self.cancel.is_cancelled() {
            return Ok(DomainResult::error(
                entry.host.as_str(),
                "cancelled before probing",
            ));
        }

        let dns = self.dns.probe(&entry.host).await?;

        let mut outcomes = vec![dns];
        if outcomes[0].succeeded {
            if self.cancel.is_cancelled() {
                return Ok(DomainResult::error(
                    entry.host.as_str(),
                    "cancelled mid-probe",
                ));
            }
            let liveness = self.liveness.probe(&entry.host).await?;
            outcomes.push(liveness);
        }

        Ok(build_result(entry, &outcomes))
    }

    /// Probe every entry and collect all results.
    ///
    /// At most `concurrency` pipelines are in flight at once. Results
    /// arrive in completion order; pass them to
    /// [`aggregate`](crate::aggregate()) for the canonical ordering. The
    /// optional progress callback fires once per completed host.
    pub async fn run(
        &self,
        entries: Vec<DomainEntry>,
        progress: Option<ProgressCallback>,
    ) -> Vec<DomainResult> {
        let total = entries.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        debug!(
            total = total,
            concurrency = self.config.concurrency,
            "starting probe run"
        );

        let results: Vec<DomainResult> = stream::iter(entries)
            .map(|entry| {
                let semaphore = Arc::clone(&semaphore);
                let completed = Arc::clone(&completed);
                let progress = progress.as_ref();

                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return DomainResult::error(entry.host.as_str(), "scheduler shut down")
                        }
                    };

                    let result = self.probe_host(&entry).await;

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(progress) = progress {
                        progress(done, total, &result);
                    }

                    result
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        debug!(total = results.len(), "probe run complete");
        results
    }

    /// Probe every entry, yielding results as they complete.
    ///
    /// Same concurrency bound and error handling as [`run`](Self::run),
    /// but callers see each result the moment its pipeline finishes.
    pub fn run_stream(
        &self,
        entries: Vec<DomainEntry>,
    ) -> Pin<Box<dyn Stream<Item = DomainResult> + Send + '_>> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let concurrency = self.config.concurrency;

        let stream = stream::iter(entries)
            .map(move |entry| {
                let semaphore = Arc::clone(&semaphore);

                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return DomainResult::error(entry.host.as_str(), "scheduler shut down")
                        }
                    };

                    self.probe_host(&entry).await
                }
            })
            .buffer_unordered(concurrency);

        Box::pin(stream)
    }
}
