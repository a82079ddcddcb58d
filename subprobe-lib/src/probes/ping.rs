//! ICMP-style liveness probe via the system ping binary.
//!
//! Raw ICMP sockets need elevated privileges on most systems, so this
//! probe shells out to the platform ping command instead and reads its
//! exit status. One echo request per host, bounded by the configured
//! timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::LivenessProbe;
use crate::error::ProbeError;
use crate::types::{ProbeKind, ProbeOutcome};

/// Echo prober wrapping the platform ping command.
#[derive(Debug, Clone)]
pub struct PingProbe {
    timeout: Duration,
}

impl PingProbe {
    /// Create a probe with the default timeout (5 seconds).
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a probe with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Platform-specific arguments for a single bounded echo request.
    fn ping_args(&self, host: &str) -> Vec<String> {
        let secs = self.timeout.as_secs().max(1);

        #[cfg(target_os = "windows")]
        {
            vec![
                "-n".to_string(),
                "1".to_string(),
                "-w".to_string(),
                (secs * 1000).to_string(),
                host.to_string(),
            ]
        }

        #[cfg(target_os = "macos")]
        {
            vec![
                "-c".to_string(),
                "1".to_string(),
                "-t".to_string(),
                secs.to_string(),
                host.to_string(),
            ]
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            vec![
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                secs.to_string(),
                host.to_string(),
            ]
        }
    }

    async fn execute_ping(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        let start = Instant::now();

        let output = Command::new("ping")
            .args(self.ping_args(host))
            .output()
            .await
            .map_err(|e| {
                ProbeError::probe(
                    host,
                    format!(
                        "Failed to execute ping command: {}. Make sure 'ping' is installed.",
                        e
                    ),
                )
            })?;

        let latency = start.elapsed();

        if output.status.success() {
            debug!(host = %host, latency_ms = latency.as_millis() as u64, "echo reply received");
            return Ok(ProbeOutcome::success(ProbeKind::Ping)
                .with_latency(latency)
                .with_detail("echo reply received"));
        }

        // iputils exits 1 when the request simply went unanswered
        if output.status.code() == Some(1) {
            debug!(host = %host, "no echo reply within timeout");
            return Ok(ProbeOutcome::timeout(ProbeKind::Ping));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let note = stderr.lines().next().unwrap_or("").trim().to_string();
        debug!(host = %host, code = ?output.status.code(), stderr = %note, "ping failed");

        let detail = if note.is_empty() {
            "ping failed".to_string()
        } else {
            format!("ping failed: {}", note)
        };
        Ok(ProbeOutcome::failure(ProbeKind::Ping, detail))
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LivenessProbe for PingProbe {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        // One second of grace so ping's own deadline fires first
        let budget = self.timeout + Duration::from_secs(1);
        match tokio::time::timeout(budget, self.execute_ping(host)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(host = %host, timeout = ?self.timeout, "ping did not return in time");
                Ok(ProbeOutcome::timeout(ProbeKind::Ping))
            }
        }
    }
}

/// Check if the ping command is available on this system.
///
/// A bare invocation exits nonzero with usage text; what matters here
/// is only whether the binary spawns.
pub async fn is_ping_available() -> bool {
    Command::new("ping").output().await.is_ok()
}
