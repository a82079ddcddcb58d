//! HTTP(S) liveness probe.
//!
//! Walks a short fallback ladder against each host: HEAD over HTTPS,
//! GET over HTTPS, then the same pair over plain HTTP. Any response at
//! all, whatever the status code, counts as the host being alive; a
//! 503 from a real server is still a server. Only transport-level
//! silence on every rung leaves the host unreached.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, redirect, Method};
use tracing::debug;

use super::LivenessProbe;
use crate::error::ProbeError;
use crate::types::{ProbeKind, ProbeOutcome};

// Some edge networks and takeover-prone services drop requests that
// don't look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP(S) prober with HEAD-to-GET and HTTPS-to-HTTP fallback.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    /// Create a probe with the default timeout (5 seconds).
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a probe with a custom timeout.
    ///
    /// The timeout bounds the whole fallback walk for one host, not
    /// each individual request.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProbeError> {
        // Expired or self-signed certs still prove something is
        // listening, which is all this probe cares about.
        let client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2))
            .redirect(redirect::Policy::limited(5))
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProbeError::network_with_source("Failed to create HTTP probe client", e.to_string())
            })?;

        Ok(Self { client, timeout })
    }

    /// The fallback ladder: HTTPS before HTTP, HEAD before GET.
    fn candidates(host: &str) -> Vec<(String, Method)> {
        vec![
            (format!("https://{}", host), Method::HEAD),
            (format!("https://{}", host), Method::GET),
            (format!("http://{}", host), Method::HEAD),
            (format!("http://{}", host), Method::GET),
        ]
    }

    fn response_outcome(
        code: u16,
        server: Option<String>,
        latency: Duration,
        scheme: &str,
    ) -> ProbeOutcome {
        let detail = match &server {
            Some(s) => format!("HTTP {} ({}), server: {}", code, scheme, s),
            None => format!("HTTP {} ({})", code, scheme),
        };
        let mut outcome = ProbeOutcome::success(ProbeKind::Http)
            .with_latency(latency)
            .with_detail(detail);
        outcome.status_code = Some(code);
        outcome.server = server;
        outcome
    }

    async fn walk(&self, host: &str) -> ProbeOutcome {
        // A 405/501 to HEAD is still a response; hold onto it in case
        // the follow-up GET never gets through.
        let mut held: Option<(u16, Option<String>, Duration, &'static str)> = None;
        let mut failures = 0usize;
        let mut timeouts = 0usize;
        let mut last_error: Option<String> = None;

        for (url, method) in Self::candidates(host) {
            let scheme = if url.starts_with("https") { "https" } else { "http" };
            let attempt_start = Instant::now();

            match self.client.request(method.clone(), &url).send().await {
                Ok(response) => {
                    let code = response.status().as_u16();
                    let server = response
                        .headers()
                        .get(header::SERVER)
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    let latency = attempt_start.elapsed();

                    if method == Method::HEAD && matches!(code, 405 | 501) {
                        debug!(host = %host, code, "HEAD rejected, retrying with GET");
                        if held.is_none() {
                            held = Some((code, server, latency, scheme));
                        }
                        continue;
                    }

                    return Self::response_outcome(code, server, latency, scheme);
                }
                Err(e) => {
                    failures += 1;
                    let note = if e.is_timeout() {
                        timeouts += 1;
                        format!("timeout ({})", scheme)
                    } else if e.is_connect() {
                        format!("connection failed ({})", scheme)
                    } else {
                        format!("request failed ({})", scheme)
                    };
                    debug!(host = %host, url = %url, error = %e, "request failed");
                    last_error = Some(note);
                }
            }
        }

        if let Some((code, server, latency, scheme)) = held {
            return Self::response_outcome(code, server, latency, scheme);
        }

        let timed_out = failures > 0 && timeouts == failures;
        let detail = if timed_out {
            "timeout".to_string()
        } else {
            last_error.unwrap_or_else(|| "no response".to_string())
        };
        let mut outcome = ProbeOutcome::failure(ProbeKind::Http, detail);
        outcome.timed_out = timed_out;
        outcome
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        match tokio::time::timeout(self.timeout, self.walk(host)).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                debug!(host = %host, timeout = ?self.timeout, "probe budget exhausted");
                Ok(ProbeOutcome::timeout(ProbeKind::Http))
            }
        }
    }
}
