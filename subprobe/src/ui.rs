//! Terminal output formatting for probe results.
//!
//! Everything user-facing lives here: the progress spinner, per-result
//! lines, grouped sections, the run summary, and the dangling-DNS
//! follow-up hints. Styling degrades to plain text automatically when
//! stdout isn't a terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use console::{pad_str, style, Alignment, Term};

use subprobe_lib::{DomainResult, DomainStatus, ProbeConfig, RunSummary};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const HOST_COLUMN_WIDTH: usize = 30;

// ── Spinner ─────────────────────────────────────────────────────────

/// Animated activity indicator on stderr for batch runs.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message.
    ///
    /// Returns `None` when stderr isn't a terminal, so redirected and
    /// scripted runs never see animation frames.
    pub fn start(message: String) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = tokio::spawn(async move {
            let mut frame = 0usize;
            while flag.load(Ordering::Relaxed) {
                let _ = term.write_str(&format!(
                    "\r{} {}",
                    style(SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]).cyan(),
                    message
                ));
                frame += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        let _ = Term::stderr().clear_line();
    }
}

// ── Result lines ────────────────────────────────────────────────────

/// Print the run banner for pretty mode.
pub fn print_header(total: usize, config: &ProbeConfig) {
    println!();
    println!(
        "{} {} {} {}",
        style("subprobe").cyan().bold(),
        style(format!("v{}", subprobe_lib::VERSION)).dim(),
        style("—").dim(),
        style(format!(
            "probing {} host{}",
            total,
            if total == 1 { "" } else { "s" }
        ))
        .bold()
    );
    println!(
        "  {}",
        style(format!(
            "liveness: {}  |  concurrency: {}  |  timeout: {}s",
            config.liveness,
            config.concurrency,
            config.timeout.as_secs()
        ))
        .dim()
    );
    println!();
}

/// One flat result line, used in default (non-pretty) output.
pub fn print_result_default(result: &DomainResult, debug: bool, counter: Option<(usize, usize)>) {
    let padded = pad_str(&result.host, HOST_COLUMN_WIDTH, Alignment::Left, Some(".."));
    let mut extras: Vec<String> = Vec::new();
    if !result.ips.is_empty() {
        extras.push(result.ips.join(", "));
    }
    if let Some(latency) = result.latency {
        extras.push(format_latency(latency));
    }
    let extra = if extras.is_empty() {
        String::new()
    } else {
        format!("  {}", style(extras.join("  ")).dim())
    };

    println!(
        "  {}{}  {}{}",
        counter_prefix(counter),
        padded,
        status_label(result.status),
        extra
    );

    if debug && !result.detail.is_empty() {
        println!("      {}", style(&result.detail).dim());
    }
}

/// One result line with the classification reason inlined, used in
/// pretty streaming output.
pub fn print_result(result: &DomainResult, debug: bool, counter: Option<(usize, usize)>) {
    let padded = pad_str(&result.host, HOST_COLUMN_WIDTH, Alignment::Left, Some(".."));
    let mut extras: Vec<String> = Vec::new();
    if !result.ips.is_empty() {
        extras.push(result.ips.join(", "));
    }
    if let Some(latency) = result.latency {
        extras.push(format_latency(latency));
    }
    if (result.status != DomainStatus::Active || debug) && !result.detail.is_empty() {
        extras.push(result.detail.clone());
    }
    let extra = if extras.is_empty() {
        String::new()
    } else {
        format!("  {}", style(extras.join("  ")).dim())
    };

    println!(
        "  {}{}  {}{}",
        counter_prefix(counter),
        padded,
        status_label(result.status),
        extra
    );
}

// ── Grouped output ──────────────────────────────────────────────────

/// Print results grouped into status sections, for pretty batch mode.
///
/// Expects aggregated (canonically ordered) results; sections preserve
/// that order internally.
pub fn print_grouped_results(results: &[DomainResult], debug: bool) {
    let active: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status == DomainStatus::Active)
        .collect();
    let dangling: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status == DomainStatus::PossibleDanglingDns)
        .collect();
    let no_response: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status.is_no_response())
        .collect();
    let skipped: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status == DomainStatus::SkippedWildcard)
        .collect();
    let errors: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status == DomainStatus::Error)
        .collect();

    if !active.is_empty() {
        println!();
        println!(
            "{}",
            style(format!("── Active ({}) {}", active.len(), "─".repeat(30)))
                .green()
                .bold()
        );
        for result in active {
            print_grouped_line(result, debug);
        }
    }

    if !dangling.is_empty() {
        println!();
        println!(
            "{}",
            style(format!(
                "── Possible dangling DNS ({}) {}",
                dangling.len(),
                "─".repeat(16)
            ))
            .red()
            .bold()
        );
        for result in dangling {
            print_grouped_line(result, debug);
        }
    }

    if !no_response.is_empty() {
        println!();
        println!(
            "{}",
            style(format!(
                "── No response ({}) {}",
                no_response.len(),
                "─".repeat(26)
            ))
            .yellow()
            .bold()
        );
        for result in no_response {
            print_grouped_line(result, debug);
        }
    }

    if !skipped.is_empty() {
        println!();
        println!(
            "{}",
            style(format!(
                "── Skipped wildcards ({}) {}",
                skipped.len(),
                "─".repeat(20)
            ))
            .cyan()
            .bold()
        );
        for result in skipped {
            print_grouped_line(result, debug);
        }
    }

    if !errors.is_empty() {
        println!();
        println!(
            "{}",
            style(format!("── Errors ({}) {}", errors.len(), "─".repeat(30)))
                .magenta()
                .bold()
        );
        for result in errors {
            print_grouped_line(result, debug);
        }
    }
}

fn print_grouped_line(result: &DomainResult, debug: bool) {
    let padded = pad_str(&result.host, HOST_COLUMN_WIDTH, Alignment::Left, Some(".."));
    let mut extras: Vec<String> = Vec::new();
    // The no-response section mixes three statuses, so spell them out
    if result.status.is_no_response() {
        extras.push(result.status.as_str().to_string());
    }
    if !result.ips.is_empty() {
        extras.push(result.ips.join(", "));
    }
    if let Some(latency) = result.latency {
        extras.push(format_latency(latency));
    }
    if (result.status != DomainStatus::Active || debug) && !result.detail.is_empty() {
        extras.push(result.detail.clone());
    }
    let extra = if extras.is_empty() {
        String::new()
    } else {
        format!("  {}", style(extras.join("  ")).dim())
    };

    println!("  {}{}", padded, extra);
}

// ── Summary and hints ───────────────────────────────────────────────

/// Print the single-line run summary.
pub fn print_summary(summary: &RunSummary, duration: Duration) {
    println!("{}", style("─".repeat(64)).dim());
    let sep = style("|").dim();
    println!(
        "  {} hosts in {:.1}s  {}  {} active  {}  {} no response  {}  {} possible dangling  {}  {} skipped  {}  {} errors",
        style(summary.total()).bold(),
        duration.as_secs_f64(),
        sep,
        style(summary.active).green(),
        sep,
        style(summary.no_response).yellow(),
        sep,
        style(summary.dangling).red(),
        sep,
        style(summary.skipped).cyan(),
        sep,
        style(summary.error).magenta(),
    );
}

/// Print follow-up guidance when the run found takeover candidates.
pub fn print_dangling_hint(results: &[DomainResult]) {
    let dangling: Vec<&DomainResult> = results
        .iter()
        .filter(|r| r.status == DomainStatus::PossibleDanglingDns)
        .collect();
    if dangling.is_empty() {
        return;
    }

    println!();
    println!(
        "  {}",
        style("Possible dangling DNS entries (takeover candidates):")
            .red()
            .bold()
    );
    for result in dangling.iter().take(10) {
        let ips = if result.ips.is_empty() {
            String::new()
        } else {
            format!("  {}", style(result.ips.join(", ")).dim())
        };
        println!("    {}{}", result.host, ips);
    }
    if dangling.len() > 10 {
        println!(
            "    {}",
            style(format!("... and {} more", dangling.len() - 10)).dim()
        );
    }

    println!();
    println!("  {}", style("Next steps:").bold());
    println!(
        "  {} Verify the records with dig or nslookup",
        style("•").dim()
    );
    println!(
        "  {} Check whether the pointed-to service (S3, Azure, Heroku, ...) still claims the hostname",
        style("•").dim()
    );
}

// ── Formatting helpers ──────────────────────────────────────────────

fn status_label(status: DomainStatus) -> console::StyledObject<&'static str> {
    let label = status.as_str();
    match status {
        DomainStatus::Active => style(label).green().bold(),
        DomainStatus::PossibleDanglingDns => style(label).red().bold(),
        DomainStatus::NoResponseDnsFailed
        | DomainStatus::NoResponseTimeout
        | DomainStatus::NoResponsePingFailed => style(label).yellow(),
        DomainStatus::SkippedWildcard => style(label).cyan(),
        DomainStatus::Error => style(label).magenta(),
    }
}

fn counter_prefix(counter: Option<(usize, usize)>) -> String {
    match counter {
        Some((current, total)) => {
            format!("{} ", style(format!("[{}/{}]", current, total)).dim())
        }
        None => String::new(),
    }
}

fn format_latency(latency: Duration) -> String {
    if latency.as_secs() >= 1 {
        format!("{:.1}s", latency.as_secs_f64())
    } else {
        format!("{}ms", latency.as_millis())
    }
}
