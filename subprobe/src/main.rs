//! subprobe: probe subdomain lists for liveness and dangling DNS.
//!
//! Resolves each input host, probes it over HTTP(S) or ping, and
//! classifies the result into a stable status taxonomy. Input can come
//! from the command line or a file; output can be live text, grouped
//! text, JSON, or CSV, with an optional CSV report file on top.

use std::path::Path;
use std::process;
use std::time::{Duration, Instant};

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use subprobe_lib::{
    aggregate, is_ping_available, load_env_config, normalize_entries, parse_timeout_string,
    ConfigManager, DomainEntry, DomainResult, EnvConfig, LivenessMode, ProbeConfig,
    ProbeScheduler, RunSummary,
};

mod ui;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Fast, concurrent subdomain reachability probing.
#[derive(Parser, Debug)]
#[command(name = "subprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Probe subdomain lists for liveness and dangling-DNS takeover candidates")]
#[command(styles = STYLES)]
#[command(
    after_help = "EXAMPLES:\n  subprobe api.example.com\n  subprobe -f subdomains.txt\n  subprobe -f subdomains.txt --csv -o report.csv\n  subprobe -f subdomains.txt --ping -c 50 -t 5"
)]
pub struct Args {
    /// Subdomains to probe
    #[arg(value_name = "DOMAINS", help_heading = "Host Selection")]
    pub domains: Vec<String>,

    /// Read subdomains from a file (one per line, # comments allowed)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Host Selection"
    )]
    pub file: Option<String>,

    /// Use the system ping command for liveness instead of HTTP(S)
    #[arg(long = "ping", help_heading = "Protocol")]
    pub ping: bool,

    /// Max concurrent probes (1-100)
    #[arg(
        short = 'c',
        long = "concurrency",
        default_value = "20",
        help_heading = "Performance"
    )]
    pub concurrency: usize,

    /// Per-probe timeout in seconds (1-120)
    #[arg(
        short = 't',
        long = "timeout",
        default_value = "15",
        help_heading = "Performance"
    )]
    pub timeout: u64,

    /// Output results as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results as CSV
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Write a CSV report to FILE in addition to normal output
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output Format"
    )]
    pub output: Option<String>,

    /// Grouped output with section headers
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Collect all results before displaying
    #[arg(long = "batch", help_heading = "Output Format")]
    pub batch: bool,

    /// Show results as they complete
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

    /// Use a specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose output (config discovery, probe settings)
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Detailed debug output including classification reasons
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.verbose {
        println!("🔧 subprobe v{} starting...", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(&args);

    if let Err(e) = run_probe(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate argument combinations before doing any work.
fn validate_args(args: &Args) -> Result<(), String> {
    let has_env_file = std::env::var("SP_FILE").is_ok();
    if args.domains.is_empty() && args.file.is_none() && !has_env_file {
        return Err("You must specify subdomains to probe or a file with --file".to_string());
    }

    if args.batch && args.streaming {
        return Err("Cannot specify both --batch and --streaming modes".to_string());
    }

    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    if args.streaming && (args.json || args.csv) {
        return Err(
            "Cannot use --streaming with --json or --csv. Use --batch for structured output"
                .to_string(),
        );
    }

    if args.concurrency == 0 || args.concurrency > 100 {
        return Err("Concurrency must be between 1 and 100".to_string());
    }

    if args.timeout == 0 || args.timeout > 120 {
        return Err("Timeout must be between 1 and 120 seconds".to_string());
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a run needs after layering files, environment and flags.
struct ResolvedSettings {
    config: ProbeConfig,
    pretty: bool,
    json: bool,
    csv: bool,
    file: Option<String>,
}

/// Layer settings: defaults, then config files, then `SP_*` variables,
/// then CLI flags.
///
/// An explicitly named config file (--config or SP_CONFIG) that fails
/// to load is fatal; discovery failures are not.
fn resolve_settings(args: &Args) -> Result<ResolvedSettings, Box<dyn std::error::Error>> {
    let mut config = ProbeConfig::default();
    let mut pretty = false;

    let manager = ConfigManager::new(args.verbose);
    let file_config = if let Some(path) = &args.config {
        if args.verbose {
            println!("🔧 Using explicit config file (CLI --config): {}", path);
        }
        manager.load_config_file(Path::new(path))?
    } else if let Ok(env_path) = std::env::var("SP_CONFIG") {
        if args.verbose {
            println!("🔧 Using explicit config file (SP_CONFIG env var): {}", env_path);
        }
        manager.load_config_file(Path::new(&env_path))?
    } else {
        manager.discover_and_load()?
    };

    if let Some(defaults) = &file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = &defaults.timeout {
            if let Some(secs) = parse_timeout_string(timeout) {
                config.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(ping) = defaults.ping {
            config.liveness = if ping {
                LivenessMode::Ping
            } else {
                LivenessMode::Http
            };
        }
        if let Some(p) = defaults.pretty {
            pretty = p;
        }
    }

    let env_config = load_env_config(args.verbose);
    if let Some(concurrency) = env_config.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = &env_config.timeout {
        if let Some(secs) = parse_timeout_string(timeout) {
            config.timeout = Duration::from_secs(secs);
        }
    }
    if let Some(ping) = env_config.ping {
        config.liveness = if ping {
            LivenessMode::Ping
        } else {
            LivenessMode::Http
        };
    }
    if let Some(p) = env_config.pretty {
        pretty = p;
    }

    // Clap can't tell a defaulted flag from one typed at its default
    // value, so the latter won't override file or env settings.
    if args.concurrency != 20 {
        config.concurrency = args.concurrency;
    }
    if args.timeout != 15 {
        config.timeout = Duration::from_secs(args.timeout);
    }
    if args.ping {
        config.liveness = LivenessMode::Ping;
    }
    if args.pretty {
        pretty = true;
    }

    let (json, csv) = resolve_formats(args, &env_config);
    let file = args.file.clone().or(env_config.file);

    Ok(ResolvedSettings {
        config,
        pretty,
        json,
        csv,
        file,
    })
}

/// CLI format flags win outright; env format flags only apply when the
/// command line didn't pick a format.
fn resolve_formats(args: &Args, env_config: &EnvConfig) -> (bool, bool) {
    if args.json || args.csv {
        return (args.json, args.csv);
    }
    if env_config.has_output_format_conflict() {
        eprintln!("⚠️ Both SP_JSON and SP_CSV are set; ignoring both");
        return (false, false);
    }
    (
        env_config.json.unwrap_or(false),
        env_config.csv.unwrap_or(false),
    )
}

async fn run_probe(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = resolve_settings(&args)?;

    let (entries, rejected) = load_entries(&args, &settings.file)?;
    report_rejected(&rejected);

    if entries.is_empty() {
        return Err("No valid subdomains found to probe".into());
    }

    let scheduler = ProbeScheduler::new(settings.config.clone())?;

    if settings.config.liveness == LivenessMode::Ping && !is_ping_available().await {
        eprintln!("⚠️ ping command not found; echo probes will report ERROR");
    }

    // Ctrl-C flips the cooperative cancel flag; in-flight probes drain
    // to their timeouts and every host still gets a result row.
    let cancel = scheduler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Interrupted; letting in-flight probes finish...");
            cancel.cancel();
        }
    });

    let streaming = should_use_streaming(&args, settings.json, settings.csv, entries.len());
    if streaming {
        run_streaming_probe(&scheduler, entries, &args, settings.pretty).await
    } else {
        run_batch_probe(&scheduler, entries, &args, &settings).await
    }
}

/// Gather input lines from positional args and the input file, then
/// normalize them.
fn load_entries(
    args: &Args,
    input_file: &Option<String>,
) -> Result<(Vec<DomainEntry>, Vec<String>), Box<dyn std::error::Error>> {
    let mut lines: Vec<String> = args.domains.clone();

    if let Some(path) = input_file {
        if args.verbose {
            println!("🔧 Reading subdomains from file: {}", path);
        }
        lines.extend(read_lines_from_file(path)?);
    }

    Ok(normalize_entries(&lines))
}

fn read_lines_from_file(path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        return Err(format!("Input file not found: {}", path).into());
    }

    let content = std::fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read {}: {}", path, e))?;

    let mut lines = Vec::new();
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Allow trailing comments after the hostname
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        lines.push(line.to_string());
    }

    Ok(lines)
}

fn report_rejected(rejected: &[String]) {
    if rejected.is_empty() {
        return;
    }

    eprintln!(
        "⚠️ Skipping {} invalid input line{}:",
        rejected.len(),
        if rejected.len() == 1 { "" } else { "s" }
    );
    for line in rejected.iter().take(5) {
        eprintln!("    {}", line);
    }
    if rejected.len() > 5 {
        eprintln!("    ... and {} more", rejected.len() - 5);
    }
}

/// Streaming is the default for multi-host text runs; structured
/// formats always collect first so the output stays well-formed.
fn should_use_streaming(args: &Args, json: bool, csv: bool, total: usize) -> bool {
    if args.batch {
        return false;
    }
    if args.streaming {
        return true;
    }
    total > 1 && !json && !csv
}

async fn run_streaming_probe(
    scheduler: &ProbeScheduler,
    entries: Vec<DomainEntry>,
    args: &Args,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use futures::StreamExt;

    let total = entries.len();
    if pretty {
        ui::print_header(total, scheduler.config());
    } else if args.verbose && total > 1 {
        println!(
            "🔍 Probing {} hosts with concurrency: {}",
            total,
            scheduler.config().concurrency
        );
        println!(); // Empty line for readability
    }

    let start_time = Instant::now();
    let mut results = Vec::with_capacity(total);
    let mut completed = 0usize;

    {
        let mut stream = scheduler.run_stream(entries);
        while let Some(result) = stream.next().await {
            completed += 1;
            let counter = if total > 1 {
                Some((completed, total))
            } else {
                None
            };
            if pretty {
                ui::print_result(&result, args.debug, counter);
            } else {
                ui::print_result_default(&result, args.debug, counter);
            }
            results.push(result);
        }
    }

    let duration = start_time.elapsed();
    let (ordered, summary) = aggregate(results);

    if total > 1 {
        println!();
        ui::print_summary(&summary, duration);
    }
    ui::print_dangling_hint(&ordered);

    if let Some(path) = &args.output {
        write_csv_file(path, &ordered)?;
        eprintln!("Report written to {}", path);
    }

    Ok(())
}

async fn run_batch_probe(
    scheduler: &ProbeScheduler,
    entries: Vec<DomainEntry>,
    args: &Args,
    settings: &ResolvedSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = entries.len();
    let structured = settings.json || settings.csv;

    if settings.pretty && !structured {
        ui::print_header(total, scheduler.config());
    } else if !structured && total > 1 && args.verbose {
        println!("🔍 Probing {} hosts...", total);
    }

    let spinner = if !structured && total > 1 {
        ui::Spinner::start(format!("Probing {} hosts...", total))
    } else {
        None
    };

    let start_time = Instant::now();
    let results = scheduler.run(entries, None).await;
    let duration = start_time.elapsed();

    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    let (ordered, summary) = aggregate(results);

    if settings.json {
        display_json_results(&ordered, &summary)?;
    } else if settings.csv {
        display_csv_results(&ordered);
    } else if settings.pretty {
        ui::print_grouped_results(&ordered, args.debug);
        println!();
        ui::print_summary(&summary, duration);
        ui::print_dangling_hint(&ordered);
    } else {
        for result in &ordered {
            ui::print_result_default(result, args.debug, None);
        }
        if total > 1 {
            println!();
            ui::print_summary(&summary, duration);
        }
        ui::print_dangling_hint(&ordered);
    }

    if let Some(path) = &args.output {
        write_csv_file(path, &ordered)?;
        eprintln!("Report written to {}", path);
    }

    Ok(())
}

// ── Report output ───────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [DomainResult],
    summary: &'a RunSummary,
}

fn display_json_results(
    results: &[DomainResult],
    summary: &RunSummary,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = JsonReport { results, summary };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

const CSV_HEADER: &str = "Subdomain,Status,IP Address(es),Status Code,Response Time,Server Info";

fn display_csv_results(results: &[DomainResult]) {
    println!("{}", CSV_HEADER);
    for result in results {
        println!("{}", csv_row(result));
    }
}

fn write_csv_file(path: &str, results: &[DomainResult]) -> Result<(), Box<dyn std::error::Error>> {
    let mut content = String::with_capacity((results.len() + 1) * 64);
    content.push_str(CSV_HEADER);
    content.push('\n');
    for result in results {
        content.push_str(&csv_row(result));
        content.push('\n');
    }

    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write report '{}': {}", path, e))?;
    Ok(())
}

fn csv_row(result: &DomainResult) -> String {
    let ips = if result.ips.is_empty() {
        "N/A".to_string()
    } else {
        result.ips.join("; ")
    };
    let code = result
        .status_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let latency = result
        .latency
        .map(|d| format!("{:.2}s", d.as_secs_f64()))
        .unwrap_or_else(|| "N/A".to_string());
    let server = result.server.clone().unwrap_or_else(|| "N/A".to_string());

    [
        result.host.clone(),
        result.status.as_str().to_string(),
        ips,
        code,
        latency,
        server,
    ]
    .iter()
    .map(|field| csv_escape(field))
    .collect::<Vec<String>>()
    .join(",")
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
