//! Configuration file and environment variable support.
//!
//! Settings can come from TOML config files and `SP_*` environment
//! variables, layered under CLI flags. Discovery checks the XDG config
//! directory, then the home dotfile, then project-local files, with
//! later sources overriding earlier ones. Only malformed values that
//! the caller asked for explicitly are fatal; discovery problems are
//! reported and skipped.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Parsed contents of a subprobe config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for probing settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// The `[defaults]` section of a config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Maximum concurrent probes (1-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-probe timeout, e.g. "15" or "15s"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Use the ping probe instead of HTTP(S)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<bool>,

    /// Default to grouped pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Loads, validates and merges config files.
pub struct ConfigManager {
    /// Print discovery progress to stdout
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load and validate a single config file.
    pub fn load_config_file(&self, path: &Path) -> Result<FileConfig, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::file_error(
                path.display().to_string(),
                "Config file not found",
            ));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::file_error(
                path.display().to_string(),
                format!("Failed to read config file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ProbeError::config(format!(
                "Invalid TOML in {}: {}",
                path.display(),
                e
            ))
        })?;

        self.validate_config(&config)?;

        if self.verbose {
            println!("📋 Loaded config from: {}", path.display());
        }

        Ok(config)
    }

    /// Discover config files in the standard locations and merge them.
    ///
    /// Missing files are fine; unreadable or invalid ones are reported
    /// and skipped so one broken dotfile can't brick the tool.
    pub fn discover_and_load(&self) -> Result<FileConfig, ProbeError> {
        let mut merged = FileConfig::default();

        for path in self.get_config_paths() {
            if !path.exists() {
                continue;
            }
            match self.load_config_file(&path) {
                Ok(config) => merged = self.merge_configs(merged, config),
                Err(e) => {
                    eprintln!("⚠️ Skipping config file {}: {}", path.display(), e);
                }
            }
        }

        Ok(merged)
    }

    /// Candidate config paths, least specific first.
    fn get_config_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            paths.push(home.join(".config").join("subprobe").join("config.toml"));
            paths.push(home.join(".subprobe.toml"));
        }

        paths.push(PathBuf::from(".subprobe.toml"));
        paths.push(PathBuf::from("subprobe.toml"));

        paths
    }

    /// Merge two configs, with the overlay winning field by field.
    fn merge_configs(&self, base: FileConfig, overlay: FileConfig) -> FileConfig {
        let defaults = match (base.defaults, overlay.defaults) {
            (Some(base), Some(overlay)) => Some(DefaultsConfig {
                concurrency: overlay.concurrency.or(base.concurrency),
                timeout: overlay.timeout.or(base.timeout),
                ping: overlay.ping.or(base.ping),
                pretty: overlay.pretty.or(base.pretty),
            }),
            (base, overlay) => overlay.or(base),
        };

        FileConfig { defaults }
    }

    /// Validate config values that have hard limits.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ProbeError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if !(1..=100).contains(&concurrency) {
                    return Err(ProbeError::config(format!(
                        "Invalid concurrency {} in config file (must be 1-100)",
                        concurrency
                    )));
                }
            }

            if let Some(timeout) = &defaults.timeout {
                if parse_timeout_string(timeout).is_none() {
                    return Err(ProbeError::config(format!(
                        "Invalid timeout '{}' in config file (try '15' or '15s')",
                        timeout
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Settings read from `SP_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub ping: Option<bool>,
    pub pretty: Option<bool>,
    pub json: Option<bool>,
    pub csv: Option<bool>,
    pub file: Option<String>,
}

impl EnvConfig {
    /// True when the environment asks for two output formats at once.
    pub fn has_output_format_conflict(&self) -> bool {
        self.json.unwrap_or(false) && self.csv.unwrap_or(false)
    }
}

/// Read probing settings from the environment.
///
/// Invalid values are reported and ignored rather than treated as
/// fatal; an exported variable from last month shouldn't kill today's
/// run.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    let mut config = EnvConfig::default();

    if let Ok(value) = std::env::var("SP_CONCURRENCY") {
        match value.parse::<usize>() {
            Ok(n) if (1..=100).contains(&n) => {
                if verbose {
                    println!("🔧 Using SP_CONCURRENCY={} from environment", n);
                }
                config.concurrency = Some(n);
            }
            _ => {
                eprintln!(
                    "⚠️ Invalid SP_CONCURRENCY value '{}', ignoring (must be 1-100)",
                    value
                );
            }
        }
    }

    if let Ok(value) = std::env::var("SP_TIMEOUT") {
        if parse_timeout_string(&value).is_some() {
            if verbose {
                println!("🔧 Using SP_TIMEOUT={} from environment", value);
            }
            config.timeout = Some(value);
        } else {
            eprintln!(
                "⚠️ Invalid SP_TIMEOUT value '{}', ignoring (try '15' or '15s')",
                value
            );
        }
    }

    if let Ok(value) = std::env::var("SP_PING") {
        config.ping = parse_bool_env("SP_PING", &value, verbose);
    }

    if let Ok(value) = std::env::var("SP_PRETTY") {
        config.pretty = parse_bool_env("SP_PRETTY", &value, verbose);
    }

    if let Ok(value) = std::env::var("SP_JSON") {
        config.json = parse_bool_env("SP_JSON", &value, verbose);
    }

    if let Ok(value) = std::env::var("SP_CSV") {
        config.csv = parse_bool_env("SP_CSV", &value, verbose);
    }

    if let Ok(value) = std::env::var("SP_FILE") {
        if verbose {
            println!("🔧 Using SP_FILE={} from environment", value);
        }
        config.file = Some(value);
    }

    config
}

fn parse_bool_env(name: &str, value: &str, verbose: bool) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => {
            if verbose {
                println!("🔧 Using {}={} from environment", name, value);
            }
            Some(true)
        }
        "false" | "0" | "no" => Some(false),
        _ => {
            eprintln!(
                "⚠️ Invalid {} value '{}', ignoring (use true/false)",
                name, value
            );
            None
        }
    }
}

/// Parse a human-friendly timeout string into seconds.
///
/// Accepts plain seconds ("15"), an explicit suffix ("15s", "2m"), or
/// milliseconds ("1500ms", floored to a minimum of one second).
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let s = timeout_str.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if let Some(ms) = s.strip_suffix("ms") {
        let value: u64 = ms.trim().parse().ok()?;
        return Some((value / 1000).max(1));
    }

    if let Some(secs) = s.strip_suffix('s') {
        return secs.trim().parse().ok();
    }

    if let Some(mins) = s.strip_suffix('m') {
        let value: u64 = mins.trim().parse().ok()?;
        return Some(value * 60);
    }

    s.parse().ok()
}
