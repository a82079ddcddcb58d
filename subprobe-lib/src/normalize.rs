//! Input normalization for raw subdomain lines.
//!
//! Raw input arrives from files and command lines in messy shapes:
//! leading schemes, trailing paths, mixed case, wildcard patterns. The
//! normalizer turns each line into a [`DomainEntry`] or rejects it with
//! a reason, so that everything downstream works on clean hostnames.

use tracing::debug;

use crate::error::ProbeError;
use crate::types::DomainEntry;

/// Normalize one raw input line into a probeable entry.
///
/// Cleaning steps, in order:
/// 1. Trim surrounding whitespace
/// 2. Strip a leading `http://` or `https://` scheme (case-insensitive)
/// 3. Drop everything from the first `/` onward
/// 4. Lowercase the remaining hostname
///
/// Entries containing a `*` anywhere are flagged as wildcards and
/// accepted; they flow through to the results but are never probed.
/// Non-wildcard entries without a single dot are rejected, since a bare
/// label cannot be a probeable subdomain.
///
/// # Examples
///
/// ```
/// use subprobe_lib::normalize;
///
/// let entry = normalize("  HTTPS://API.Example.com/v1/health  ").unwrap();
/// assert_eq!(entry.host, "api.example.com");
/// assert!(!entry.is_wildcard);
///
/// let wildcard = normalize("*.example.com").unwrap();
/// assert!(wildcard.is_wildcard);
/// ```
pub fn normalize(raw: &str) -> Result<DomainEntry, ProbeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::invalid_domain(raw, "empty input line"));
    }

    let mut host = trimmed.to_lowercase();

    if let Some(rest) = host.strip_prefix("https://") {
        host = rest.to_string();
    } else if let Some(rest) = host.strip_prefix("http://") {
        host = rest.to_string();
    }

    // Anything after the first slash is a path or query, not hostname
    if let Some(first) = host.split('/').next() {
        host = first.to_string();
    }

    if host.contains('*') {
        return Ok(DomainEntry {
            raw: raw.to_string(),
            host,
            is_wildcard: true,
        });
    }

    if host.is_empty() {
        return Err(ProbeError::invalid_domain(raw, "no hostname left after cleaning"));
    }

    if !host.contains('.') {
        return Err(ProbeError::invalid_domain(
            raw,
            "not a fully qualified name (missing a dot)",
        ));
    }

    Ok(DomainEntry {
        raw: raw.to_string(),
        host,
        is_wildcard: false,
    })
}

/// Normalize a batch of raw lines, partitioning into entries and rejects.
///
/// The returned entries preserve input order, duplicates included. The
/// second element holds the raw text of every rejected line so callers
/// can report them.
pub fn normalize_entries(lines: &[String]) -> (Vec<DomainEntry>, Vec<String>) {
    let mut entries = Vec::with_capacity(lines.len());
    let mut rejected = Vec::new();

    for line in lines {
        match normalize(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                debug!(line = %line, error = %e, "rejecting input line");
                rejected.push(line.clone());
            }
        }
    }

    (entries, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_hostname() {
        let entry = normalize("api.example.com").unwrap();
        assert_eq!(entry.host, "api.example.com");
        assert_eq!(entry.raw, "api.example.com");
        assert!(!entry.is_wildcard);
    }

    #[test]
    fn test_normalize_strips_whitespace() {
        let entry = normalize("  api.example.com\t").unwrap();
        assert_eq!(entry.host, "api.example.com");
    }

    #[test]
    fn test_normalize_strips_http_scheme() {
        let entry = normalize("http://api.example.com").unwrap();
        assert_eq!(entry.host, "api.example.com");
    }

    #[test]
    fn test_normalize_strips_https_scheme_case_insensitive() {
        let entry = normalize("HTTPS://API.EXAMPLE.COM").unwrap();
        assert_eq!(entry.host, "api.example.com");
    }

    #[test]
    fn test_normalize_strips_path_and_query() {
        let entry = normalize("https://api.example.com/v1/health?x=1").unwrap();
        assert_eq!(entry.host, "api.example.com");
    }

    #[test]
    fn test_normalize_lowercases() {
        let entry = normalize("Staging.Example.COM").unwrap();
        assert_eq!(entry.host, "staging.example.com");
    }

    #[test]
    fn test_normalize_flags_wildcard() {
        let entry = normalize("*.example.com").unwrap();
        assert!(entry.is_wildcard);
        assert_eq!(entry.host, "*.example.com");
    }

    #[test]
    fn test_normalize_flags_inner_wildcard() {
        let entry = normalize("cdn.*.example.com").unwrap();
        assert!(entry.is_wildcard);
    }

    #[test]
    fn test_normalize_wildcard_with_scheme() {
        let entry = normalize("https://*.example.com/path").unwrap();
        assert!(entry.is_wildcard);
        assert_eq!(entry.host, "*.example.com");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
    }

    #[test]
    fn test_normalize_rejects_bare_label() {
        assert!(normalize("localhost").is_err());
        assert!(normalize("intranet").is_err());
    }

    #[test]
    fn test_normalize_rejects_scheme_only() {
        assert!(normalize("https://").is_err());
    }

    #[test]
    fn test_normalize_keeps_raw_text() {
        let entry = normalize("HTTPS://API.Example.com/v1").unwrap();
        assert_eq!(entry.raw, "HTTPS://API.Example.com/v1");
        assert_eq!(entry.host, "api.example.com");
    }

    #[test]
    fn test_normalize_entries_partitions() {
        let lines = vec![
            "good.example.com".to_string(),
            "*.example.com".to_string(),
            "nodot".to_string(),
            "".to_string(),
        ];
        let (entries, rejected) = normalize_entries(&lines);
        assert_eq!(entries.len(), 2);
        assert_eq!(rejected.len(), 2);
        assert_eq!(entries[0].host, "good.example.com");
        assert!(entries[1].is_wildcard);
        assert_eq!(rejected[0], "nodot");
    }

    #[test]
    fn test_normalize_entries_keeps_duplicates() {
        let lines = vec![
            "api.example.com".to_string(),
            "api.example.com".to_string(),
        ];
        let (entries, rejected) = normalize_entries(&lines);
        assert_eq!(entries.len(), 2);
        assert!(rejected.is_empty());
    }
}
