//! Deterministic ordering and summarisation of run results.
//!
//! The scheduler hands results back in completion order, which varies
//! run to run. Reports need to be diffable, so this module imposes the
//! canonical ordering (reachable hosts first, alphabetical within each
//! partition) and tallies the per-status counts in a single pass.

use crate::types::{DomainResult, DomainStatus, RunSummary};

/// Order results canonically and compute the run summary.
///
/// ACTIVE hosts come first, everything else after, both partitions
/// sorted by hostname. The same input set always produces the same
/// output, whatever order probing completed in.
pub fn aggregate(mut results: Vec<DomainResult>) -> (Vec<DomainResult>, RunSummary) {
    results.sort_by(|a, b| {
        let a_key = (a.status != DomainStatus::Active, a.host.as_str());
        let b_key = (b.status != DomainStatus::Active, b.host.as_str());
        a_key.cmp(&b_key)
    });

    let mut summary = RunSummary::default();
    for result in &results {
        summary.record(result.status);
    }

    (results, summary)
}
