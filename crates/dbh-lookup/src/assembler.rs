//! Blocklist assembly
//!
//! Thin consumer at the end of the data flow: cross-references the
//! vendors' union against the original candidate set and shapes the result
//! for the external writer. The output is always a subset of the input
//! candidates.

use std::collections::HashSet;
use tracing::info;

use dbh_common::Hostname;

use crate::pipeline::LookupOutcome;

/// The final assembled blocklist for one run
#[derive(Debug, Clone)]
pub struct Blocklist {
    /// Size of the candidate set that was classified
    pub candidate_count: usize,
    /// Per-vendor flagged hostnames, sorted for deterministic output
    pub per_vendor: Vec<(String, Vec<Hostname>)>,
    /// Deduplicated union across vendors, sorted
    pub combined: Vec<Hostname>,
}

impl Blocklist {
    /// Fraction of candidates flagged malicious, for reporting.
    pub fn flagged_fraction(&self) -> f64 {
        if self.candidate_count == 0 {
            0.0
        } else {
            self.combined.len() as f64 / self.candidate_count as f64
        }
    }
}

/// Assemble the final malicious set from the pipeline's outcome.
///
/// Every hostname in the output appeared in `candidates`; anything else a
/// vendor reported is dropped here as a final guard.
pub fn assemble(candidates: &[Hostname], outcome: &LookupOutcome) -> Blocklist {
    let candidate_set: HashSet<&Hostname> = candidates.iter().collect();

    let per_vendor = outcome
        .per_vendor
        .iter()
        .map(|verdicts| {
            let mut flagged: Vec<Hostname> = verdicts
                .flagged
                .iter()
                .filter(|host| candidate_set.contains(host))
                .cloned()
                .collect();
            flagged.sort();
            (verdicts.vendor.clone(), flagged)
        })
        .collect();

    let mut combined: Vec<Hostname> = outcome
        .union()
        .into_iter()
        .filter(|host| candidate_set.contains(host))
        .collect();
    combined.sort();

    let blocklist = Blocklist {
        candidate_count: candidates.len(),
        per_vendor,
        combined,
    };
    info!(
        candidates = blocklist.candidate_count,
        flagged = blocklist.combined.len(),
        fraction = format!("{:.4}", blocklist.flagged_fraction()),
        "blocklist assembled"
    );
    blocklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::VendorVerdicts;

    fn hosts(names: &[&str]) -> Vec<Hostname> {
        names.iter().map(|n| Hostname::parse(n).unwrap()).collect()
    }

    fn verdicts(vendor: &str, flagged: &[&str]) -> VendorVerdicts {
        VendorVerdicts {
            vendor: vendor.to_string(),
            flagged: flagged
                .iter()
                .map(|n| Hostname::parse(n).unwrap())
                .collect(),
            batches_submitted: 1,
            batches_failed: 0,
        }
    }

    #[test]
    fn test_output_is_subset_of_candidates() {
        let candidates = hosts(&["a.example", "b.example"]);
        let outcome = LookupOutcome {
            per_vendor: vec![verdicts("vendor1", &["a.example", "smuggled.example"])],
        };

        let blocklist = assemble(&candidates, &outcome);
        let names: Vec<&str> = blocklist.combined.iter().map(|h| h.as_str()).collect();
        assert_eq!(names, vec!["a.example"]);
        assert_eq!(blocklist.per_vendor[0].1.len(), 1);
    }

    #[test]
    fn test_combined_is_sorted_and_deduplicated() {
        let candidates = hosts(&["c.example", "a.example", "b.example"]);
        let outcome = LookupOutcome {
            per_vendor: vec![
                verdicts("vendor1", &["c.example", "a.example"]),
                verdicts("vendor2", &["a.example", "b.example"]),
            ],
        };

        let blocklist = assemble(&candidates, &outcome);
        let names: Vec<&str> = blocklist.combined.iter().map(|h| h.as_str()).collect();
        assert_eq!(names, vec!["a.example", "b.example", "c.example"]);
    }

    #[test]
    fn test_flagged_fraction() {
        let candidates = hosts(&["a.example", "b.example", "c.example", "d.example"]);
        let outcome = LookupOutcome {
            per_vendor: vec![verdicts("vendor1", &["a.example"])],
        };
        let blocklist = assemble(&candidates, &outcome);
        assert!((blocklist.flagged_fraction() - 0.25).abs() < f64::EPSILON);

        let empty = assemble(&[], &LookupOutcome { per_vendor: vec![] });
        assert_eq!(empty.flagged_fraction(), 0.0);
    }
}
