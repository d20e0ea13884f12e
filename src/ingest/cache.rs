use crate::variant::VariantSet;
use std::collections::{BTreeSet, HashMap, HashSet};

/// State carried across ingestion calls
///
/// Owned by whoever drives ingestion; nothing here is process-global, so
/// every test can start from a fresh cache.
#[derive(Debug, Clone, Default)]
pub struct IngestCache {
    known_suites: BTreeSet<String>,
    seen_runs: HashSet<u64>,
    job_variants: HashMap<String, VariantSet>,
}

impl IngestCache {
    pub fn new<I, S>(known_suites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_suites: known_suites.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Test names from a known suite are stored without a suite prefix
    pub fn is_known_suite(&self, suite: &str) -> bool {
        self.known_suites.contains(suite)
    }

    pub fn add_known_suite(&mut self, suite: impl Into<String>) {
        self.known_suites.insert(suite.into());
    }

    pub fn has_run(&self, id: u64) -> bool {
        self.seen_runs.contains(&id)
    }

    /// Returns `false` if the run was already recorded
    pub fn mark_run(&mut self, id: u64) -> bool {
        self.seen_runs.insert(id)
    }

    pub fn run_count(&self) -> usize {
        self.seen_runs.len()
    }

    pub fn job_variants(&self, job: &str) -> Option<&VariantSet> {
        self.job_variants.get(job)
    }

    /// Cached classifier output for `job`, classifying it on first sight
    pub fn job_variants_or_insert_with<F>(&mut self, job: &str, classify: F) -> &VariantSet
    where
        F: FnOnce() -> VariantSet,
    {
        if !self.job_variants.contains_key(job) {
            tracing::debug!(job, "classifying job");
        }
        self.job_variants
            .entry(job.to_string())
            .or_insert_with(classify)
    }
}
