use crate::model::{JobOverallResult, RawJobRun};
use crate::stats::{RunCounts, StatsError};
use crate::variant::{VariantLabel, VariantSet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// One job run as it appears in rollups and failure clusters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRunSummary {
    pub id: u64,
    pub job: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub overall_result: JobOverallResult,
    pub test_failures: usize,
    pub failed_test_names: Vec<String>,
}

impl From<&RawJobRun> for JobRunSummary {
    fn from(run: &RawJobRun) -> Self {
        Self {
            id: run.id,
            job: run.job.clone(),
            url: run.url.clone(),
            timestamp: run.timestamp,
            overall_result: run.overall_result,
            test_failures: run.test_failures(),
            failed_test_names: run.failed_test_names(),
        }
    }
}

/// Per-job rollup
///
/// Succeeded runs without flaked tests count as successes, succeeded runs
/// with flaked tests as flakes, everything else as failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRollup {
    pub name: String,
    pub variants: VariantSet,
    pub counts: RunCounts,
    pub pass_percentage: f64,
    /// Newest first
    pub runs: Vec<JobRunSummary>,
}

impl JobRollup {
    pub fn has_variant(&self, label: &VariantLabel) -> bool {
        self.variants.has_label(label)
    }

    /// Latest run; ties on timestamp go to the higher run id
    pub fn most_recent_run(&self) -> Option<&JobRunSummary> {
        self.runs
            .iter()
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
    }
}

/// Counts of one test within one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestJobResult {
    pub job: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
}

/// Per-test rollup: union of the test's results across jobs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRollup {
    pub name: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
    /// Ordered by job name
    pub by_job: Vec<TestJobResult>,
}

impl TestRollup {
    /// Build a rollup whose totals are the sum of `by_job`
    pub fn from_jobs(
        name: &str,
        by_job: Vec<TestJobResult>,
        flake_as_failure: bool,
    ) -> Result<Self, StatsError> {
        let mut counts = RunCounts::default();
        for result in &by_job {
            counts += result.counts;
        }
        let pass_percentage =
            counts.pass_percentage_for(flake_as_failure, &format!("test '{}'", name))?;

        Ok(Self {
            name: name.to_string(),
            counts,
            pass_percentage,
            by_job,
        })
    }

    /// Same test restricted to the jobs accepted by `keep`; `None` when no
    /// job is left
    pub fn restricted<F>(&self, flake_as_failure: bool, keep: F) -> Result<Option<Self>, StatsError>
    where
        F: Fn(&TestJobResult) -> bool,
    {
        let by_job: Vec<_> = self.by_job.iter().filter(|r| keep(r)).cloned().collect();
        if by_job.is_empty() {
            return Ok(None);
        }
        Self::from_jobs(&self.name, by_job, flake_as_failure).map(Some)
    }

    pub fn summary(&self, issues: Vec<String>) -> TestSummary {
        TestSummary {
            name: self.name.clone(),
            counts: self.counts,
            pass_percentage: self.pass_percentage,
            issues,
        }
    }
}

/// A test in a curated list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub name: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
    /// Tracked issue URLs, in tracker order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Failures first, then flakes, then name
pub(crate) fn by_failure_impact(a: &RunCounts, a_name: &str, b: &RunCounts, b_name: &str) -> Ordering {
    b.failures
        .cmp(&a.failures)
        .then(b.flakes.cmp(&a.flakes))
        .then_with(|| a_name.cmp(b_name))
}

/// Per-variant rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRollup {
    pub variant: VariantLabel,
    pub jobs: Vec<String>,
    /// Job run counts summed over the variant's jobs
    pub job_runs: RunCounts,
    pub pass_percentage: f64,
    /// Every test result in the variant's jobs, filtered or not
    pub test_totals: RunCounts,
    /// Tests whose (test, job) pairs survive filtering, by failure impact
    pub failing_tests: Vec<TestSummary>,
}

/// How many variants fall into each health band
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantHealth {
    pub success: usize,
    pub unstable: usize,
    pub failing: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopLevelIndicators {
    pub infrastructure: Option<TestRollup>,
    pub install: Option<TestRollup>,
    pub upgrade: Option<TestRollup>,
    pub operator_health: Option<TestRollup>,
    pub variant: VariantHealth,
}
