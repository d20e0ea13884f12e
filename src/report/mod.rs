// Report generation: per-job, per-test and per-variant rollups
//
// One aggregation pass folds a batch of raw job runs into a `Report`. Every
// stage is a pure function of the previous stage's output plus the injected
// registries; the wall clock only enters through the `now` argument, so the
// same inputs always render the same report.

mod aggregate;
mod config;
mod defects;
mod failure_groups;
mod frequency;
mod indicators;
mod promotion;
mod regressions;
mod render;
mod rollup;
mod variants;

pub use aggregate::Aggregator;
pub use config::{IndicatorTests, ReportConfig};
pub use defects::attribute_defects;
pub use failure_groups::failure_groups;
pub use frequency::{JobFrequencyResult, JobTestResult};
pub use promotion::{promotion_warnings, PromotionWarning};
pub use regressions::{AcceptedRegression, RegressedPair, RegressionTriage, TriagedRegression};
pub use render::render_text;
pub use rollup::{
    JobRollup, JobRunSummary, TestJobResult, TestRollup, TestSummary, TopLevelIndicators,
    VariantHealth, VariantRollup,
};

use crate::issues::TrackedIssue;
use crate::stats::StatsError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that abort an aggregation pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("invalid report configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed input for job '{job}': {reason}")]
    MalformedInput { job: String, reason: String },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Output of one aggregation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub release: String,
    pub timestamp: DateTime<Utc>,
    pub top_level_indicators: TopLevelIndicators,
    /// Every test, unfiltered, lowest pass percentage first
    pub by_test: Vec<TestRollup>,
    /// Tests restricted to qualifying (test, job) pairs
    pub filtered_by_test: Vec<TestRollup>,
    pub by_variant: Vec<VariantRollup>,
    pub by_job: Vec<JobRollup>,
    /// Jobs averaging at least one run a day over the frequency window
    pub frequent_jobs: Vec<JobFrequencyResult>,
    /// All other jobs, with a lower run minimum for their failing tests
    pub infrequent_jobs: Vec<JobFrequencyResult>,
    pub failure_groups: Vec<JobRunSummary>,
    pub bugs_by_failure_count: Vec<TrackedIssue>,
    pub top_failing_tests_with_bug: Vec<TestSummary>,
    pub top_failing_tests_without_bug: Vec<TestSummary>,
    pub regressions: RegressionTriage,
    pub analysis_warnings: Vec<String>,
}
