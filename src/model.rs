//! Raw job run results as they reach the aggregator
//!
//! These records are produced by ingestion (see [`crate::ingest`]) or loaded
//! directly from JSON, and are never mutated once captured.

use crate::variant::VariantSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one test within one job run
///
/// Skipped tests are dropped during ingestion and have no status here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Success,
    Failure,
    /// Passed and failed within the same run
    Flake,
}

/// Overall classification of a finished job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOverallResult {
    Succeeded,
    TestFailure,
    InstallFailure,
    UpgradeFailure,
    InfrastructureFailure,
    Aborted,
}

impl JobOverallResult {
    pub fn succeeded(self) -> bool {
        self == JobOverallResult::Succeeded
    }
}

impl std::fmt::Display for JobOverallResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobOverallResult::Succeeded => "succeeded",
            JobOverallResult::TestFailure => "test failure",
            JobOverallResult::InstallFailure => "install failure",
            JobOverallResult::UpgradeFailure => "upgrade failure",
            JobOverallResult::InfrastructureFailure => "infrastructure failure",
            JobOverallResult::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// One test outcome inside a job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTestOutcome {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    pub status: TestStatus,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_output: Option<String>,
}

impl RawTestOutcome {
    pub fn new(name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            name: name.into(),
            suite: None,
            status,
            duration_secs: 0.0,
            failure_output: None,
        }
    }
}

/// A single execution of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJobRun {
    pub id: u64,
    pub job: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub overall_result: JobOverallResult,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub tests: Vec<RawTestOutcome>,
}

impl RawJobRun {
    /// Number of tests that failed outright (flakes excluded)
    pub fn test_failures(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| t.status == TestStatus::Failure)
            .count()
    }

    pub fn failed_test_names(&self) -> Vec<String> {
        self.tests
            .iter()
            .filter(|t| t.status == TestStatus::Failure)
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn has_flakes(&self) -> bool {
        self.tests.iter().any(|t| t.status == TestStatus::Flake)
    }
}

/// All runs of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJob {
    pub name: String,
    /// Variants assigned during ingestion; the aggregator classifies the job
    /// itself when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<VariantSet>,
    #[serde(default)]
    pub runs: Vec<RawJobRun>,
}

/// Input of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub jobs: Vec<RawJob>,
}

impl RawData {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(statuses: &[TestStatus]) -> RawJobRun {
        RawJobRun {
            id: 1,
            job: "periodic-e2e-aws".to_string(),
            url: "https://ci.example.com/runs/1".to_string(),
            timestamp: Utc::now(),
            overall_result: JobOverallResult::TestFailure,
            duration_secs: 0.0,
            tests: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| RawTestOutcome::new(format!("test-{}", i), *s))
                .collect(),
        }
    }

    #[test]
    fn test_failures_exclude_flakes() {
        let r = run(&[TestStatus::Failure, TestStatus::Flake, TestStatus::Success]);
        assert_eq!(r.test_failures(), 1);
        assert_eq!(r.failed_test_names(), vec!["test-0".to_string()]);
        assert!(r.has_flakes());
    }

    #[test]
    fn test_raw_data_json() {
        let json = r#"{
            "jobs": [{
                "name": "periodic-e2e-aws",
                "runs": [{
                    "id": 7,
                    "job": "periodic-e2e-aws",
                    "url": "https://ci.example.com/runs/7",
                    "timestamp": "2024-02-21T02:05:11Z",
                    "overall_result": "install_failure",
                    "tests": [{"name": "install should succeed", "status": "failure"}]
                }]
            }]
        }"#;
        let data = RawData::from_json(json).unwrap();
        assert_eq!(data.jobs.len(), 1);
        assert!(data.jobs[0].variants.is_none());
        let run = &data.jobs[0].runs[0];
        assert_eq!(run.overall_result, JobOverallResult::InstallFailure);
        assert_eq!(run.tests[0].status, TestStatus::Failure);
    }
}
