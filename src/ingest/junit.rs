use crate::ingest::cache::IngestCache;
use crate::model::{RawTestOutcome, TestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed test suite; suites nest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub children: Vec<TestSuite>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_message: Option<String>,
}

impl TestCase {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn failed(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn skipped(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skip_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Test outcomes of one run keyed by `suite.test`
///
/// Keys always carry the suite name so a pass in one suite and a failure in
/// another never merge into a flake.
pub type TestCaseMap = BTreeMap<String, RawTestOutcome>;

/// Collect the outcomes of `suite` and its children into `out`
///
/// Skipped cases are dropped. A pass and a failure under the same key
/// become a flake that keeps the first failure output seen.
pub fn extract_test_cases(suite: &TestSuite, cache: &IngestCache, out: &mut TestCaseMap) {
    let prefix_names = !suite.name.is_empty() && !cache.is_known_suite(&suite.name);

    for case in &suite.test_cases {
        if case.skip_message.is_some() {
            continue;
        }
        let status = if case.failure_output.is_some() {
            TestStatus::Failure
        } else {
            TestStatus::Success
        };

        let key = format!("{}.{}", suite.name, case.name);
        match out.get_mut(&key) {
            None => {
                let name = if prefix_names {
                    format!("{}.{}", suite.name, case.name)
                } else {
                    case.name.clone()
                };
                out.insert(
                    key,
                    RawTestOutcome {
                        name,
                        suite: (!suite.name.is_empty()).then(|| suite.name.clone()),
                        status,
                        duration_secs: case.duration_secs,
                        failure_output: case.failure_output.clone(),
                    },
                );
            }
            Some(existing) => {
                let mixed = matches!(
                    (existing.status, status),
                    (TestStatus::Failure, TestStatus::Success)
                        | (TestStatus::Success, TestStatus::Failure)
                );
                if mixed {
                    existing.status = TestStatus::Flake;
                    if existing.failure_output.is_none() {
                        existing.failure_output = case.failure_output.clone();
                    }
                }
            }
        }
    }

    for child in &suite.children {
        extract_test_cases(child, cache, out);
    }
}
