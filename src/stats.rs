//! Run counts and pass-percentage math
//!
//! Every rollup in the crate (per job, per test, per variant) and every
//! accepted regression reduces to the same three counters. The two
//! pass-percentage formulas live here so the aggregator and the regression
//! registry can never disagree about what "passing" means.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use thiserror::Error;

/// Errors produced by percentage math
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("cannot compute a pass percentage for {context}: no runs recorded")]
    NoRuns { context: String },
}

/// Compute a pass percentage as a fraction in `[0, 1]`
///
/// * `flake_as_failure = true`: `successes / (successes + flakes + failures)`
/// * `flake_as_failure = false`: `(successes + flakes) / (successes + flakes + failures)`
///
/// A zero denominator is rejected rather than reported as 0%.
///
/// # Example
/// ```
/// use regwatch::stats::pass_percentage;
///
/// assert_eq!(pass_percentage(false, 8, 1, 1).unwrap(), 0.9);
/// assert_eq!(pass_percentage(true, 8, 1, 1).unwrap(), 0.8);
/// assert!(pass_percentage(false, 0, 0, 0).is_err());
/// ```
pub fn pass_percentage(
    flake_as_failure: bool,
    successes: u64,
    flakes: u64,
    failures: u64,
) -> Result<f64, StatsError> {
    let total = successes + flakes + failures;
    if total == 0 {
        return Err(StatsError::NoRuns {
            context: "empty counts".to_string(),
        });
    }

    let passed = if flake_as_failure {
        successes
    } else {
        successes + flakes
    };
    Ok(passed as f64 / total as f64)
}

/// Success/failure/flake counters for one rollup entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunCounts {
    #[serde(default)]
    pub successes: u64,
    #[serde(default)]
    pub failures: u64,
    #[serde(default)]
    pub flakes: u64,
}

impl RunCounts {
    pub fn new(successes: u64, failures: u64, flakes: u64) -> Self {
        Self {
            successes,
            failures,
            flakes,
        }
    }

    /// Total number of runs these counters describe
    pub fn runs(&self) -> u64 {
        self.successes + self.failures + self.flakes
    }

    pub fn is_empty(&self) -> bool {
        self.runs() == 0
    }

    /// Pass percentage of these counts, see [`pass_percentage`]
    pub fn pass_percentage(&self, flake_as_failure: bool) -> Result<f64, StatsError> {
        pass_percentage(flake_as_failure, self.successes, self.flakes, self.failures)
    }

    /// Like [`RunCounts::pass_percentage`] but names the entity in the error
    pub fn pass_percentage_for(
        &self,
        flake_as_failure: bool,
        context: &str,
    ) -> Result<f64, StatsError> {
        self.pass_percentage(flake_as_failure)
            .map_err(|_| StatsError::NoRuns {
                context: context.to_string(),
            })
    }

    /// Record a single outcome
    pub fn record(&mut self, status: crate::model::TestStatus) {
        use crate::model::TestStatus;
        match status {
            TestStatus::Success => self.successes += 1,
            TestStatus::Failure => self.failures += 1,
            TestStatus::Flake => self.flakes += 1,
        }
    }
}

impl AddAssign for RunCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.successes += rhs.successes;
        self.failures += rhs.failures;
        self.flakes += rhs.flakes;
    }
}
