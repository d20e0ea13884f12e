use crate::stats::{RunCounts, StatsError};
use crate::variant::{VariantSet, TRIAGE_MATCH_DIMENSIONS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Absolute `scheme:rest` URI or absolute path, no whitespace
static TRACKING_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+|/[^\s]*)$")
        .expect("tracking link pattern is valid")
});

/// Reasons an accepted regression is refused at load time
///
/// Each invariant has its own variant so a bad registry entry points at the
/// field that needs fixing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdmissionError {
    #[error("component must be specified")]
    MissingComponent,

    #[error("test_id must be specified")]
    MissingTestId,

    #[error("test_name must be specified")]
    MissingTestName,

    #[error("previous successes must be greater than zero (a regression needs a healthy baseline)")]
    NoPreviousSuccesses,

    #[error("regressed failures must be greater than zero (a regression needs current failures)")]
    NoRegressedFailures,

    #[error(
        "not actually a regression: previous pass percentage {previous:.4} must be greater than regressed pass percentage {regressed:.4}"
    )]
    NotARegression { previous: f64, regressed: f64 },

    #[error("justification must be specified")]
    MissingJustification,

    #[error("tracking link '{link}' is not a valid URI")]
    InvalidTrackingLink { link: String },

    #[error("variant dimension {dimension} must be specified")]
    MissingDimension { dimension: String },

    #[error("test '{test_id}' was already added for release {release} under {key}")]
    Duplicate {
        release: String,
        test_id: String,
        key: String,
    },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// A reviewed, deliberately accepted drop in a test's pass rate
///
/// # Example TOML
/// ```toml
/// [[regression]]
/// release = "4.16"
/// component = "Networking / ovn-kubernetes"
/// test_id = "openshift-tests:9f1c"
/// test_name = "[sig-network] pods should reach the service"
/// tracking_link = "https://issues.example.com/browse/OCPBUGS-1234"
/// justification = "Known slowdown from the new dataplane; fix lands in 4.17"
///
/// [regression.variant]
/// Platform = "aws"
/// # ... every triage-match dimension
///
/// [regression.previous]
/// successes = 98
/// failures = 2
///
/// [regression.regressed]
/// successes = 85
/// failures = 15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentionalRegression {
    pub component: String,
    pub test_id: String,
    pub test_name: String,
    #[serde(default)]
    pub variant: VariantSet,
    #[serde(default)]
    pub previous: RunCounts,
    #[serde(default)]
    pub regressed: RunCounts,
    #[serde(default)]
    pub tracking_link: String,
    #[serde(default)]
    pub justification: String,
}

impl IntentionalRegression {
    pub fn previous_pass_percentage(&self, flake_as_failure: bool) -> Result<f64, StatsError> {
        self.previous
            .pass_percentage_for(flake_as_failure, "previous counts")
    }

    pub fn regressed_pass_percentage(&self, flake_as_failure: bool) -> Result<f64, StatsError> {
        self.regressed
            .pass_percentage_for(flake_as_failure, "regressed counts")
    }

    /// Check every admission invariant except uniqueness, in order
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.component.trim().is_empty() {
            return Err(AdmissionError::MissingComponent);
        }
        if self.test_id.trim().is_empty() {
            return Err(AdmissionError::MissingTestId);
        }
        if self.test_name.trim().is_empty() {
            return Err(AdmissionError::MissingTestName);
        }
        if self.previous.successes == 0 {
            return Err(AdmissionError::NoPreviousSuccesses);
        }
        if self.regressed.failures == 0 {
            return Err(AdmissionError::NoRegressedFailures);
        }

        // both denominators are non-zero past the two checks above
        let previous = self.previous_pass_percentage(false)?;
        let regressed = self.regressed_pass_percentage(false)?;
        if previous <= regressed {
            return Err(AdmissionError::NotARegression {
                previous,
                regressed,
            });
        }

        if self.justification.trim().is_empty() {
            return Err(AdmissionError::MissingJustification);
        }
        if !is_valid_tracking_link(&self.tracking_link) {
            return Err(AdmissionError::InvalidTrackingLink {
                link: self.tracking_link.clone(),
            });
        }
        for dimension in TRIAGE_MATCH_DIMENSIONS {
            if self.variant.get(dimension).map_or(true, str::is_empty) {
                return Err(AdmissionError::MissingDimension {
                    dimension: dimension.to_string(),
                });
            }
        }

        Ok(())
    }
}

pub fn is_valid_tracking_link(link: &str) -> bool {
    TRACKING_LINK.is_match(link)
}
