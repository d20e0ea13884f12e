use crate::report::rollup::JobRollup;
use crate::variant::VariantLabel;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::fmt;

/// Health problem of a job that gates promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromotionWarning {
    Stale {
        job: String,
        url: String,
        hours: i64,
    },
    NeverSucceeded {
        job: String,
    },
    LatestFailed {
        job: String,
        url: String,
    },
}

impl fmt::Display for PromotionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionWarning::Stale { job, url, hours } => write!(
                f,
                "promotion job {} has not run in the last {} hours (latest run: {})",
                job, hours, url
            ),
            PromotionWarning::NeverSucceeded { job } => {
                write!(f, "promotion job {} has no successful run", job)
            }
            PromotionWarning::LatestFailed { job, url } => {
                write!(f, "most recent promotion of {} failed: {}", job, url)
            }
        }
    }
}

/// Check every job carrying `promotion_variant`
///
/// The three checks are independent: a job can be stale, have never
/// succeeded and have a failed latest run all at once. A freshness window
/// reaching past the representable time range never goes stale.
pub fn promotion_warnings(
    jobs: &[JobRollup],
    promotion_variant: &VariantLabel,
    freshness_hours: i64,
    now: DateTime<Utc>,
) -> Vec<PromotionWarning> {
    let cutoff = TimeDelta::try_hours(freshness_hours).and_then(|d| now.checked_sub_signed(d));
    let mut warnings = Vec::new();

    for job in jobs.iter().filter(|j| j.has_variant(promotion_variant)) {
        let Some(latest) = job.most_recent_run() else {
            continue;
        };

        if cutoff.is_some_and(|c| latest.timestamp < c) {
            warnings.push(PromotionWarning::Stale {
                job: job.name.clone(),
                url: latest.url.clone(),
                hours: freshness_hours,
            });
        }

        if !job.runs.iter().any(|r| r.overall_result.succeeded()) {
            warnings.push(PromotionWarning::NeverSucceeded {
                job: job.name.clone(),
            });
        }

        if !latest.overall_result.succeeded() {
            warnings.push(PromotionWarning::LatestFailed {
                job: job.name.clone(),
                url: latest.url.clone(),
            });
        }
    }

    warnings
}
