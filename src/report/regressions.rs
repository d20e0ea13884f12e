use crate::regression::IntentionalRegressionRegistry;
use crate::report::rollup::TestRollup;
use crate::stats::RunCounts;
use crate::triage::{TriageRegistry, TriagedIncident};
use crate::variant::{canonicalize, VariantSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// A failing (test, job) pair that survived filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressedPair {
    pub test: String,
    pub job: String,
    pub variants: VariantSet,
    /// Canonical variant key the pair was looked up under
    pub key: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriagedRegression {
    #[serde(flatten)]
    pub pair: RegressedPair,
    pub incidents: Vec<TriagedIncident>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedRegression {
    #[serde(flatten)]
    pub pair: RegressedPair,
    pub tracking_link: String,
    pub justification: String,
}

/// Failing pairs split by whether someone already explained them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegressionTriage {
    pub triaged: Vec<TriagedRegression>,
    pub intentional: Vec<AcceptedRegression>,
    pub untriaged: Vec<RegressedPair>,
}

impl RegressionTriage {
    pub fn len(&self) -> usize {
        self.triaged.len() + self.intentional.len() + self.untriaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify every filtered pair with at least one failure
///
/// Triage incidents take precedence over accepted regressions; a pair
/// matched by neither is untriaged. Pairs keep the order of `filtered`.
pub(crate) fn classify_regressions(
    release: &str,
    filtered: &[TestRollup],
    job_variants: &BTreeMap<&str, &VariantSet>,
    triage: &TriageRegistry,
    intentional: &IntentionalRegressionRegistry,
) -> RegressionTriage {
    let empty = VariantSet::new();
    let mut result = RegressionTriage::default();

    for test in filtered {
        for job in test.by_job.iter().filter(|r| r.counts.failures > 0) {
            let variants = job_variants.get(job.job.as_str()).copied().unwrap_or(&empty);
            let key = canonicalize(&test.name, variants);
            let pair = RegressedPair {
                test: test.name.clone(),
                job: job.job.clone(),
                variants: variants.clone(),
                key: key.variants().to_string(),
                counts: job.counts,
                pass_percentage: job.pass_percentage,
            };

            if let Some(incidents) = triage.lookup(release, &key) {
                tracing::debug!(%key, incidents = incidents.len(), "regression already triaged");
                result.triaged.push(TriagedRegression {
                    pair,
                    incidents: incidents.to_vec(),
                });
            } else if let Some(accepted) = intentional.lookup_key(release, &key) {
                result.intentional.push(AcceptedRegression {
                    pair,
                    tracking_link: accepted.tracking_link.clone(),
                    justification: accepted.justification.clone(),
                });
            } else {
                result.untriaged.push(pair);
            }
        }
    }

    result
}
