// Ingestion: parsed test-suite trees and scheduler metadata → raw job runs
//
// Suite trees are flattened into one outcome per `suite.test`, repeated
// outcomes of the same test merge into flakes, every finished run gets an
// overall result plus a synthetic infrastructure test, and each job is
// classified into variants once. All caching lives in an `IngestCache`
// owned by the caller.

mod cache;
mod cluster_data;
mod ingester;
mod junit;

pub use cache::IngestCache;
pub use cluster_data::{
    find_most_recent_date_time_match, parse_variant_data_file, variant_data_from_value,
};
pub use ingester::{overall_result, Ingester, JobRunMeta, JobState};
pub use junit::{extract_test_cases, TestCase, TestCaseMap, TestSuite};

use crate::model::RawData;
use crate::variant::VariantClassifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("run {build_id} has no job name")]
    MissingJobName { build_id: String },

    #[error("invalid cluster data: {0}")]
    ClusterData(#[source] serde_json::Error),

    #[error("invalid cluster data: expected a JSON object")]
    ClusterDataNotAnObject,

    #[error("run {build_id} of job {job}: {source}")]
    Run {
        job: String,
        build_id: String,
        #[source]
        source: Box<IngestError>,
    },
}

/// Ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Suites whose test names are stored without a suite prefix
    pub known_suites: Vec<String>,
    /// Suite holding the synthetic tests added to every run
    pub synthetic_suite: String,
    pub infrastructure_test: String,
    pub install_test: String,
    pub upgrade_test: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            known_suites: vec![
                "openshift-tests".to_string(),
                "openshift-tests-upgrade".to_string(),
            ],
            synthetic_suite: "regwatch-synthetic".to_string(),
            infrastructure_test: "[sig-ci] job infrastructure should work".to_string(),
            install_test: "[sig-ci] cluster install should succeed".to_string(),
            upgrade_test: "[sig-ci] cluster upgrade should succeed".to_string(),
        }
    }
}

impl IngestConfig {
    pub fn new_cache(&self) -> IngestCache {
        IngestCache::new(self.known_suites.iter().cloned())
    }
}

/// One run in an ingestion batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRun {
    #[serde(flatten)]
    pub meta: JobRunMeta,
    #[serde(default)]
    pub suites: Vec<TestSuite>,
    /// Cluster-data artifacts by file name; only the newest one is used
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestBatch {
    #[serde(default)]
    pub runs: Vec<IngestRun>,
}

/// Ingest every run of `batch` with a fresh cache
pub fn ingest_batch(
    batch: &IngestBatch,
    release: &str,
    config: &IngestConfig,
    classifier: &dyn VariantClassifier,
) -> Result<RawData, IngestError> {
    let mut ingester = Ingester::new(release, config, classifier, config.new_cache());
    let mut recorded = 0usize;

    for run in &batch.runs {
        let wrap = |source: IngestError| IngestError::Run {
            job: run.meta.job.clone(),
            build_id: run.meta.build_id.clone(),
            source: Box::new(source),
        };

        let names: Vec<&str> = run.cluster_data.keys().map(String::as_str).collect();
        let cluster_data = match find_most_recent_date_time_match(&names) {
            Some(name) => Some(variant_data_from_value(&run.cluster_data[name]).map_err(wrap)?),
            None => None,
        };

        if ingester
            .ingest_run(&run.meta, &run.suites, cluster_data.as_ref())
            .map_err(wrap)?
        {
            recorded += 1;
        }
    }

    tracing::info!(
        runs = batch.runs.len(),
        recorded,
        "ingested job runs"
    );
    Ok(ingester.finish())
}

#[cfg(test)]
mod tests;
