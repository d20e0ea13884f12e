use crate::ingest::cache::IngestCache;
use crate::ingest::junit::{extract_test_cases, TestCase, TestCaseMap, TestSuite};
use crate::ingest::{IngestConfig, IngestError};
use crate::model::{JobOverallResult, RawData, RawJob, RawJobRun, RawTestOutcome, TestStatus};
use crate::variant::{VariantClassifier, VariantSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// State of a job run as reported by the CI scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Triggered,
    Pending,
    Success,
    Failure,
    Aborted,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Triggered | JobState::Pending)
    }
}

/// Scheduler metadata of one job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunMeta {
    /// Build id; runs whose id is not numeric are not recorded
    pub build_id: String,
    pub job: String,
    pub url: String,
    pub state: JobState,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
}

/// Classify a finished run from its scheduler state and test outcomes
///
/// Returns `None` for runs that have not finished.
pub fn overall_result(
    state: JobState,
    tests: &TestCaseMap,
    config: &IngestConfig,
) -> Option<JobOverallResult> {
    let failed = |name: &str| {
        tests
            .values()
            .any(|t| t.name == name && t.status == TestStatus::Failure)
    };

    let result = match state {
        JobState::Triggered | JobState::Pending => return None,
        JobState::Success => JobOverallResult::Succeeded,
        JobState::Aborted => JobOverallResult::Aborted,
        JobState::Error => JobOverallResult::InfrastructureFailure,
        JobState::Failure if failed(&config.install_test) => JobOverallResult::InstallFailure,
        JobState::Failure if failed(&config.upgrade_test) => JobOverallResult::UpgradeFailure,
        JobState::Failure if tests.is_empty() => JobOverallResult::InfrastructureFailure,
        JobState::Failure => JobOverallResult::TestFailure,
    };
    Some(result)
}

/// Turns parsed suites of finished job runs into [`RawData`]
///
/// # Example
/// ```
/// use chrono::Utc;
/// use regwatch::ingest::{IngestCache, IngestConfig, Ingester, JobRunMeta, JobState, TestCase, TestSuite};
/// use regwatch::variant::{ClassifierConfig, PatternClassifier};
///
/// let config = IngestConfig::default();
/// let classifier = PatternClassifier::new(&ClassifierConfig::default()).unwrap();
/// let mut ingester = Ingester::new("4.16", &config, &classifier, IngestCache::default());
///
/// let meta = JobRunMeta {
///     build_id: "1001".to_string(),
///     job: "periodic-e2e-aws".to_string(),
///     url: "https://ci.example.com/runs/1001".to_string(),
///     state: JobState::Success,
///     start_time: Utc::now(),
///     completion_time: None,
/// };
/// let suites = vec![TestSuite {
///     name: "openshift-tests".to_string(),
///     test_cases: vec![TestCase::passed("pods should start")],
///     children: Vec::new(),
/// }];
/// assert!(ingester.ingest_run(&meta, &suites, None).unwrap());
/// assert_eq!(ingester.finish().jobs.len(), 1);
/// ```
pub struct Ingester<'a> {
    release: String,
    config: &'a IngestConfig,
    classifier: &'a dyn VariantClassifier,
    cache: IngestCache,
    jobs: BTreeMap<String, Vec<RawJobRun>>,
    /// Newest cluster data seen per job, keyed by (start time, run id)
    cluster_data: BTreeMap<String, ((DateTime<Utc>, u64), VariantSet)>,
}

impl<'a> Ingester<'a> {
    pub fn new(
        release: impl Into<String>,
        config: &'a IngestConfig,
        classifier: &'a dyn VariantClassifier,
        mut cache: IngestCache,
    ) -> Self {
        cache.add_known_suite(config.synthetic_suite.as_str());
        Self {
            release: release.into(),
            config,
            classifier,
            cache,
            jobs: BTreeMap::new(),
            cluster_data: BTreeMap::new(),
        }
    }

    pub fn cache(&self) -> &IngestCache {
        &self.cache
    }

    /// Record one job run
    ///
    /// Unfinished runs, runs with a non-numeric build id and runs already in
    /// the cache are skipped and yield `Ok(false)`. Variants are recorded per
    /// job: the job's classified variants with the cluster data of its newest
    /// run that carried any merged over them, whatever the ingestion order.
    pub fn ingest_run(
        &mut self,
        meta: &JobRunMeta,
        suites: &[TestSuite],
        cluster_data: Option<&VariantSet>,
    ) -> Result<bool, IngestError> {
        if !meta.state.is_terminal() {
            debug!(job = %meta.job, build = %meta.build_id, state = ?meta.state, "skipping unfinished run");
            return Ok(false);
        }
        if meta.job.trim().is_empty() {
            return Err(IngestError::MissingJobName {
                build_id: meta.build_id.clone(),
            });
        }
        let Ok(id) = meta.build_id.parse::<u64>() else {
            warn!(job = %meta.job, build = %meta.build_id, "skipping run with non-numeric build id");
            return Ok(false);
        };
        if self.cache.has_run(id) {
            debug!(job = %meta.job, id, "run already ingested");
            return Ok(false);
        }

        let (release, classifier) = (self.release.as_str(), self.classifier);
        self.cache
            .job_variants_or_insert_with(&meta.job, || classifier.identify_variants(&meta.job, release));

        let mut tests = TestCaseMap::new();
        for suite in suites {
            extract_test_cases(suite, &self.cache, &mut tests);
        }
        let Some(result) = overall_result(meta.state, &tests, self.config) else {
            return Ok(false);
        };
        extract_test_cases(&self.synthetic_suite(result), &self.cache, &mut tests);

        let duration_secs = meta
            .completion_time
            .map(|end| (end - meta.start_time).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        let run = RawJobRun {
            id,
            job: meta.job.clone(),
            url: meta.url.clone(),
            timestamp: meta.start_time,
            overall_result: result,
            duration_secs,
            tests: tests.into_values().collect::<Vec<RawTestOutcome>>(),
        };
        debug!(job = %run.job, id, result = %result, tests = run.tests.len(), "ingested run");

        if let Some(extra) = cluster_data {
            self.record_cluster_data(&meta.job, (meta.start_time, id), extra);
        }
        self.cache.mark_run(id);
        self.jobs.entry(meta.job.clone()).or_default().push(run);
        Ok(true)
    }

    fn record_cluster_data(&mut self, job: &str, stamp: (DateTime<Utc>, u64), extra: &VariantSet) {
        let newer = self
            .cluster_data
            .get(job)
            .map_or(true, |(newest, _)| stamp > *newest);
        if newer {
            self.cluster_data.insert(job.to_string(), (stamp, extra.clone()));
        } else {
            debug!(job, id = stamp.1, "older cluster data ignored");
        }
    }

    fn synthetic_suite(&self, result: JobOverallResult) -> TestSuite {
        let infrastructure = if result == JobOverallResult::InfrastructureFailure {
            TestCase::failed(
                self.config.infrastructure_test.as_str(),
                format!("job run ended with {}", result),
            )
        } else {
            TestCase::passed(self.config.infrastructure_test.as_str())
        };
        TestSuite {
            name: self.config.synthetic_suite.clone(),
            test_cases: vec![infrastructure],
            children: Vec::new(),
        }
    }

    /// Raw data of every recorded run, jobs in name order
    pub fn finish(self) -> RawData {
        let Self {
            cache,
            jobs,
            cluster_data,
            ..
        } = self;
        let jobs = jobs
            .into_iter()
            .map(|(name, runs)| {
                let mut variants = cache.job_variants(&name).cloned().unwrap_or_default();
                if let Some((_, extra)) = cluster_data.get(&name) {
                    variants.merge(extra);
                }
                RawJob {
                    variants: Some(variants),
                    name,
                    runs,
                }
            })
            .collect();
        RawData { jobs }
    }
}
