use crate::issues::{IssueLookup, TrackedIssue};
use crate::model::{RawData, RawJob};
use crate::regression::IntentionalRegressionRegistry;
use crate::report::config::ReportConfig;
use crate::report::defects::attribute_defects;
use crate::report::failure_groups::failure_groups;
use crate::report::frequency::job_frequency_views;
use crate::report::indicators::top_level_indicators;
use crate::report::promotion::promotion_warnings;
use crate::report::regressions::classify_regressions;
use crate::report::rollup::{
    by_failure_impact, JobRollup, JobRunSummary, TestJobResult, TestRollup, TestSummary,
};
use crate::report::variants::variant_rollups;
use crate::report::{Report, ReportError};
use crate::stats::RunCounts;
use crate::triage::TriageRegistry;
use crate::variant::{VariantClassifier, VariantSet};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// One aggregation pass over a batch of raw job runs
///
/// Holds only borrowed, read-only collaborators; nothing survives between
/// calls to [`Aggregator::aggregate`].
///
/// # Example
/// ```
/// use chrono::Utc;
/// use regwatch::issues::StaticIssueIndex;
/// use regwatch::model::RawData;
/// use regwatch::regression::IntentionalRegressionRegistry;
/// use regwatch::report::{Aggregator, ReportConfig};
/// use regwatch::triage::TriageRegistry;
/// use regwatch::variant::{ClassifierConfig, PatternClassifier};
///
/// let config = ReportConfig::default();
/// let classifier = PatternClassifier::new(&ClassifierConfig::default()).unwrap();
/// let triage = TriageRegistry::new();
/// let intentional = IntentionalRegressionRegistry::empty();
/// let issues = StaticIssueIndex::new();
///
/// let aggregator = Aggregator {
///     release: "4.16",
///     config: &config,
///     classifier: &classifier,
///     triage: &triage,
///     intentional: &intentional,
///     issues: &issues,
/// };
/// let report = aggregator.aggregate(&RawData::default(), Utc::now()).unwrap();
/// assert!(report.by_job.is_empty());
/// ```
pub struct Aggregator<'a> {
    pub release: &'a str,
    pub config: &'a ReportConfig,
    pub classifier: &'a dyn VariantClassifier,
    pub triage: &'a TriageRegistry,
    pub intentional: &'a IntentionalRegressionRegistry,
    pub issues: &'a dyn IssueLookup,
}

impl<'a> Aggregator<'a> {
    /// Fold `raw` into a report as of `now`
    ///
    /// # Errors
    /// [`ReportError::InvalidConfig`] when the configuration does not
    /// validate, [`ReportError::MalformedInput`] for structurally broken
    /// input. Issue lookup failures are not errors; they become report
    /// warnings.
    pub fn aggregate(&self, raw: &RawData, now: DateTime<Utc>) -> Result<Report, ReportError> {
        self.config.validate().map_err(ReportError::InvalidConfig)?;
        validate_input(raw)?;

        let flake_as_failure = self.config.flake_as_failure;
        let mut warnings = Vec::new();

        let by_job = self.job_rollups(raw)?;
        let by_test = test_rollups(raw, flake_as_failure)?;
        let filtered_by_test = self.filter_tests(&by_test)?;
        debug!(
            jobs = by_job.len(),
            tests = by_test.len(),
            filtered = filtered_by_test.len(),
            "rolled up job runs"
        );

        let issues_by_test = self.lookup_issues(&filtered_by_test, &mut warnings);
        let bugs_by_failure_count = attribute_defects(&filtered_by_test, &issues_by_test);
        let failure_groups = failure_groups(&raw.jobs, self.config.failure_cluster_threshold);
        let (top_failing_tests_with_bug, top_failing_tests_without_bug) =
            curate_top_failing(&filtered_by_test, &issues_by_test, self.config.top_n);

        for warning in promotion_warnings(
            &by_job,
            &self.config.promotion_variant,
            self.config.promotion_freshness_hours,
            now,
        ) {
            warn!(%warning, "promotion job unhealthy");
            warnings.push(warning.to_string());
        }

        let job_variants: BTreeMap<&str, &VariantSet> = by_job
            .iter()
            .map(|j| (j.name.as_str(), &j.variants))
            .collect();
        let regressions = classify_regressions(
            self.release,
            &filtered_by_test,
            &job_variants,
            self.triage,
            self.intentional,
        );

        let frequency = job_frequency_views(&by_job, &by_test, self.config, now);

        let by_variant = variant_rollups(&by_job, &by_test, &filtered_by_test, flake_as_failure)?;
        let top_level_indicators =
            top_level_indicators(self.config, &by_job, &by_test, &by_variant)?;

        info!(
            release = self.release,
            jobs = by_job.len(),
            tests = by_test.len(),
            untriaged = regressions.untriaged.len(),
            warnings = warnings.len(),
            "report generated"
        );

        Ok(Report {
            release: self.release.to_string(),
            timestamp: now,
            top_level_indicators,
            by_test,
            filtered_by_test,
            by_variant,
            by_job,
            frequent_jobs: frequency.frequent,
            infrequent_jobs: frequency.infrequent,
            failure_groups,
            bugs_by_failure_count,
            top_failing_tests_with_bug,
            top_failing_tests_without_bug,
            regressions,
            analysis_warnings: warnings,
        })
    }

    fn job_rollups(&self, raw: &RawData) -> Result<Vec<JobRollup>, ReportError> {
        let mut rollups = Vec::with_capacity(raw.jobs.len());

        for job in &raw.jobs {
            let variants = match &job.variants {
                Some(v) => v.clone(),
                None => self.classifier.identify_variants(&job.name, self.release),
            };

            let mut counts = RunCounts::default();
            for run in &job.runs {
                if !run.overall_result.succeeded() {
                    counts.failures += 1;
                } else if run.has_flakes() {
                    counts.flakes += 1;
                } else {
                    counts.successes += 1;
                }
            }
            let pass_percentage = counts
                .pass_percentage_for(self.config.flake_as_failure, &format!("job {}", job.name))?;

            let mut runs: Vec<JobRunSummary> = job.runs.iter().map(JobRunSummary::from).collect();
            runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

            rollups.push(JobRollup {
                name: job.name.clone(),
                variants,
                counts,
                pass_percentage,
                runs,
            });
        }

        rollups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rollups)
    }

    /// Keep only pairs with enough runs and a pass rate below the threshold
    fn filter_tests(&self, by_test: &[TestRollup]) -> Result<Vec<TestRollup>, ReportError> {
        let mut filtered = Vec::new();
        for test in by_test {
            let kept = test.restricted(self.config.flake_as_failure, |r| {
                r.counts.runs() >= self.config.min_runs
                    && r.pass_percentage < self.config.success_threshold
            })?;
            filtered.extend(kept);
        }
        sort_by_pass_percentage(&mut filtered);
        Ok(filtered)
    }

    /// Issues of each filtered test; tests whose lookup failed are absent
    fn lookup_issues(
        &self,
        filtered: &[TestRollup],
        warnings: &mut Vec<String>,
    ) -> BTreeMap<String, Vec<TrackedIssue>> {
        let mut issues_by_test = BTreeMap::new();
        for test in filtered {
            match self.issues.find_issues_for_test(&test.name) {
                Ok(issues) => {
                    issues_by_test.insert(test.name.clone(), issues);
                }
                Err(e) => {
                    warn!(test = %test.name, error = %e, "issue lookup failed");
                    warnings.push(format!(
                        "{}; its failures are not attributed to any issue",
                        e
                    ));
                }
            }
        }
        issues_by_test
    }
}

fn validate_input(raw: &RawData) -> Result<(), ReportError> {
    let malformed = |job: &str, reason: String| ReportError::MalformedInput {
        job: job.to_string(),
        reason,
    };

    let mut seen = BTreeSet::new();
    for job in &raw.jobs {
        if job.name.trim().is_empty() {
            return Err(malformed(&job.name, "job name is empty".to_string()));
        }
        if !seen.insert(job.name.as_str()) {
            return Err(malformed(&job.name, "job listed more than once".to_string()));
        }
        if job.runs.is_empty() {
            return Err(malformed(&job.name, "job has no runs".to_string()));
        }
        for run in &job.runs {
            if run.job != job.name {
                return Err(malformed(
                    &job.name,
                    format!("run {} belongs to job '{}'", run.id, run.job),
                ));
            }
            if run.tests.iter().any(|t| t.name.trim().is_empty()) {
                return Err(malformed(
                    &job.name,
                    format!("run {} has a test with an empty name", run.id),
                ));
            }
        }
    }
    Ok(())
}

/// Per-(test, job) counts; test totals are the union over jobs
fn test_rollups(raw: &RawData, flake_as_failure: bool) -> Result<Vec<TestRollup>, ReportError> {
    let mut pairs: BTreeMap<&str, BTreeMap<&str, RunCounts>> = BTreeMap::new();
    for job in &raw.jobs {
        record_job(&mut pairs, job);
    }

    let mut rollups = Vec::with_capacity(pairs.len());
    for (test, jobs) in pairs {
        let mut by_job = Vec::with_capacity(jobs.len());
        for (job, counts) in jobs {
            let pass_percentage = counts.pass_percentage_for(
                flake_as_failure,
                &format!("test '{}' in job {}", test, job),
            )?;
            by_job.push(TestJobResult {
                job: job.to_string(),
                counts,
                pass_percentage,
            });
        }
        rollups.push(TestRollup::from_jobs(test, by_job, flake_as_failure)?);
    }

    sort_by_pass_percentage(&mut rollups);
    Ok(rollups)
}

fn record_job<'r>(pairs: &mut BTreeMap<&'r str, BTreeMap<&'r str, RunCounts>>, job: &'r RawJob) {
    for run in &job.runs {
        for test in &run.tests {
            pairs
                .entry(test.name.as_str())
                .or_default()
                .entry(job.name.as_str())
                .or_default()
                .record(test.status);
        }
    }
}

fn sort_by_pass_percentage(tests: &mut [TestRollup]) {
    tests.sort_by(|a, b| {
        a.pass_percentage
            .total_cmp(&b.pass_percentage)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn curate_top_failing(
    filtered: &[TestRollup],
    issues_by_test: &BTreeMap<String, Vec<TrackedIssue>>,
    top_n: usize,
) -> (Vec<TestSummary>, Vec<TestSummary>) {
    let mut with_bug = Vec::new();
    let mut without_bug = Vec::new();

    for test in filtered {
        match issues_by_test.get(&test.name) {
            None => {}
            Some(issues) if issues.is_empty() => without_bug.push(test.summary(Vec::new())),
            Some(issues) => {
                with_bug.push(test.summary(issues.iter().map(|i| i.url.clone()).collect()))
            }
        }
    }

    for list in [&mut with_bug, &mut without_bug] {
        list.sort_by(|a, b| by_failure_impact(&a.counts, &a.name, &b.counts, &b.name));
        list.truncate(top_n);
    }
    (with_bug, without_bug)
}
