use crate::report::config::ReportConfig;
use crate::report::rollup::{JobRollup, TestRollup};
use crate::stats::RunCounts;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// A test's counts within a single job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTestResult {
    pub name: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
}

/// A job in the frequent or infrequent view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFrequencyResult {
    pub name: String,
    pub counts: RunCounts,
    pub pass_percentage: f64,
    /// Runs inside the frequency window
    pub recent_runs: usize,
    /// Tests passing the view's filter, lowest pass percentage first
    pub failing_tests: Vec<JobTestResult>,
}

/// Jobs split by how often they ran in the window ending at `now`
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct JobFrequencyViews {
    pub frequent: Vec<JobFrequencyResult>,
    pub infrequent: Vec<JobFrequencyResult>,
}

/// Split jobs into frequent and infrequent views
///
/// A job is frequent when it ran at least once a day on average over the
/// last `frequency_window_days`. Frequent jobs list tests with `min_runs` or
/// more runs; infrequent jobs run too rarely for that, so they list tests
/// with `infrequent_min_runs` or more. Both use `success_threshold`. A window
/// reaching past the representable time range covers every run.
pub(crate) fn job_frequency_views(
    jobs: &[JobRollup],
    by_test: &[TestRollup],
    config: &ReportConfig,
    now: DateTime<Utc>,
) -> JobFrequencyViews {
    let window_start =
        TimeDelta::try_days(config.frequency_window_days).and_then(|d| now.checked_sub_signed(d));

    let mut views = JobFrequencyViews::default();
    for job in jobs {
        let recent_runs = match window_start {
            Some(start) => job.runs.iter().filter(|r| r.timestamp >= start).count(),
            None => job.runs.len(),
        };
        let frequent = recent_runs as i64 >= config.frequency_window_days;
        let min_runs = if frequent {
            config.min_runs
        } else {
            config.infrequent_min_runs
        };

        let mut failing_tests: Vec<JobTestResult> = by_test
            .iter()
            .filter_map(|test| {
                let result = test.by_job.iter().find(|r| r.job == job.name)?;
                let qualifies = result.counts.runs() >= min_runs
                    && result.pass_percentage < config.success_threshold;
                qualifies.then(|| JobTestResult {
                    name: test.name.clone(),
                    counts: result.counts,
                    pass_percentage: result.pass_percentage,
                })
            })
            .collect();
        failing_tests.sort_by(|a, b| {
            a.pass_percentage
                .total_cmp(&b.pass_percentage)
                .then_with(|| a.name.cmp(&b.name))
        });

        let entry = JobFrequencyResult {
            name: job.name.clone(),
            counts: job.counts,
            pass_percentage: job.pass_percentage,
            recent_runs,
            failing_tests,
        };
        if frequent {
            views.frequent.push(entry);
        } else {
            views.infrequent.push(entry);
        }
    }

    for view in [&mut views.frequent, &mut views.infrequent] {
        view.sort_by(|a, b| {
            a.pass_percentage
                .total_cmp(&b.pass_percentage)
                .then_with(|| a.name.cmp(&b.name))
        });
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobOverallResult;
    use crate::report::rollup::{JobRunSummary, TestJobResult};
    use crate::variant::VariantSet;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()
    }

    fn job(name: &str, days_ago: &[i64]) -> JobRollup {
        let runs: Vec<JobRunSummary> = days_ago
            .iter()
            .enumerate()
            .map(|(i, d)| JobRunSummary {
                id: i as u64,
                job: name.to_string(),
                url: format!("https://ci.example.com/{}/{}", name, i),
                timestamp: now() - TimeDelta::days(*d),
                overall_result: JobOverallResult::Succeeded,
                test_failures: 0,
                failed_test_names: Vec::new(),
            })
            .collect();
        let counts = RunCounts::new(runs.len() as u64, 0, 0);
        JobRollup {
            name: name.to_string(),
            variants: VariantSet::new(),
            counts,
            pass_percentage: 1.0,
            runs,
        }
    }

    fn test(name: &str, results: &[(&str, u64, u64)]) -> TestRollup {
        let by_job = results
            .iter()
            .map(|(job, s, f)| {
                let counts = RunCounts::new(*s, *f, 0);
                TestJobResult {
                    job: job.to_string(),
                    counts,
                    pass_percentage: counts.pass_percentage(false).unwrap(),
                }
            })
            .collect();
        TestRollup::from_jobs(name, by_job, false).unwrap()
    }

    fn config() -> ReportConfig {
        ReportConfig {
            min_runs: 5,
            infrequent_min_runs: 2,
            frequency_window_days: 7,
            ..ReportConfig::default()
        }
    }

    #[test]
    fn test_split_by_runs_in_window() {
        let daily = job("daily", &[0, 1, 2, 3, 4, 5, 6]);
        let weekly = job("weekly", &[0, 8, 15]);
        // old runs do not make a job frequent
        let stale = job("stale", &[10, 11, 12, 13, 14, 15, 16, 17]);

        let views = job_frequency_views(&[daily, weekly, stale], &[], &config(), now());
        let frequent: Vec<_> = views.frequent.iter().map(|j| j.name.as_str()).collect();
        let infrequent: Vec<_> = views.infrequent.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(frequent, vec!["daily"]);
        assert_eq!(infrequent, vec!["stale", "weekly"]);
        assert_eq!(views.infrequent[1].recent_runs, 1);
    }

    #[test]
    fn test_infrequent_jobs_use_lower_run_minimum() {
        let daily = job("daily", &[0, 1, 2, 3, 4, 5, 6]);
        let weekly = job("weekly", &[0, 8, 15]);
        let tests = vec![
            test("flaky-everywhere", &[("daily", 1, 2), ("weekly", 1, 2)]),
            test("broken-daily", &[("daily", 0, 7)]),
        ];

        let views = job_frequency_views(&[daily, weekly], &tests, &config(), now());

        // 3 runs is below min_runs for the frequent job
        let daily_tests: Vec<_> = views.frequent[0]
            .failing_tests
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(daily_tests, vec!["broken-daily"]);

        // but enough for the infrequent one
        let weekly_tests = &views.infrequent[0].failing_tests;
        assert_eq!(weekly_tests.len(), 1);
        assert_eq!(weekly_tests[0].name, "flaky-everywhere");
        assert_eq!(weekly_tests[0].counts, RunCounts::new(1, 2, 0));
    }

    #[test]
    fn test_passing_tests_are_not_listed() {
        let weekly = job("weekly", &[0, 8, 15]);
        let tests = vec![test("fine", &[("weekly", 3, 0)])];
        let views = job_frequency_views(&[weekly], &tests, &config(), now());
        assert!(views.infrequent[0].failing_tests.is_empty());
    }

    #[test]
    fn test_unrepresentable_window_covers_every_run() {
        let config = ReportConfig {
            frequency_window_days: i64::MAX,
            ..config()
        };
        let views = job_frequency_views(&[job("old", &[400, 800])], &[], &config, now());
        assert_eq!(views.infrequent[0].recent_runs, 2);
    }
}
