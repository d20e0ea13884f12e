use crate::report::rollup::{
    by_failure_impact, JobRollup, TestRollup, TestSummary, VariantHealth, VariantRollup,
};
use crate::stats::{RunCounts, StatsError};
use crate::variant::VariantLabel;
use std::collections::{BTreeMap, BTreeSet};

/// Roll jobs, and the tests that ran in them, up to each variant label
pub(crate) fn variant_rollups(
    jobs: &[JobRollup],
    by_test: &[TestRollup],
    filtered: &[TestRollup],
    flake_as_failure: bool,
) -> Result<Vec<VariantRollup>, StatsError> {
    let mut members: BTreeMap<VariantLabel, Vec<&JobRollup>> = BTreeMap::new();
    for job in jobs {
        for label in job.variants.labels() {
            members.entry(label).or_default().push(job);
        }
    }

    let mut rollups = Vec::with_capacity(members.len());
    for (variant, jobs) in members {
        let names: BTreeSet<&str> = jobs.iter().map(|j| j.name.as_str()).collect();

        let mut job_runs = RunCounts::default();
        for job in &jobs {
            job_runs += job.counts;
        }
        let pass_percentage =
            job_runs.pass_percentage_for(flake_as_failure, &format!("variant {}", variant))?;

        let mut test_totals = RunCounts::default();
        for result in by_test.iter().flat_map(|t| t.by_job.iter()) {
            if names.contains(result.job.as_str()) {
                test_totals += result.counts;
            }
        }

        let mut failing_tests: Vec<TestSummary> = Vec::new();
        for test in filtered {
            if let Some(in_variant) =
                test.restricted(flake_as_failure, |r| names.contains(r.job.as_str()))?
            {
                failing_tests.push(in_variant.summary(Vec::new()));
            }
        }
        failing_tests.sort_by(|a, b| by_failure_impact(&a.counts, &a.name, &b.counts, &b.name));

        rollups.push(VariantRollup {
            variant,
            jobs: names.into_iter().map(str::to_string).collect(),
            job_runs,
            pass_percentage,
            test_totals,
            failing_tests,
        });
    }

    Ok(rollups)
}

/// Count variants per health band
pub(crate) fn variant_health(
    variants: &[VariantRollup],
    success_threshold: f64,
    unstable_threshold: f64,
) -> VariantHealth {
    let mut health = VariantHealth::default();
    for v in variants {
        if v.pass_percentage >= success_threshold {
            health.success += 1;
        } else if v.pass_percentage >= unstable_threshold {
            health.unstable += 1;
        } else {
            health.failing += 1;
        }
    }
    health
}
