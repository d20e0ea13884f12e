use crate::report::config::ReportConfig;
use crate::report::rollup::{JobRollup, TestRollup, TopLevelIndicators, VariantRollup};
use crate::report::variants::variant_health;
use crate::stats::StatsError;
use std::collections::BTreeSet;

/// Headline numbers: the indicator tests outside never-stable jobs, plus
/// variant health
pub(crate) fn top_level_indicators(
    config: &ReportConfig,
    jobs: &[JobRollup],
    by_test: &[TestRollup],
    variants: &[VariantRollup],
) -> Result<TopLevelIndicators, StatsError> {
    let never_stable: BTreeSet<&str> = jobs
        .iter()
        .filter(|j| j.has_variant(&config.never_stable_variant))
        .map(|j| j.name.as_str())
        .collect();

    let indicator = |name: &str| -> Result<Option<TestRollup>, StatsError> {
        match by_test.iter().find(|t| t.name == name) {
            Some(test) => test.restricted(config.flake_as_failure, |r| {
                !never_stable.contains(r.job.as_str())
            }),
            None => Ok(None),
        }
    };

    let tests = &config.indicator_tests;
    Ok(TopLevelIndicators {
        infrastructure: indicator(&tests.infrastructure)?,
        install: indicator(&tests.install)?,
        upgrade: indicator(&tests.upgrade)?,
        operator_health: indicator(&tests.operator_health)?,
        variant: variant_health(
            variants,
            config.variant_success_threshold,
            config.variant_unstable_threshold,
        ),
    })
}
