use crate::issues::TrackedIssue;
use crate::report::rollup::TestRollup;
use std::collections::BTreeMap;

/// Sum the filtered failures and flakes of each test into its tracked issues
///
/// Only tests present in `issues_by_test` contribute; a test whose lookup
/// failed is simply absent. The result is ordered by failure count
/// descending, then flake count descending, then URL.
pub fn attribute_defects(
    tests: &[TestRollup],
    issues_by_test: &BTreeMap<String, Vec<TrackedIssue>>,
) -> Vec<TrackedIssue> {
    let mut by_url: BTreeMap<String, TrackedIssue> = BTreeMap::new();

    for test in tests {
        let Some(issues) = issues_by_test.get(&test.name) else {
            continue;
        };
        for issue in issues {
            let entry = by_url.entry(issue.url.clone()).or_insert_with(|| TrackedIssue {
                failure_count: 0,
                flake_count: 0,
                ..issue.clone()
            });
            entry.failure_count += test.counts.failures;
            entry.flake_count += test.counts.flakes;
        }
    }

    let mut ranked: Vec<TrackedIssue> = by_url.into_values().collect();
    ranked.sort_by(|a, b| {
        b.failure_count
            .cmp(&a.failure_count)
            .then(b.flake_count.cmp(&a.flake_count))
            .then_with(|| a.url.cmp(&b.url))
    });
    ranked
}
