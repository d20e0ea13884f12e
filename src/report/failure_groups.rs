use crate::model::RawJob;
use crate::report::rollup::JobRunSummary;

/// Job runs with at least `threshold` failed tests, largest cluster first
///
/// A negative threshold disables clustering. Ties are broken newest first,
/// then by URL.
pub fn failure_groups(jobs: &[RawJob], threshold: i64) -> Vec<JobRunSummary> {
    let Ok(threshold) = usize::try_from(threshold) else {
        return Vec::new();
    };

    let mut groups: Vec<JobRunSummary> = jobs
        .iter()
        .flat_map(|job| job.runs.iter())
        .filter(|run| run.test_failures() >= threshold)
        .map(JobRunSummary::from)
        .collect();

    groups.sort_by(|a, b| {
        b.test_failures
            .cmp(&a.test_failures)
            .then(b.timestamp.cmp(&a.timestamp))
            .then_with(|| a.url.cmp(&b.url))
    });
    groups
}
