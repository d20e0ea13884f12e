use crate::report::rollup::{TestRollup, TestSummary};
use crate::report::Report;

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn indicator_line(label: &str, rollup: &Option<TestRollup>) -> String {
    match rollup {
        Some(t) => format!(
            "  {:<16} {:>7}  ({} runs, {} failures, {} flakes)\n",
            label,
            percent(t.pass_percentage),
            t.counts.runs(),
            t.counts.failures,
            t.counts.flakes
        ),
        None => format!("  {:<16} {:>7}\n", label, "n/a"),
    }
}

fn test_list(output: &mut String, title: &str, tests: &[TestSummary]) {
    if tests.is_empty() {
        return;
    }
    output.push_str(&format!("\n{} ({}):\n", title, tests.len()));
    for t in tests {
        output.push_str(&format!(
            "  {:>7}  {:>4} failures  {:>4} flakes  {}\n",
            percent(t.pass_percentage),
            t.counts.failures,
            t.counts.flakes,
            t.name
        ));
        for url in &t.issues {
            output.push_str(&format!("           {}\n", url));
        }
    }
}

/// Human-readable summary of a report
pub fn render_text(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "=== Release {} health as of {} ===\n\n",
        report.release,
        report.timestamp.to_rfc3339()
    ));

    let indicators = &report.top_level_indicators;
    output.push_str("Top-level indicators:\n");
    output.push_str(&indicator_line("infrastructure", &indicators.infrastructure));
    output.push_str(&indicator_line("install", &indicators.install));
    output.push_str(&indicator_line("upgrade", &indicators.upgrade));
    output.push_str(&indicator_line("operator health", &indicators.operator_health));
    output.push_str(&format!(
        "  variants: {} passing, {} unstable, {} failing\n",
        indicators.variant.success, indicators.variant.unstable, indicators.variant.failing
    ));

    output.push_str(&format!(
        "\nJobs: {}  Tests: {}  Filtered tests: {}\n",
        report.by_job.len(),
        report.by_test.len(),
        report.filtered_by_test.len()
    ));
    output.push_str(&format!(
        "Frequent jobs: {}  Infrequent jobs: {}\n",
        report.frequent_jobs.len(),
        report.infrequent_jobs.len()
    ));

    if !report.by_variant.is_empty() {
        output.push_str("\nVariants:\n");
        for v in &report.by_variant {
            output.push_str(&format!(
                "  {:<32} {:>7}  {} jobs, {} failing tests\n",
                v.variant.to_string(),
                percent(v.pass_percentage),
                v.jobs.len(),
                v.failing_tests.len()
            ));
        }
    }

    if !report.failure_groups.is_empty() {
        output.push_str(&format!(
            "\nFailure clusters ({}):\n",
            report.failure_groups.len()
        ));
        for g in &report.failure_groups {
            output.push_str(&format!(
                "  {:>4} failed tests  {}  {}\n",
                g.test_failures, g.job, g.url
            ));
        }
    }

    if !report.bugs_by_failure_count.is_empty() {
        output.push_str("\nIssues by failure count:\n");
        for issue in &report.bugs_by_failure_count {
            output.push_str(&format!(
                "  {:>4} failures  {:>4} flakes  {}",
                issue.failure_count, issue.flake_count, issue.url
            ));
            if !issue.summary.is_empty() {
                output.push_str(&format!("  {}", issue.summary));
            }
            output.push('\n');
        }
    }

    test_list(
        &mut output,
        "Top failing tests with a tracked issue",
        &report.top_failing_tests_with_bug,
    );
    test_list(
        &mut output,
        "Top failing tests without a tracked issue",
        &report.top_failing_tests_without_bug,
    );

    let regressions = &report.regressions;
    if !regressions.is_empty() {
        output.push_str(&format!(
            "\nRegressions: {} triaged, {} accepted, {} untriaged\n",
            regressions.triaged.len(),
            regressions.intentional.len(),
            regressions.untriaged.len()
        ));
        for pair in &regressions.untriaged {
            output.push_str(&format!(
                "  UNTRIAGED {:>7}  {}  [{}]  {}\n",
                percent(pair.pass_percentage),
                pair.test,
                pair.key,
                pair.job
            ));
        }
    }

    if !report.analysis_warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for w in &report.analysis_warnings {
            output.push_str(&format!("  - {}\n", w));
        }
    }

    output
}
