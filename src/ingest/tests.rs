use super::*;
use crate::model::{JobOverallResult, TestStatus};
use crate::variant::{ClassifierConfig, ClassifierRule, PatternClassifier};
use chrono::{Duration, TimeZone, Utc};

fn classifier() -> PatternClassifier {
    PatternClassifier::new(&ClassifierConfig {
        rules: vec![ClassifierRule {
            dimension: "Platform".to_string(),
            value: "aws".to_string(),
            pattern: "-aws".to_string(),
            releases: Vec::new(),
        }],
        ..ClassifierConfig::default()
    })
    .unwrap()
}

fn meta(job: &str, build_id: &str, state: JobState) -> JobRunMeta {
    let start = Utc.with_ymd_and_hms(2024, 2, 21, 2, 5, 11).unwrap();
    JobRunMeta {
        build_id: build_id.to_string(),
        job: job.to_string(),
        url: format!("https://ci.example.com/{}/{}", job, build_id),
        state,
        start_time: start,
        completion_time: Some(start + Duration::minutes(90)),
    }
}

fn suite(cases: Vec<TestCase>) -> Vec<TestSuite> {
    vec![TestSuite {
        name: "openshift-tests".to_string(),
        test_cases: cases,
        children: Vec::new(),
    }]
}

fn tests_of(cases: &[(&str, TestStatus)]) -> TestCaseMap {
    cases
        .iter()
        .map(|(name, status)| {
            (
                format!("openshift-tests.{}", name),
                crate::model::RawTestOutcome::new(*name, *status),
            )
        })
        .collect()
}

#[test]
fn test_overall_result_mapping() {
    let config = IngestConfig::default();
    let none = TestCaseMap::new();
    let ordinary = tests_of(&[("a", TestStatus::Failure)]);
    let install = tests_of(&[(config.install_test.as_str(), TestStatus::Failure)]);
    let upgrade = tests_of(&[(config.upgrade_test.as_str(), TestStatus::Failure)]);

    let cases = [
        (JobState::Success, &ordinary, Some(JobOverallResult::Succeeded)),
        (JobState::Aborted, &ordinary, Some(JobOverallResult::Aborted)),
        (JobState::Error, &ordinary, Some(JobOverallResult::InfrastructureFailure)),
        (JobState::Failure, &install, Some(JobOverallResult::InstallFailure)),
        (JobState::Failure, &upgrade, Some(JobOverallResult::UpgradeFailure)),
        (JobState::Failure, &none, Some(JobOverallResult::InfrastructureFailure)),
        (JobState::Failure, &ordinary, Some(JobOverallResult::TestFailure)),
        (JobState::Pending, &ordinary, None),
        (JobState::Triggered, &ordinary, None),
    ];
    for (state, tests, expected) in cases {
        assert_eq!(overall_result(state, tests, &config), expected, "{:?}", state);
    }
}

#[test]
fn test_unfinished_runs_are_skipped() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());

    for state in [JobState::Pending, JobState::Triggered] {
        let recorded = ingester
            .ingest_run(&meta("periodic-e2e-aws", "1", state), &[], None)
            .unwrap();
        assert!(!recorded);
    }
    assert!(ingester.finish().jobs.is_empty());
}

#[test]
fn test_runs_are_recorded_once() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());
    let m = meta("periodic-e2e-aws", "1001", JobState::Success);

    assert!(ingester.ingest_run(&m, &suite(vec![TestCase::passed("a")]), None).unwrap());
    assert!(!ingester.ingest_run(&m, &suite(vec![TestCase::passed("a")]), None).unwrap());
    assert_eq!(ingester.cache().run_count(), 1);
    assert_eq!(ingester.finish().jobs[0].runs.len(), 1);
}

#[test]
fn test_previously_seen_runs_are_skipped() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut cache = config.new_cache();
    cache.mark_run(1001);

    let mut ingester = Ingester::new("4.16", &config, &classifier, cache);
    let m = meta("periodic-e2e-aws", "1001", JobState::Success);
    assert!(!ingester.ingest_run(&m, &[], None).unwrap());
}

#[test]
fn test_non_numeric_build_id_is_skipped() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());
    let m = meta("periodic-e2e-aws", "latest", JobState::Success);
    assert!(!ingester.ingest_run(&m, &[], None).unwrap());
}

#[test]
fn test_missing_job_name_is_an_error() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());
    let err = ingester
        .ingest_run(&meta("", "5", JobState::Success), &[], None)
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingJobName { .. }));
}

#[test]
fn test_run_contents() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());

    let suites = suite(vec![
        TestCase::passed("a"),
        TestCase::failed("b", "timeout"),
        TestCase::passed("b"),
        TestCase::failed("c", "boom"),
        TestCase::skipped("d", "skip"),
    ]);
    let m = meta("periodic-e2e-aws", "1001", JobState::Failure);
    assert!(ingester.ingest_run(&m, &suites, None).unwrap());

    let data = ingester.finish();
    let run = &data.jobs[0].runs[0];
    assert_eq!(run.id, 1001);
    assert_eq!(run.overall_result, JobOverallResult::TestFailure);
    assert_eq!(run.duration_secs, 5400.0);

    let status = |name: &str| run.tests.iter().find(|t| t.name == name).map(|t| t.status);
    assert_eq!(status("a"), Some(TestStatus::Success));
    assert_eq!(status("b"), Some(TestStatus::Flake));
    assert_eq!(status("c"), Some(TestStatus::Failure));
    assert_eq!(status("d"), None);
    assert_eq!(status(&config.infrastructure_test), Some(TestStatus::Success));
}

#[test]
fn test_synthetic_infrastructure_failure() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());
    let m = meta("periodic-e2e-aws", "7", JobState::Error);
    ingester.ingest_run(&m, &[], None).unwrap();

    let data = ingester.finish();
    let run = &data.jobs[0].runs[0];
    assert_eq!(run.overall_result, JobOverallResult::InfrastructureFailure);
    assert_eq!(run.tests.len(), 1);
    assert_eq!(run.tests[0].name, config.infrastructure_test);
    assert_eq!(run.tests[0].status, TestStatus::Failure);
    assert_eq!(run.tests[0].suite.as_deref(), Some("regwatch-synthetic"));
}

#[test]
fn test_variants_classified_and_merged() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let mut ingester = Ingester::new("4.16", &config, &classifier, config.new_cache());

    let cluster: crate::variant::VariantSet =
        [("Network", "ovn"), ("NetworkStack", "IPv4")].into_iter().collect();
    ingester
        .ingest_run(
            &meta("periodic-e2e-aws", "1", JobState::Success),
            &[],
            Some(&cluster),
        )
        .unwrap();
    ingester
        .ingest_run(&meta("periodic-e2e-gcp", "2", JobState::Success), &[], None)
        .unwrap();

    let data = ingester.finish();
    let names: Vec<_> = data.jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["periodic-e2e-aws", "periodic-e2e-gcp"]);

    let aws = data.jobs[0].variants.as_ref().unwrap();
    assert_eq!(aws.get("Platform"), Some("aws"));
    assert_eq!(aws.get("Network"), Some("ovn"));
    assert!(data.jobs[1].variants.as_ref().unwrap().is_empty());
}

#[test]
fn test_newest_run_cluster_data_wins_regardless_of_order() {
    let config = IngestConfig::default();
    let classifier = classifier();
    let job = "periodic-e2e-aws";
    let older = meta(job, "1", JobState::Success);
    let mut newer = meta(job, "2", JobState::Success);
    newer.start_time = older.start_time + Duration::hours(6);

    let ovn: crate::variant::VariantSet = [("Network", "ovn")].into_iter().collect();
    let sdn: crate::variant::VariantSet =
        [("Network", "sdn"), ("Topology", "single")].into_iter().collect();

    let mut forward = Ingester::new("4.16", &config, &classifier, config.new_cache());
    forward.ingest_run(&older, &[], Some(&sdn)).unwrap();
    forward.ingest_run(&newer, &[], Some(&ovn)).unwrap();

    let mut backward = Ingester::new("4.16", &config, &classifier, config.new_cache());
    backward.ingest_run(&newer, &[], Some(&ovn)).unwrap();
    backward.ingest_run(&older, &[], Some(&sdn)).unwrap();
    // the cached classification is not touched by cluster data
    assert_eq!(backward.cache().job_variants(job).unwrap().get("Network"), None);

    let forward = forward.finish();
    let backward = backward.finish();
    assert_eq!(forward.jobs[0].variants, backward.jobs[0].variants);

    let variants = forward.jobs[0].variants.as_ref().unwrap();
    assert_eq!(variants.get("Platform"), Some("aws"));
    assert_eq!(variants.get("Network"), Some("ovn"));
    // values of an older run's cluster data do not carry over
    assert_eq!(variants.get("Topology"), None);
}

#[test]
fn test_ingest_batch_uses_newest_cluster_data() {
    let batch: IngestBatch = serde_json::from_str(
        r#"{
  "runs": [
    {
      "build_id": "1626951434970861568",
      "job": "periodic-e2e-gcp-ovn-upgrade",
      "url": "https://ci.example.com/runs/1626951434970861568",
      "state": "failure",
      "start_time": "2024-02-21T02:05:11Z",
      "suites": [
        {"name": "openshift-tests", "test_cases": [
          {"name": "pods should start", "failure_output": "timed out"}
        ]}
      ],
      "cluster_data": {
        "junit/cluster-data_20230218-153052.json": {"Platform": "aws"},
        "junit/cluster-data_20230218-180228.json": {"Platform": "gcp", "ClusterVersionHistory": ["4.16"]}
      }
    },
    {
      "build_id": "1626951434970861569",
      "job": "periodic-e2e-gcp-ovn-upgrade",
      "url": "https://ci.example.com/runs/1626951434970861569",
      "state": "pending",
      "start_time": "2024-02-21T04:05:11Z"
    }
  ]
}"#,
    )
    .unwrap();

    let config = IngestConfig::default();
    let data = ingest_batch(&batch, "4.16", &config, &classifier()).unwrap();
    assert_eq!(data.jobs.len(), 1);
    let job = &data.jobs[0];
    assert_eq!(job.runs.len(), 1);
    assert_eq!(job.variants.as_ref().unwrap().get("Platform"), Some("gcp"));
    assert_eq!(job.runs[0].overall_result, JobOverallResult::TestFailure);
}

#[test]
fn test_ingest_batch_names_run_on_error() {
    let batch: IngestBatch = serde_json::from_str(
        r#"{"runs": [{
      "build_id": "42",
      "job": "periodic-e2e-aws",
      "url": "https://ci.example.com/runs/42",
      "state": "success",
      "start_time": "2024-02-21T02:05:11Z",
      "cluster_data": {"cluster-data_20230218-153052.json": ["not", "an", "object"]}
    }]}"#,
    )
    .unwrap();

    let err = ingest_batch(&batch, "4.16", &IngestConfig::default(), &classifier()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "run 42 of job periodic-e2e-aws: invalid cluster data: expected a JSON object"
    );
}
