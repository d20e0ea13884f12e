// Thresholds and knobs for report generation
//
// Every threshold the aggregator applies lives here so a report can be
// reproduced from its inputs plus this configuration.

use crate::variant::VariantLabel;
use serde::{Deserialize, Serialize};

/// Configuration for one aggregation pass
///
/// # Example
/// ```
/// use regwatch::report::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.min_runs, 7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Minimum runs of a test in a job before the pair counts toward
    /// filtered views
    pub min_runs: u64,

    /// Pairs passing at or above this fraction are "not interesting" and
    /// dropped from filtered views (still counted in raw totals)
    pub success_threshold: f64,

    /// Strict mode: count flakes as failures in every percentage
    pub flake_as_failure: bool,

    /// Job runs with at least this many failed tests are reported as failure
    /// clusters; negative disables clustering
    pub failure_cluster_threshold: i64,

    /// Length of the curated top failing test lists
    pub top_n: usize,

    /// A promotion job whose latest run is older than this is stale
    pub promotion_freshness_hours: i64,

    /// Jobs carrying this variant gate promotion
    pub promotion_variant: VariantLabel,

    /// Jobs carrying this variant are excluded from top-level indicators
    pub never_stable_variant: VariantLabel,

    /// Variant job pass percentage at or above which the variant is healthy
    pub variant_success_threshold: f64,

    /// Variant job pass percentage at or above which the variant is unstable
    /// (below it the variant is failing)
    pub variant_unstable_threshold: f64,

    /// Days of history a job must average one run per day over to count
    /// as frequent
    pub frequency_window_days: i64,

    /// Minimum runs of a test in an infrequent job before it is listed in
    /// the infrequent job view
    pub infrequent_min_runs: u64,

    pub indicator_tests: IndicatorTests,
}

/// Test names backing the top-level indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorTests {
    pub infrastructure: String,
    pub install: String,
    pub upgrade: String,
    pub operator_health: String,
}

impl Default for IndicatorTests {
    fn default() -> Self {
        Self {
            infrastructure: "[sig-ci] job infrastructure should work".to_string(),
            install: "[sig-ci] cluster install should succeed".to_string(),
            upgrade: "[sig-ci] cluster upgrade should succeed".to_string(),
            operator_health: "[sig-ci] operators should be healthy at the end of the run"
                .to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_runs: 7,
            success_threshold: 0.98,
            flake_as_failure: false,
            failure_cluster_threshold: 10,
            top_n: 50,
            promotion_freshness_hours: 12,
            promotion_variant: VariantLabel::new("JobTier", "promote"),
            never_stable_variant: VariantLabel::new("JobTier", "never-stable"),
            variant_success_threshold: 0.8,
            variant_unstable_threshold: 0.6,
            frequency_window_days: 7,
            infrequent_min_runs: 2,
            indicator_tests: IndicatorTests::default(),
        }
    }
}

impl ReportConfig {
    /// Strict configuration: flakes are failures and fewer runs are needed
    /// before a test shows up
    pub fn strict() -> Self {
        Self {
            min_runs: 3,
            success_threshold: 0.995,
            flake_as_failure: true,
            failure_cluster_threshold: 5,
            ..Self::default()
        }
    }

    /// Permissive configuration: only clearly broken tests show up
    pub fn permissive() -> Self {
        Self {
            min_runs: 10,
            success_threshold: 0.9,
            flake_as_failure: false,
            failure_cluster_threshold: -1,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(format!(
                "success_threshold must be in [0, 1], got {}",
                self.success_threshold
            ));
        }

        if self.min_runs == 0 {
            return Err("min_runs must be >= 1, got 0".to_string());
        }

        if self.promotion_freshness_hours <= 0 {
            return Err(format!(
                "promotion_freshness_hours must be positive, got {}",
                self.promotion_freshness_hours
            ));
        }

        if self.frequency_window_days <= 0 {
            return Err(format!(
                "frequency_window_days must be positive, got {}",
                self.frequency_window_days
            ));
        }

        if self.infrequent_min_runs == 0 {
            return Err("infrequent_min_runs must be >= 1, got 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.variant_success_threshold)
            || !(0.0..=1.0).contains(&self.variant_unstable_threshold)
        {
            return Err(format!(
                "variant thresholds must be in [0, 1], got {} / {}",
                self.variant_success_threshold, self.variant_unstable_threshold
            ));
        }

        if self.variant_unstable_threshold > self.variant_success_threshold {
            return Err(format!(
                "variant_unstable_threshold ({}) must not exceed variant_success_threshold ({})",
                self.variant_unstable_threshold, self.variant_success_threshold
            ));
        }

        Ok(())
    }
}
