use crate::variant::VariantSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Assigns variant dimensions to a job from its name
///
/// Consulted once per job; implementations must be deterministic.
pub trait VariantClassifier {
    fn identify_variants(&self, job_name: &str, release: &str) -> VariantSet;
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier rule #{index} has an empty dimension")]
    EmptyDimension { index: usize },

    #[error("classifier rule #{index} ({dimension}={value}) has an invalid pattern: {source}")]
    InvalidPattern {
        index: usize,
        dimension: String,
        value: String,
        #[source]
        source: regex::Error,
    },
}

/// One `dimension = value when the job name matches pattern` rule
///
/// # Example TOML
/// ```toml
/// [[classifier.rule]]
/// dimension = "Platform"
/// value = "aws"
/// pattern = "-aws"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassifierRule {
    pub dimension: String,
    pub value: String,
    pub pattern: String,
    /// Restrict the rule to these releases (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub releases: Vec<String>,
}

/// Classifier configuration as it appears in the application config
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    #[serde(rename = "rule")]
    pub rules: Vec<ClassifierRule>,
    /// Value used for a dimension when no rule matched
    pub defaults: BTreeMap<String, String>,
}

#[derive(Debug)]
struct CompiledRule {
    rule: ClassifierRule,
    regex: Regex,
}

/// Regex-driven classifier: first matching rule per dimension wins
#[derive(Debug)]
pub struct PatternClassifier {
    rules: Vec<CompiledRule>,
    defaults: BTreeMap<String, String>,
}

impl PatternClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let mut rules = Vec::with_capacity(config.rules.len());
        for (index, rule) in config.rules.iter().enumerate() {
            if rule.dimension.trim().is_empty() {
                return Err(ClassifierError::EmptyDimension { index });
            }
            let regex = Regex::new(&rule.pattern).map_err(|source| {
                ClassifierError::InvalidPattern {
                    index,
                    dimension: rule.dimension.clone(),
                    value: rule.value.clone(),
                    source,
                }
            })?;
            rules.push(CompiledRule {
                rule: rule.clone(),
                regex,
            });
        }

        Ok(Self {
            rules,
            defaults: config.defaults.clone(),
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl VariantClassifier for PatternClassifier {
    fn identify_variants(&self, job_name: &str, release: &str) -> VariantSet {
        let mut variants = VariantSet::new();

        for compiled in &self.rules {
            let rule = &compiled.rule;
            if variants.contains(&rule.dimension) {
                continue;
            }
            if !rule.releases.is_empty() && !rule.releases.iter().any(|r| r == release) {
                continue;
            }
            if compiled.regex.is_match(job_name) {
                variants.insert(rule.dimension.as_str(), rule.value.as_str());
            }
        }

        for (dimension, value) in &self.defaults {
            if !variants.contains(dimension) {
                variants.insert(dimension.as_str(), value.as_str());
            }
        }

        tracing::debug!(job = job_name, release, ?variants, "classified job");
        variants
    }
}
