use crate::regression::intentional::{AdmissionError, IntentionalRegression};
use crate::variant::{canonicalize, CanonicalTriageKey, VariantSet};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

type ReleaseMap = BTreeMap<String, HashMap<CanonicalTriageKey, IntentionalRegression>>;

/// Collects admissions before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    releases: ReleaseMap,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `regression` and insert it under `(release, canonical key)`
    ///
    /// # Errors
    /// The first violated admission invariant, or [`AdmissionError::Duplicate`]
    /// when the key was already admitted for this release. Nothing is
    /// inserted on error and existing entries are never overwritten.
    pub fn admit(
        &mut self,
        release: &str,
        regression: IntentionalRegression,
    ) -> Result<(), AdmissionError> {
        regression.validate()?;

        let key = canonicalize(&regression.test_id, &regression.variant);
        let target = self.releases.entry(release.to_string()).or_default();
        if target.contains_key(&key) {
            return Err(AdmissionError::Duplicate {
                release: release.to_string(),
                test_id: regression.test_id,
                key: key.variants().to_string(),
            });
        }

        tracing::debug!(release, %key, "admitted accepted regression");
        target.insert(key, regression);
        Ok(())
    }

    pub fn build(self) -> IntentionalRegressionRegistry {
        IntentionalRegressionRegistry {
            releases: self.releases,
        }
    }
}

/// Immutable registry of accepted regressions
///
/// Built once at load time; lookups need no synchronization.
///
/// # Example Usage
/// ```no_run
/// use regwatch::regression::IntentionalRegressionRegistry;
/// use regwatch::variant::VariantSet;
///
/// let registry = IntentionalRegressionRegistry::from_toml("regressions.toml")?;
/// let accepted = registry.lookup("4.16", &VariantSet::new(), "openshift-tests:9f1c");
/// println!("accepted: {}", accepted.is_some());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct IntentionalRegressionRegistry {
    releases: ReleaseMap,
}

#[derive(Debug, Deserialize)]
struct RegressionEntry {
    release: String,
    #[serde(flatten)]
    regression: IntentionalRegression,
}

#[derive(Debug, Deserialize)]
struct RegressionFile {
    #[serde(default)]
    regression: Vec<RegressionEntry>,
}

impl IntentionalRegressionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// An empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Admit every `(release, regression)` pair, failing on the first bad one
    pub fn from_entries<I>(entries: I) -> Result<Self, AdmissionError>
    where
        I: IntoIterator<Item = (String, IntentionalRegression)>,
    {
        let mut builder = RegistryBuilder::new();
        for (release, regression) in entries {
            builder.admit(&release, regression)?;
        }
        Ok(builder.build())
    }

    /// Load accepted regressions from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or any entry
    /// violates an admission invariant. A partially valid file is refused as
    /// a whole.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read accepted regressions file: {}",
                path.as_ref().display()
            )
        })?;
        Self::from_toml_str(&content).with_context(|| {
            format!(
                "Invalid accepted regressions file: {}",
                path.as_ref().display()
            )
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegressionFile =
            toml::from_str(content).context("Failed to parse TOML accepted regressions")?;

        let mut builder = RegistryBuilder::new();
        for (index, entry) in file.regression.into_iter().enumerate() {
            let test_id = entry.regression.test_id.clone();
            builder
                .admit(&entry.release, entry.regression)
                .with_context(|| {
                    format!(
                        "accepted regression #{} (test '{}', release {}) rejected",
                        index, test_id, entry.release
                    )
                })?;
        }

        let registry = builder.build();
        tracing::info!(entries = registry.len(), "loaded accepted regressions");
        Ok(registry)
    }

    /// Accepted regression for `test_id` under `variants` in `release`
    pub fn lookup(
        &self,
        release: &str,
        variants: &VariantSet,
        test_id: &str,
    ) -> Option<&IntentionalRegression> {
        self.lookup_key(release, &canonicalize(test_id, variants))
    }

    pub fn lookup_key(
        &self,
        release: &str,
        key: &CanonicalTriageKey,
    ) -> Option<&IntentionalRegression> {
        let found = self.releases.get(release)?.get(key);
        if let Some(regression) = found {
            tracing::debug!(release, %key, tracking_link = %regression.tracking_link, "found accepted regression");
        }
        found
    }

    pub fn len(&self) -> usize {
        self.releases.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn releases(&self) -> impl Iterator<Item = &str> {
        self.releases.keys().map(String::as_str)
    }
}
