//! Triage registry: known, externally tracked issues per canonical key
//!
//! Populated once from the triage feed and read-only afterwards.

use crate::variant::{canonicalize, CanonicalTriageKey, VariantSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageIssueType {
    Infrastructure,
    Product,
    Test,
}

/// One triaged, externally tracked issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriagedIncident {
    pub issue_type: TriageIssueType,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Job runs the triager attached as evidence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_runs: Vec<String>,
}

/// Incidents of one release, keyed by canonical test/variant key
#[derive(Debug, Clone, Default)]
pub struct TriagedIncidentsForRelease {
    pub release: String,
    incidents: HashMap<CanonicalTriageKey, Vec<TriagedIncident>>,
}

impl TriagedIncidentsForRelease {
    pub fn new(release: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            incidents: HashMap::new(),
        }
    }

    /// Append an incident; incidents under one key keep insertion order
    pub fn add(&mut self, key: CanonicalTriageKey, incident: TriagedIncident) {
        self.incidents.entry(key).or_default().push(incident);
    }

    pub fn get(&self, key: &CanonicalTriageKey) -> Option<&[TriagedIncident]> {
        self.incidents.get(key).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

/// Feed entry as it appears in the triage JSON file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriageRecord {
    pub release: String,
    pub test_id: String,
    #[serde(default)]
    pub variants: VariantSet,
    #[serde(flatten)]
    pub incident: TriagedIncident,
}

/// All triaged incidents, by release
#[derive(Debug, Clone, Default)]
pub struct TriageRegistry {
    releases: BTreeMap<String, TriagedIncidentsForRelease>,
}

impl TriageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from feed records, canonicalizing each record's variants
    pub fn from_records(records: impl IntoIterator<Item = TriageRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.insert(&record.release, &record.test_id, &record.variants, record.incident);
        }
        registry
    }

    /// Load a JSON array of [`TriageRecord`]s
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read triage file: {}", path.as_ref().display())
        })?;
        let records: Vec<TriageRecord> = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse triage records: {}", path.as_ref().display())
        })?;
        let count = records.len();
        let registry = Self::from_records(records);
        tracing::info!(
            records = count,
            releases = registry.releases.len(),
            "loaded triage registry"
        );
        Ok(registry)
    }

    pub fn insert(
        &mut self,
        release: &str,
        test_id: &str,
        variants: &VariantSet,
        incident: TriagedIncident,
    ) {
        let key = canonicalize(test_id, variants);
        self.releases
            .entry(release.to_string())
            .or_insert_with(|| TriagedIncidentsForRelease::new(release))
            .add(key, incident);
    }

    pub fn for_release(&self, release: &str) -> Option<&TriagedIncidentsForRelease> {
        self.releases.get(release)
    }

    /// Incidents recorded for `key` in `release`; a miss is `None`, not an error
    pub fn lookup(&self, release: &str, key: &CanonicalTriageKey) -> Option<&[TriagedIncident]> {
        self.releases.get(release)?.get(key)
    }
}
