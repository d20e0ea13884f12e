//! Tracked-issue lookups
//!
//! The aggregator attributes test failures to tracked defects through the
//! [`IssueLookup`] trait. The binary uses [`StaticIssueIndex`], a snapshot of
//! the issue tracker loaded from JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A tracked defect and the failures attributed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIssue {
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub flake_count: u64,
}

impl TrackedIssue {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            summary: String::new(),
            failure_count: 0,
            flake_count: 0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueLookupError {
    #[error("issue lookup for test '{test_id}' failed: {reason}")]
    Unavailable { test_id: String, reason: String },
}

/// Finds the tracked issues associated with a test
pub trait IssueLookup {
    /// Issues in tracker order; an unknown test yields an empty list
    fn find_issues_for_test(&self, test_id: &str) -> Result<Vec<TrackedIssue>, IssueLookupError>;
}

/// Issue lookup backed by an in-memory test → issues map
#[derive(Debug, Clone, Default)]
pub struct StaticIssueIndex {
    by_test: HashMap<String, Vec<TrackedIssue>>,
}

impl StaticIssueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, test_id: impl Into<String>, issue: TrackedIssue) {
        self.by_test.entry(test_id.into()).or_default().push(issue);
    }

    /// Load a JSON object mapping test ids to issue lists
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read issues file: {}", path.as_ref().display())
        })?;
        let by_test: HashMap<String, Vec<TrackedIssue>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse issues file: {}", path.as_ref().display()))?;
        tracing::info!(tests = by_test.len(), "loaded tracked issue index");
        Ok(Self { by_test })
    }
}

impl IssueLookup for StaticIssueIndex {
    fn find_issues_for_test(&self, test_id: &str) -> Result<Vec<TrackedIssue>, IssueLookupError> {
        Ok(self.by_test.get(test_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_unknown_test_has_no_issues() {
        let index = StaticIssueIndex::new();
        assert!(index.find_issues_for_test("nope").unwrap().is_empty());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut index = StaticIssueIndex::new();
        index.insert("t", TrackedIssue::new("https://issues.example.com/2"));
        index.insert("t", TrackedIssue::new("https://issues.example.com/1"));
        let urls: Vec<_> = index
            .find_issues_for_test("t")
            .unwrap()
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert_eq!(
            urls,
            vec!["https://issues.example.com/2", "https://issues.example.com/1"]
        );
    }

    #[test]
    fn test_from_json() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"{{"[sig-network] pods should reach service": [{{"url": "https://issues.example.com/9", "summary": "dns timeouts"}}]}}"#
        )?;
        file.flush()?;

        let index = StaticIssueIndex::from_json(file.path())?;
        let issues = index.find_issues_for_test("[sig-network] pods should reach service")?;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].summary, "dns timeouts");
        assert_eq!(issues[0].failure_count, 0);
        Ok(())
    }
}
