//! regwatch - CI job health reports with variant-aware triage
//!
//! This library turns raw CI job runs into per-job, per-test and per-variant
//! health rollups. Failures are matched against triaged incidents and
//! accepted regressions through a canonical key that is stable across
//! historical variant naming schemes.

pub mod cli;
pub mod config;
pub mod ingest;
pub mod issues;
pub mod model;
pub mod regression;
pub mod report;
pub mod stats;
pub mod triage;
pub mod variant;
