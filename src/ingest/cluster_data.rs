use crate::ingest::IngestError;
use crate::variant::VariantSet;
use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static CLUSTER_DATA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cluster-data_(\d{8}-\d{6})\.json$").expect("cluster data pattern is valid")
});

const CLUSTER_DATA_STAMP: &str = "%Y%m%d-%H%M%S";

/// Pick the `cluster-data_YYYYMMDD-HHMMSS.json` name with the newest stamp
///
/// Names without a parseable stamp are ignored.
pub fn find_most_recent_date_time_match<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    names
        .iter()
        .map(|name| name.as_ref())
        .filter_map(|name| {
            let stamp = CLUSTER_DATA_NAME.captures(name)?.get(1)?.as_str();
            let parsed = NaiveDateTime::parse_from_str(stamp, CLUSTER_DATA_STAMP).ok()?;
            Some((parsed, name))
        })
        .max_by_key(|(parsed, _)| *parsed)
        .map(|(_, name)| name)
}

/// Variants recorded in a cluster-data document; non-string values are dropped
pub fn variant_data_from_value(value: &Value) -> Result<VariantSet, IngestError> {
    let Value::Object(fields) = value else {
        return Err(IngestError::ClusterDataNotAnObject);
    };
    Ok(fields
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s)))
        .collect())
}

pub fn parse_variant_data_file(bytes: &[u8]) -> Result<VariantSet, IngestError> {
    let value: Value = serde_json::from_slice(bytes).map_err(IngestError::ClusterData)?;
    variant_data_from_value(&value)
}
