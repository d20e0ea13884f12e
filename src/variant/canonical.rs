use crate::variant::dimension::{
    is_triage_match_dimension, remap_value, LegacyToken, VariantLabel, DEFAULT_DIMENSIONS,
    LEGACY_VARIANT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dimension name → value describing one execution context
///
/// Backed by an ordered map so iteration, serialization and hashing are
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSet(BTreeMap<String, String>);

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: impl Into<String>, value: impl Into<String>) {
        self.0.insert(dimension.into(), value.into());
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.0.get(dimension).map(|s| s.as_str())
    }

    pub fn contains(&self, dimension: &str) -> bool {
        self.0.contains_key(dimension)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; values in `other` win
    pub fn merge(&mut self, other: &VariantSet) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    /// Whether this set carries `label.dimension = label.value`
    pub fn has_label(&self, label: &VariantLabel) -> bool {
        self.get(&label.dimension) == Some(label.value.as_str())
    }

    /// Every `(dimension, value)` pair as a label, in dimension order
    pub fn labels(&self) -> impl Iterator<Item = VariantLabel> + '_ {
        self.iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| VariantLabel::new(k, v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariantSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Stable lookup key for triage and accepted-regression records
///
/// Built only by [`canonicalize`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalTriageKey {
    test_id: String,
    variants: String,
}

impl CanonicalTriageKey {
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// Canonical `Dimension_value,...` string
    pub fn variants(&self) -> &str {
        &self.variants
    }
}

impl fmt::Display for CanonicalTriageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.test_id, self.variants)
    }
}

/// Normalize a variant set onto the triage-match dimensions
///
/// Defaults are seeded first, then legacy `Variant` tokens are translated,
/// then explicit match dimensions are applied (so an explicit dimension wins
/// over a legacy token naming the same dimension). Empty values count as
/// absent. All other dimensions are dropped.
pub fn canonical_variant_set(variants: &VariantSet) -> VariantSet {
    let mut out: VariantSet = DEFAULT_DIMENSIONS.iter().copied().collect();

    if let Some(token) = variants.get(LEGACY_VARIANT).filter(|v| !v.is_empty()) {
        match LegacyToken::parse(token).and_then(LegacyToken::modern) {
            Some((dimension, value)) if is_triage_match_dimension(dimension) => {
                out.insert(dimension, value);
            }
            _ => tracing::trace!("ignoring legacy variant token '{}'", token),
        }
    }

    for (dimension, value) in variants.iter() {
        if value.is_empty() || !is_triage_match_dimension(dimension) {
            continue;
        }
        out.insert(dimension, remap_value(dimension, value));
    }

    out
}

/// Derive the triage lookup key for `test_id` running under `variants`
///
/// Pure and total: every input, however incomplete, yields exactly one key.
///
/// # Example
/// ```
/// use regwatch::variant::{canonicalize, VariantSet};
///
/// let legacy: VariantSet = [("Platform", "metal-ipi"), ("Variant", "fips")].into_iter().collect();
/// let modern: VariantSet = [("Platform", "metal"), ("SecurityMode", "fips")].into_iter().collect();
/// assert_eq!(canonicalize("test-1", &legacy), canonicalize("test-1", &modern));
/// ```
pub fn canonicalize(test_id: &str, variants: &VariantSet) -> CanonicalTriageKey {
    let canonical = canonical_variant_set(variants);
    let rendered = canonical
        .iter()
        .map(|(k, v)| format!("{}_{}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    CanonicalTriageKey {
        test_id: test_id.to_string(),
        variants: rendered,
    }
}
