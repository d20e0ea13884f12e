// Variant canonicalization
//
// Test execution contexts are described by free-form dimension maps whose
// naming has changed over time: a legacy catch-all `Variant` dimension carried
// tokens such as "fips" or "rt", platform and upgrade values were renamed, and
// older records omit dimensions that newer ones always set. Triage records and
// accepted regressions are keyed by whatever spelling was current when a human
// entered them, so every lookup goes through one canonical form.
//
// The canonical form keeps only the triage-match dimensions, translates legacy
// tokens through a closed table, rewrites renamed values, seeds defaults for
// commonly-omitted dimensions and serializes in dimension order.

mod canonical;
mod classifier;
pub mod dimension;

pub use canonical::{canonical_variant_set, canonicalize, CanonicalTriageKey, VariantSet};
pub use classifier::{
    ClassifierConfig, ClassifierError, ClassifierRule, PatternClassifier, VariantClassifier,
};
pub use dimension::{LegacyToken, VariantLabel, TRIAGE_MATCH_DIMENSIONS};

#[cfg(test)]
mod tests;
