// Canonicalization equivalence tests
//
// Every remap rule, legacy token and default gets its own case: a silent
// change to any of them turns a triaged failure back into an "unknown"
// regression.

use super::dimension::*;
use super::*;
use proptest::prelude::*;

fn set(pairs: &[(&str, &str)]) -> VariantSet {
    pairs.iter().copied().collect()
}

fn key(pairs: &[(&str, &str)]) -> CanonicalTriageKey {
    canonicalize("test-id", &set(pairs))
}

#[test]
fn test_empty_set_yields_defaults_only() {
    let k = key(&[]);
    assert_eq!(k.test_id(), "test-id");
    assert_eq!(
        k.variants(),
        "FeatureSet_default,Installer_ipi,Suite_unknown,Topology_ha"
    );
}

#[test]
fn test_key_is_sorted_dimension_value_pairs() {
    let k = key(&[
        (UPGRADE, "none"),
        (ARCHITECTURE, "amd64"),
        (PLATFORM, "aws"),
        (NETWORK, "ovn"),
    ]);
    assert_eq!(
        k.variants(),
        "Architecture_amd64,FeatureSet_default,Installer_ipi,Network_ovn,\
         Platform_aws,Suite_unknown,Topology_ha,Upgrade_none"
    );
}

#[test]
fn test_defaults_equal_explicit_values() {
    let omitted = key(&[(PLATFORM, "gcp")]);
    let explicit = key(&[
        (PLATFORM, "gcp"),
        (SUITE, "unknown"),
        (TOPOLOGY, "ha"),
        (FEATURE_SET, "default"),
        (INSTALLER, "ipi"),
    ]);
    assert_eq!(omitted, explicit);
}

#[test]
fn test_explicit_values_override_defaults() {
    let k = key(&[
        (SUITE, "parallel"),
        (TOPOLOGY, "single"),
        (FEATURE_SET, "techpreview"),
        (INSTALLER, "upi"),
    ]);
    assert_eq!(
        k.variants(),
        "FeatureSet_techpreview,Installer_upi,Suite_parallel,Topology_single"
    );
}

#[test]
fn test_empty_value_counts_as_absent() {
    assert_eq!(key(&[(SUITE, "")]), key(&[(SUITE, "unknown")]));
    assert_eq!(key(&[(PLATFORM, "")]), key(&[]));
}

#[test]
fn test_unknown_dimensions_dropped() {
    assert_eq!(
        key(&[(PLATFORM, "aws"), ("CloudRegion", "us-east-1"), ("Owner", "eng")]),
        key(&[(PLATFORM, "aws")])
    );
}

#[test]
fn test_upgrade_value_remaps() {
    assert_eq!(key(&[(UPGRADE, "upgrade-minor")]), key(&[(UPGRADE, "minor")]));
    assert_eq!(key(&[(UPGRADE, "upgrade-micro")]), key(&[(UPGRADE, "micro")]));
    assert_eq!(key(&[(UPGRADE, "no-upgrade")]), key(&[(UPGRADE, "none")]));
    assert_ne!(key(&[(UPGRADE, "minor")]), key(&[(UPGRADE, "micro")]));
}

#[test]
fn test_platform_value_remap() {
    assert_eq!(key(&[(PLATFORM, "metal-ipi")]), key(&[(PLATFORM, "metal")]));
    // only the platform dimension is remapped
    assert_ne!(key(&[(NETWORK, "metal-ipi")]), key(&[(NETWORK, "metal")]));
}

#[test]
fn test_unmapped_values_pass_through() {
    assert!(key(&[(UPGRADE, "multi")])
        .variants()
        .contains("Upgrade_multi"));
    assert!(key(&[(PLATFORM, "metal-upi")])
        .variants()
        .contains("Platform_metal-upi"));
}

#[test]
fn test_legacy_proxy_token() {
    assert_eq!(
        key(&[(LEGACY_VARIANT, "proxy")]),
        key(&[(NETWORK_ACCESS, "proxy")])
    );
}

#[test]
fn test_legacy_fips_token() {
    assert_eq!(
        key(&[(LEGACY_VARIANT, "fips")]),
        key(&[(SECURITY_MODE, "fips")])
    );
}

#[test]
fn test_legacy_rt_token() {
    assert_eq!(
        key(&[(LEGACY_VARIANT, "rt")]),
        key(&[(SCHEDULER, "realtime")])
    );
}

#[test]
fn test_legacy_serial_token() {
    assert_eq!(
        key(&[(LEGACY_VARIANT, "serial")]),
        key(&[(SUITE, "serial")])
    );
}

#[test]
fn test_legacy_standard_token_is_ignored() {
    assert_eq!(key(&[(LEGACY_VARIANT, "standard")]), key(&[]));
}

#[test]
fn test_unknown_legacy_token_is_dropped() {
    assert_eq!(key(&[(LEGACY_VARIANT, "techpreview")]), key(&[]));
}

#[test]
fn test_every_legacy_token_is_covered() {
    for token in LegacyToken::ALL {
        let legacy = key(&[(LEGACY_VARIANT, token.as_str())]);
        match token.modern() {
            Some((dimension, value)) => {
                assert!(is_triage_match_dimension(dimension));
                assert_eq!(legacy, key(&[(dimension, value)]), "token {:?}", token);
            }
            None => assert_eq!(legacy, key(&[]), "token {:?}", token),
        }
    }
}

#[test]
fn test_explicit_dimension_beats_legacy_token() {
    assert_eq!(
        key(&[(LEGACY_VARIANT, "serial"), (SUITE, "parallel")]),
        key(&[(SUITE, "parallel")])
    );
}

#[test]
fn test_legacy_and_renamed_values_together() {
    let legacy = key(&[
        (PLATFORM, "metal-ipi"),
        (UPGRADE, "upgrade-micro"),
        (LEGACY_VARIANT, "rt"),
        ("Release", "4.16"),
    ]);
    let modern = key(&[
        (PLATFORM, "metal"),
        (UPGRADE, "micro"),
        (SCHEDULER, "realtime"),
        (SUITE, "unknown"),
    ]);
    assert_eq!(legacy, modern);
}

#[test]
fn test_test_id_participates_in_key() {
    let variants = set(&[(PLATFORM, "aws")]);
    assert_ne!(canonicalize("a", &variants), canonicalize("b", &variants));
}

fn dimension_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(TRIAGE_MATCH_DIMENSIONS.to_vec()).prop_map(String::from),
        Just(LEGACY_VARIANT.to_string()),
        "[A-Z][a-z]{2,8}",
    ]
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "metal-ipi",
            "upgrade-minor",
            "upgrade-micro",
            "no-upgrade",
            "fips",
            "proxy",
            "rt",
            "serial",
            "standard",
            "",
        ])
        .prop_map(String::from),
        "[a-z0-9-]{1,10}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_canonicalize_order_independent(
        pairs in prop::collection::btree_map(dimension_strategy(), value_strategy(), 0..10)
            .prop_map(|m| m.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let forward: VariantSet = pairs.iter().cloned().collect();
        let reversed: VariantSet = pairs.iter().rev().cloned().collect();
        prop_assert_eq!(canonicalize("t", &forward), canonicalize("t", &reversed));
    }

    #[test]
    fn prop_canonicalize_idempotent(
        pairs in prop::collection::btree_map(dimension_strategy(), value_strategy(), 0..10)
    ) {
        let variants: VariantSet = pairs.into_iter().collect();
        let once = canonical_variant_set(&variants);
        let twice = canonical_variant_set(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(canonicalize("t", &variants), canonicalize("t", &once));
    }

    #[test]
    fn prop_canonical_set_only_has_match_dimensions(
        pairs in prop::collection::btree_map(dimension_strategy(), value_strategy(), 0..10)
    ) {
        let variants: VariantSet = pairs.into_iter().collect();
        let canonical = canonical_variant_set(&variants);
        for (dimension, value) in canonical.iter() {
            prop_assert!(is_triage_match_dimension(dimension));
            prop_assert!(!value.is_empty());
        }
    }
}
