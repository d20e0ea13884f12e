#![no_main]

use libfuzzer_sys::fuzz_target;
use regwatch::variant::{canonical_variant_set, canonicalize, VariantLabel, VariantSet};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // One "Dim:value" label per line; unparseable lines are skipped
        let variants: VariantSet = input
            .lines()
            .filter_map(|line| line.parse::<VariantLabel>().ok())
            .map(|label| (label.dimension, label.value))
            .collect();

        let once = canonical_variant_set(&variants);
        assert_eq!(once, canonical_variant_set(&once));
        assert_eq!(canonicalize("fuzz", &variants), canonicalize("fuzz", &once));
    }
});
