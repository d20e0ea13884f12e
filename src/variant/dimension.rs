use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLATFORM: &str = "Platform";
pub const ARCHITECTURE: &str = "Architecture";
pub const NETWORK: &str = "Network";
pub const TOPOLOGY: &str = "Topology";
pub const FEATURE_SET: &str = "FeatureSet";
pub const UPGRADE: &str = "Upgrade";
pub const SUITE: &str = "Suite";
pub const INSTALLER: &str = "Installer";
pub const NETWORK_ACCESS: &str = "NetworkAccess";
pub const SECURITY_MODE: &str = "SecurityMode";
pub const SCHEDULER: &str = "Scheduler";

/// Legacy catch-all dimension whose value encodes one of the modern dimensions
pub const LEGACY_VARIANT: &str = "Variant";

/// Dimensions that survive canonicalization, in key order
pub const TRIAGE_MATCH_DIMENSIONS: &[&str] = &[
    ARCHITECTURE,
    FEATURE_SET,
    INSTALLER,
    NETWORK,
    NETWORK_ACCESS,
    PLATFORM,
    SCHEDULER,
    SECURITY_MODE,
    SUITE,
    TOPOLOGY,
    UPGRADE,
];

/// Defaults for dimensions that older records commonly omit
pub const DEFAULT_DIMENSIONS: &[(&str, &str)] = &[
    (SUITE, "unknown"),
    (TOPOLOGY, "ha"),
    (FEATURE_SET, "default"),
    (INSTALLER, "ipi"),
];

pub fn is_triage_match_dimension(name: &str) -> bool {
    TRIAGE_MATCH_DIMENSIONS.contains(&name)
}

/// Historical values of the legacy `Variant` dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyToken {
    Proxy,
    Fips,
    Realtime,
    Serial,
    /// Used as a placeholder for "nothing special"; deliberately unmapped
    Standard,
}

impl LegacyToken {
    pub const ALL: &'static [LegacyToken] = &[
        LegacyToken::Proxy,
        LegacyToken::Fips,
        LegacyToken::Realtime,
        LegacyToken::Serial,
        LegacyToken::Standard,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "proxy" => Some(LegacyToken::Proxy),
            "fips" => Some(LegacyToken::Fips),
            "rt" => Some(LegacyToken::Realtime),
            "serial" => Some(LegacyToken::Serial),
            "standard" => Some(LegacyToken::Standard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LegacyToken::Proxy => "proxy",
            LegacyToken::Fips => "fips",
            LegacyToken::Realtime => "rt",
            LegacyToken::Serial => "serial",
            LegacyToken::Standard => "standard",
        }
    }

    /// Modern `(dimension, value)` this token stands for, if any
    pub fn modern(self) -> Option<(&'static str, &'static str)> {
        match self {
            LegacyToken::Proxy => Some((NETWORK_ACCESS, "proxy")),
            LegacyToken::Fips => Some((SECURITY_MODE, "fips")),
            LegacyToken::Realtime => Some((SCHEDULER, "realtime")),
            LegacyToken::Serial => Some((SUITE, "serial")),
            LegacyToken::Standard => None,
        }
    }
}

/// Rewrite values whose spelling changed between naming schemes
pub fn remap_value<'a>(dimension: &str, value: &'a str) -> &'a str {
    match (dimension, value) {
        (UPGRADE, "upgrade-minor") => "minor",
        (UPGRADE, "upgrade-micro") => "micro",
        (UPGRADE, "no-upgrade") => "none",
        (PLATFORM, "metal-ipi") => "metal",
        _ => value,
    }
}

/// A single `Dimension:value` pair naming a variant of jobs
///
/// ```
/// use regwatch::variant::VariantLabel;
///
/// let label: VariantLabel = "JobTier:promote".parse().unwrap();
/// assert_eq!(label.dimension, "JobTier");
/// assert_eq!(label.to_string(), "JobTier:promote");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantLabel {
    pub dimension: String,
    pub value: String,
}

impl VariantLabel {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for VariantLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dimension, self.value)
    }
}

impl FromStr for VariantLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((dimension, value)) = s.split_once(':') else {
            return Err(format!(
                "invalid variant label '{}': expected DIMENSION:VALUE",
                s
            ));
        };
        let (dimension, value) = (dimension.trim(), value.trim());
        if dimension.is_empty() || value.is_empty() {
            return Err(format!(
                "invalid variant label '{}': dimension and value must be non-empty",
                s
            ));
        }
        Ok(Self::new(dimension, value))
    }
}

impl TryFrom<String> for VariantLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VariantLabel> for String {
    fn from(label: VariantLabel) -> Self {
        label.to_string()
    }
}
