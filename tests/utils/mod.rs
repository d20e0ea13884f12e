// Shared fixtures for CLI integration tests
//
// Each test writes its inputs into its own TempDir and passes the paths to
// the binary.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const NOW: &str = "2024-03-01T12:00:00Z";

pub const STORAGE_TEST: &str = "[sig-storage] volumes should be provisioned";

/// Three failing runs of a bare-metal job whose suite is unset
pub const METAL_RUNS: &str = r#"{
  "jobs": [{
    "name": "periodic-e2e-metal-ipi",
    "variants": {"Platform": "metal-ipi", "Suite": ""},
    "runs": [
      {"id": 1, "job": "periodic-e2e-metal-ipi", "url": "https://ci.example.com/runs/1",
       "timestamp": "2024-03-01T09:00:00Z", "overall_result": "test_failure",
       "tests": [{"name": "[sig-storage] volumes should be provisioned", "status": "failure"},
                 {"name": "[sig-network] pods should reach the service", "status": "success"}]},
      {"id": 2, "job": "periodic-e2e-metal-ipi", "url": "https://ci.example.com/runs/2",
       "timestamp": "2024-03-01T10:00:00Z", "overall_result": "test_failure",
       "tests": [{"name": "[sig-storage] volumes should be provisioned", "status": "failure"},
                 {"name": "[sig-network] pods should reach the service", "status": "success"}]},
      {"id": 3, "job": "periodic-e2e-metal-ipi", "url": "https://ci.example.com/runs/3",
       "timestamp": "2024-03-01T11:00:00Z", "overall_result": "test_failure",
       "tests": [{"name": "[sig-storage] volumes should be provisioned", "status": "failure"},
                 {"name": "[sig-network] pods should reach the service", "status": "success"}]}
    ]
  }]
}"#;

/// Triage feed with one incident keyed under the older variant spelling
pub const METAL_TRIAGE: &str = r#"[
  {
    "release": "4.16",
    "test_id": "[sig-storage] volumes should be provisioned",
    "variants": {"Platform": "metal", "Suite": "unknown"},
    "issue_type": "Product",
    "url": "https://issues.example.com/browse/OCPBUGS-42",
    "description": "provisioner races on bare metal"
  }
]"#;

pub const CONFIG: &str = r#"
release = "4.16"

[report]
min_runs = 3
"#;

pub const REGRESSIONS: &str = r#"
[[regression]]
release = "4.16"
component = "Networking"
test_id = "openshift-tests:9f1c"
test_name = "[sig-network] pods should reach the service"
tracking_link = "https://issues.example.com/browse/OCPBUGS-1234"
justification = "dataplane rewrite; fix scheduled"

[regression.variant]
Architecture = "amd64"
FeatureSet = "default"
Installer = "ipi"
Network = "ovn"
NetworkAccess = "default"
Platform = "aws"
Scheduler = "default"
SecurityMode = "default"
Suite = "parallel"
Topology = "ha"
Upgrade = "none"

[regression.previous]
successes = 98
failures = 2

[regression.regressed]
successes = 85
failures = 15
"#;

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
