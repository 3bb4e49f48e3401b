use crate::package_manager::{PackageManagerKind, PackageManagerSpec};
use prost::Message;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Binary schema for persisted records. Field tags are versioned and must
// never be reused for a different meaning; retired tags stay unassigned
// (see `RepositoryRecord` tag 2).

/// One canonicalized finding. Positions pass through from the checker and
/// round-trip exactly.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Violation {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub rule_id: String,
    #[prost(string, tag = "3")]
    pub file_path: String,
    #[prost(int32, tag = "4")]
    pub line: i32,
    #[prost(int32, tag = "5")]
    pub column: i32,
    #[prost(int32, tag = "6")]
    pub end_line: i32,
    #[prost(int32, tag = "7")]
    pub end_column: i32,
    /// Empty unless the finding was suppressed in source.
    #[prost(string, tag = "8")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub justification: String,
    /// Clickable `file://{path}:{line}:{column}` location.
    #[prost(string, tag = "9")]
    pub link: String,
}

/// Aggregation of one checker run over one repository: four disjoint
/// violation buckets in file-then-message encounter order, mirrored counts,
/// and the run's raw warning/error totals.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    #[prost(string, tag = "1")]
    pub root_dir: String,
    #[prost(message, repeated, tag = "2")]
    pub own_violations: Vec<Violation>,
    #[prost(message, repeated, tag = "3")]
    pub own_silenced_violations: Vec<Violation>,
    #[prost(message, repeated, tag = "4")]
    pub other_violations: Vec<Violation>,
    #[prost(message, repeated, tag = "5")]
    pub other_silenced_violations: Vec<Violation>,
    #[prost(int32, tag = "6")]
    pub own_violation_count: i32,
    #[prost(int32, tag = "7")]
    pub own_silenced_violation_count: i32,
    #[prost(int32, tag = "8")]
    pub other_violation_count: i32,
    #[prost(int32, tag = "9")]
    pub other_silenced_violation_count: i32,
    #[prost(int32, tag = "10")]
    pub warnings: i32,
    #[prost(int32, tag = "11")]
    pub errors: i32,
}

/// Report for one analyzed package, currently the repository root.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageReport {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub relative_path: String,
    #[prost(string, tag = "3")]
    pub version: String,
    #[prost(message, optional, tag = "4")]
    pub summary: Option<Summary>,
    #[prost(string, tag = "5")]
    pub outcome: String,
}

/// Package manager kind and version as recorded on the persisted report.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManagerRecord {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(string, tag = "2")]
    pub version: String,
}

impl PackageManagerRecord {
    pub fn from_spec(spec: &PackageManagerSpec) -> Self {
        Self {
            kind: match spec.kind {
                PackageManagerKind::Unknown => String::new(),
                kind => kind.as_str().to_string(),
            },
            version: spec.version_constraint.clone().unwrap_or_default(),
        }
    }
}

/// The persisted, immutable report for one analyzed repository.
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryRecord {
    #[prost(string, tag = "1")]
    pub url: String,
    // tag 2 retired in an earlier schema revision
    #[prost(message, optional, tag = "3")]
    pub package_manager_found: Option<PackageManagerRecord>,
    #[prost(message, optional, tag = "4")]
    pub package_manager_used: Option<PackageManagerRecord>,
    #[prost(message, repeated, tag = "5")]
    pub packages: Vec<PackageReport>,
    #[prost(string, tag = "6")]
    pub logs: String,
    /// Name of the first failing stage, empty on success.
    #[prost(string, tag = "7")]
    pub step_failure: String,
}

impl RepositoryRecord {
    pub fn encode_record(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn decode_record(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }

    /// Write the binary form to `{output_dir}/{clone_dir_name}.pb`.
    pub fn write_to(&self, output_dir: &Path, clone_dir_name: &str) -> std::io::Result<PathBuf> {
        let path = output_dir.join(format!("{}.pb", clone_dir_name));
        std::fs::write(&path, self.encode_to_vec())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RepositoryRecord {
        let violation = Violation {
            message: "[ban-eval-calls] Do not use eval".to_string(),
            rule_id: "domaudit/dom-sink-checks".to_string(),
            file_path: "src/app.ts".to_string(),
            line: 3,
            column: 7,
            end_line: 3,
            end_column: 11,
            justification: String::new(),
            link: "file://src/app.ts:3:7".to_string(),
        };
        let summary = Summary {
            root_dir: "/tmp/1-foo:bar".to_string(),
            own_violations: vec![violation.clone()],
            own_silenced_violations: vec![Violation {
                justification: "legacy".to_string(),
                ..violation.clone()
            }],
            other_violations: vec![Violation {
                rule_id: "parse-error".to_string(),
                ..violation
            }],
            other_silenced_violations: vec![],
            own_violation_count: 1,
            own_silenced_violation_count: 1,
            other_violation_count: 1,
            other_silenced_violation_count: 0,
            warnings: 2,
            errors: 1,
        };
        RepositoryRecord {
            url: "https://github.com/foo/bar".to_string(),
            package_manager_found: Some(PackageManagerRecord {
                kind: "yarn".to_string(),
                version: "^3.0.0".to_string(),
            }),
            package_manager_used: Some(PackageManagerRecord {
                kind: "yarn".to_string(),
                version: "3.8.5".to_string(),
            }),
            packages: vec![PackageReport {
                name: "bar".to_string(),
                relative_path: "./".to_string(),
                version: "1.0.0".to_string(),
                summary: Some(summary),
                outcome: "SUCCESS".to_string(),
            }],
            logs: "exploring repository...\ninstalling dependencies...".to_string(),
            step_failure: String::new(),
        }
    }

    #[test]
    fn record_round_trips_through_binary_form() {
        let record = sample_record();
        let bytes = record.encode_record();
        let decoded = RepositoryRecord::decode_record(&bytes).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn minimal_failed_record_round_trips() {
        let record = RepositoryRecord {
            url: "https://example.com/repo".to_string(),
            logs: "failed to clone".to_string(),
            step_failure: "clone".to_string(),
            ..Default::default()
        };
        let decoded = RepositoryRecord::decode_record(&record.encode_record()).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn writes_record_named_after_clone_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let record = sample_record();
        let path = record.write_to(tmp.path(), "1-foo:bar").unwrap();
        assert!(path.ends_with("1-foo:bar.pb"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(RepositoryRecord::decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn unknown_package_manager_records_empty_kind() {
        let record = PackageManagerRecord::from_spec(&PackageManagerSpec::unknown());
        assert_eq!(record.kind, "");
        assert_eq!(record.version, "");
    }
}
