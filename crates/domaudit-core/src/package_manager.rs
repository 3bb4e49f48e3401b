use crate::command::JobLog;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The dependency-installation tools a repository can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageManagerKind {
    Npm,
    Yarn,
    Pnpm,
    Unknown,
}

impl PackageManagerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "npm",
            PackageManagerKind::Yarn => "yarn",
            PackageManagerKind::Pnpm => "pnpm",
            PackageManagerKind::Unknown => "unknown",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "npm" => Some(PackageManagerKind::Npm),
            "yarn" => Some(PackageManagerKind::Yarn),
            "pnpm" => Some(PackageManagerKind::Pnpm),
            _ => None,
        }
    }
}

/// Detected package manager plus the declared version constraint, if any.
/// Immutable once produced; version resolution happens at install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerSpec {
    pub kind: PackageManagerKind,
    pub version_constraint: Option<String>,
}

impl PackageManagerSpec {
    pub fn unknown() -> Self {
        Self {
            kind: PackageManagerKind::Unknown,
            version_constraint: None,
        }
    }
}

/// Released versions we know exist, latest or LTS at the time of authoring.
/// Range constraints resolve against this list.
fn known_versions(kind: PackageManagerKind) -> &'static [&'static str] {
    match kind {
        PackageManagerKind::Npm => &["6.14.18", "8.19.4", "10.7.0", "10.8.2"],
        PackageManagerKind::Yarn => &["1.22.22", "3.8.5", "4.4.0"],
        PackageManagerKind::Pnpm => &["8.15.9", "9.9.0"],
        PackageManagerKind::Unknown => &[],
    }
}

/// Heuristically determine the package manager declared by the repository
/// metadata. Never fails: unrecognized input degrades to `Unknown` with a
/// logged warning.
pub fn detect(metadata: &Value, log: &JobLog) -> PackageManagerSpec {
    if let Some(declaration) = metadata.get("packageManager").and_then(Value::as_str) {
        log.record(format!("found a 'packageManager' field: \"{}\"", declaration));
        let (tool, constraint) = match declaration.split_once('@') {
            Some((tool, constraint)) => (tool, Some(constraint.to_string())),
            None => (declaration, None),
        };
        return match PackageManagerKind::from_token(tool) {
            Some(kind) => PackageManagerSpec {
                kind,
                version_constraint: constraint,
            },
            None => {
                log.record(format!("found unknown package manager \"{}\"", tool));
                PackageManagerSpec::unknown()
            }
        };
    }

    if let Some(engines) = metadata.get("engines") {
        for kind in [
            PackageManagerKind::Npm,
            PackageManagerKind::Yarn,
            PackageManagerKind::Pnpm,
        ] {
            if let Some(range) = engines.get(kind.as_str()).and_then(Value::as_str) {
                return PackageManagerSpec {
                    kind,
                    version_constraint: Some(range.to_string()),
                };
            }
        }
    }

    PackageManagerSpec::unknown()
}

/// Resolve the concrete version to request from the installer.
///
/// An explicit, fully-qualified semver version passes through normalized.
/// Anything else is treated as a range and resolved to the maximum known
/// version that satisfies it; `None` when nothing satisfies, with a logged
/// warning, never an error.
pub fn resolve_version(spec: &PackageManagerSpec, log: &JobLog) -> Option<String> {
    let constraint = spec.version_constraint.as_deref()?;

    if let Ok(version) = Version::parse(constraint) {
        log.record(format!(
            "using explicit {} version \"{}\"",
            spec.kind.as_str(),
            version
        ));
        return Some(version.to_string());
    }

    let requirement = match VersionReq::parse(constraint) {
        Ok(requirement) => requirement,
        Err(_) => {
            log.record(format!(
                "could not parse {} version constraint \"{}\"",
                spec.kind.as_str(),
                constraint
            ));
            return None;
        }
    };

    let resolved = known_versions(spec.kind)
        .iter()
        .filter_map(|candidate| Version::parse(candidate).ok())
        .filter(|candidate| requirement.matches(candidate))
        .max();

    match resolved {
        Some(version) => {
            log.record(format!(
                "resolved {} version to \"{}\"",
                spec.kind.as_str(),
                version
            ));
            Some(version.to_string())
        }
        None => {
            log.record(format!(
                "could not resolve to a known {} version",
                spec.kind.as_str()
            ));
            None
        }
    }
}
