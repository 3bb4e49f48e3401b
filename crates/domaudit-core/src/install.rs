use crate::command::{CommandRunner, JobLog};
use crate::package_manager::{resolve_version, PackageManagerKind, PackageManagerSpec};
use std::path::Path;

/// Materialize the repository's dependencies through the package-management
/// shim, requesting `{kind}@{resolved version or "latest"}`. An unknown kind
/// defaults to `npm@latest`. Returns the spec that was actually applied.
pub async fn install(
    runner: &CommandRunner,
    local_path: &Path,
    found: &PackageManagerSpec,
    log: &JobLog,
) -> Result<PackageManagerSpec, String> {
    log.record("installing dependencies...");

    let kind = match found.kind {
        PackageManagerKind::Unknown => {
            log.record("no known package manager found, defaulting to npm@latest");
            PackageManagerKind::Npm
        }
        kind => kind,
    };
    let version = resolve_version(found, log).unwrap_or_else(|| "latest".to_string());

    let request = format!("{}@{}", kind.as_str(), version);
    let output = runner
        .run("corepack", &["use", &request], Some(local_path))
        .await;
    if !output.succeeded() {
        log.record(format!("repository installation failed: {}", output.text));
        return Err(output.text);
    }

    Ok(PackageManagerSpec {
        kind,
        version_constraint: Some(version),
    })
}
