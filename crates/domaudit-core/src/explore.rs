use crate::command::JobLog;
use serde_json::Value;
use std::path::Path;

/// Parsed repository metadata, read from the root `package.json`.
#[derive(Debug, Clone)]
pub struct RepositoryMetadata {
    pub manifest: Value,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Read and parse the repository's root metadata file. Unreadable or
/// unparseable metadata is the explore-stage failure.
pub fn explore(local_path: &Path, log: &JobLog) -> Result<RepositoryMetadata, String> {
    log.record("exploring repository...");
    let manifest_path = local_path.join("package.json");
    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|error| format!("could not read {}: {}", manifest_path.display(), error))?;
    let manifest: Value = serde_json::from_str(&content)
        .map_err(|error| format!("could not parse {}: {}", manifest_path.display(), error))?;

    let name = manifest
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);
    let version = manifest
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(RepositoryMetadata {
        manifest,
        name,
        version,
    })
}
