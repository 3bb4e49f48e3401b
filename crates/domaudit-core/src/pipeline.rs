use crate::checker::Checker;
use crate::clone::Cloner;
use crate::command::{CommandRunner, JobLog, DEFAULT_COMMAND_TIMEOUT};
use crate::explore::explore;
use crate::install::install;
use crate::package_manager::detect;
use crate::record::{PackageManagerRecord, PackageReport, RepositoryRecord};
use crate::worker::run_isolated;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default upper bound for one isolated check run.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(900);

/// Pipeline stages, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clone,
    Explore,
    Install,
    Check,
    Serialize,
}

impl Stage {
    /// The `step_failure` string recorded on a failed job.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clone => "clone",
            Stage::Explore => "explore",
            Stage::Install => "install",
            Stage::Check => "check",
            Stage::Serialize => "serialize",
        }
    }
}

/// A stage failure for one repository. Recovered locally by the
/// orchestrator: logged, recorded on the job, never fatal to the batch.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("clone failed: {0}")]
    Clone(String),
    #[error("explore failed: {0}")]
    Explore(String),
    #[error("install failed: {0}")]
    Install(String),
    #[error("check failed: {0}")]
    Check(String),
    #[error("failed to serialize record: {0}")]
    Serialize(String),
}

impl StageFailure {
    pub fn stage(&self) -> Stage {
        match self {
            StageFailure::Clone(_) => Stage::Clone,
            StageFailure::Explore(_) => Stage::Explore,
            StageFailure::Install(_) => Stage::Install,
            StageFailure::Check(_) => Stage::Check,
            StageFailure::Serialize(_) => Stage::Serialize,
        }
    }
}

/// Inputs for one batch run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub repositories: Vec<String>,
    pub clone_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clean: bool,
}

/// Result of one batch run, records in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub records: Vec<RepositoryRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.step_failure.is_empty())
            .count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.records.len() - self.failed_count()
    }
}

/// Drives every repository through clone, explore, install, isolated check
/// and record serialization. One repository's failure never aborts the
/// batch; only setup errors (directory creation) are fatal.
pub struct Pipeline {
    checker: Arc<dyn Checker>,
    cloner: Cloner,
    command_timeout: Duration,
    check_timeout: Duration,
}

impl Pipeline {
    pub fn new(checker: Arc<dyn Checker>) -> Self {
        Self {
            checker,
            cloner: Cloner::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_timeouts(
        checker: Arc<dyn Checker>,
        command_timeout: Duration,
        check_timeout: Duration,
    ) -> Self {
        Self {
            checker,
            cloner: Cloner::new(),
            command_timeout,
            check_timeout,
        }
    }

    /// Process every configured repository and persist one record per URL.
    pub async fn run(&self, config: &PipelineConfig) -> Result<BatchReport> {
        let started_at = Utc::now();

        if config.clean {
            for dir in [&config.clone_dir, &config.output_dir] {
                if dir.exists() {
                    std::fs::remove_dir_all(dir)
                        .with_context(|| format!("failed to clean '{}'", dir.display()))?;
                }
            }
        }
        std::fs::create_dir_all(&config.clone_dir).with_context(|| {
            format!(
                "failed to create clone directory '{}'",
                config.clone_dir.display()
            )
        })?;
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "failed to create output directory '{}'",
                config.output_dir.display()
            )
        })?;

        let mut records = Vec::new();
        for url in &config.repositories {
            let (dir_name, mut record) = self.process_repository(url, config).await;
            if let Err(error) = record.write_to(&config.output_dir, &dir_name) {
                let failure = StageFailure::Serialize(error.to_string());
                if record.step_failure.is_empty() {
                    record.step_failure = failure.stage().as_str().to_string();
                }
                record.logs.push_str(&format!("\n{}", failure));
            }
            records.push(record);
        }

        Ok(BatchReport {
            records,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run one repository through the stage sequence, turning the first
    /// failing stage into a minimal record with `step_failure` set.
    async fn process_repository(
        &self,
        url: &str,
        config: &PipelineConfig,
    ) -> (String, RepositoryRecord) {
        let log = JobLog::new();
        let runner = CommandRunner::with_timeout(log.clone(), self.command_timeout);
        let dir_name = self.cloner.derive_directory_name(url);

        let record = match self
            .run_stages(url, &dir_name, config, &log, &runner)
            .await
        {
            Ok(record) => record,
            Err(failure) => {
                log.record(failure.to_string());
                log.record(format!("error while processing {}, skipping", url));
                RepositoryRecord {
                    url: url.to_string(),
                    logs: log.joined(),
                    step_failure: failure.stage().as_str().to_string(),
                    ..Default::default()
                }
            }
        };
        (dir_name, record)
    }

    async fn run_stages(
        &self,
        url: &str,
        dir_name: &str,
        config: &PipelineConfig,
        log: &JobLog,
        runner: &CommandRunner,
    ) -> Result<RepositoryRecord, StageFailure> {
        let target = config.clone_dir.join(dir_name);
        let local_path = self
            .cloner
            .clone_into(runner, url, &target)
            .await
            .map_err(StageFailure::Clone)?;

        let metadata = explore(&local_path, log).map_err(StageFailure::Explore)?;
        let found = detect(&metadata.manifest, log);

        let used = install(runner, &local_path, &found, log)
            .await
            .map_err(StageFailure::Install)?;

        let summary = run_isolated(
            Arc::clone(&self.checker),
            local_path.clone(),
            self.check_timeout,
        )
        .await
        .map_err(StageFailure::Check)?;

        Ok(RepositoryRecord {
            url: url.to_string(),
            package_manager_found: Some(PackageManagerRecord::from_spec(&found)),
            package_manager_used: Some(PackageManagerRecord::from_spec(&used)),
            packages: vec![PackageReport {
                name: metadata.name.unwrap_or_else(|| "<default>".to_string()),
                relative_path: "./".to_string(),
                version: metadata.version.unwrap_or_default(),
                summary: Some(summary),
                outcome: "SUCCESS".to_string(),
            }],
            logs: log.joined(),
            step_failure: String::new(),
        })
    }
}
