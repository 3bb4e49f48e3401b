pub mod aggregate;
pub mod checker;
pub mod clone;
pub mod command;
pub mod explore;
pub mod install;
pub mod package_manager;
pub mod pipeline;
pub mod record;
pub mod worker;

pub use checker::{CheckRun, Checker, CommandChecker, DOM_AUDIT_RULE_NAME};
pub use package_manager::{PackageManagerKind, PackageManagerSpec};
pub use pipeline::{BatchReport, Pipeline, PipelineConfig, Stage, StageFailure};
pub use record::{RepositoryRecord, Summary, Violation};
