use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;

/// Default upper bound for a single external command invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Ordered, append-only log owned by one repository job.
///
/// Cloning the handle shares the underlying line buffer, so the pipeline and
/// the command runner append to the same sequence.
#[derive(Debug, Clone, Default)]
pub struct JobLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl JobLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line to the log.
    pub fn record(&self, line: impl Into<String>) {
        self.lines.lock().unwrap().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// The full log as a single newline-joined string, the form persisted on
    /// the repository record.
    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }
}

/// Captured result of one external command. `exit_code` is `-1` when the
/// process could not be spawned or was killed on timeout.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub text: String,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands with captured output, never erroring on a non-zero
/// exit. Every invocation and its output are appended to the job log.
pub struct CommandRunner {
    log: JobLog,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(log: JobLog) -> Self {
        Self::with_timeout(log, DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(log: JobLog, timeout: Duration) -> Self {
        Self { log, timeout }
    }

    /// Execute `program` with `args`, optionally in `cwd`. The child is
    /// killed when the timeout expires; expiry and spawn errors are reported
    /// as a failed `CommandOutput`, not as an error.
    pub async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> CommandOutput {
        self.log.record(format!("$ {} {}", program, args.join(" ")));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => {
                let mut text = String::from_utf8_lossy(&output.stdout).to_string();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                CommandOutput {
                    exit_code: output.status.code().unwrap_or(-1),
                    text,
                }
            }
            Ok(Err(error)) => CommandOutput {
                exit_code: -1,
                text: format!("failed to spawn {}: {}", program, error),
            },
            Err(_) => CommandOutput {
                exit_code: -1,
                text: format!(
                    "{} timed out after {} seconds",
                    program,
                    self.timeout.as_secs()
                ),
            },
        };

        if !output.succeeded() {
            self.log
                .record(format!("command failed, exit code: {}", output.exit_code));
        }
        if !output.text.is_empty() {
            self.log.record(output.text.clone());
        }
        output
    }
}
