use crate::aggregate::canonicalize;
use crate::checker::Checker;
use crate::record::Summary;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// The single terminal message a check worker posts before exiting.
#[derive(Debug)]
pub enum WorkerMessage {
    Success { summary: Summary, root_dir: String },
    Error { message: String, root_dir: String },
}

/// Run the checker over `root_dir` inside a dedicated worker thread.
///
/// The worker posts exactly one terminal message over a single-shot channel;
/// a checker panic is caught at the isolation boundary and reported as a
/// check failure instead of taking down the orchestrator. Timeout expiry and
/// a worker that dies without posting are check failures too. On timeout the
/// worker thread is left to finish on its own; the job has already failed.
pub async fn run_isolated(
    checker: Arc<dyn Checker>,
    root_dir: PathBuf,
    timeout: Duration,
) -> Result<Summary, String> {
    let (sender, receiver) = oneshot::channel();

    std::thread::spawn(move || {
        let root = root_dir.display().to_string();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| checker.execute(&root_dir)));
        let message = match outcome {
            Ok(Ok(run)) => WorkerMessage::Success {
                summary: canonicalize(&run),
                root_dir: root,
            },
            Ok(Err(error)) => WorkerMessage::Error {
                message: format!("{:#}", error),
                root_dir: root,
            },
            Err(payload) => WorkerMessage::Error {
                message: format!("checker panicked: {}", panic_text(payload)),
                root_dir: root,
            },
        };
        let _ = sender.send(message);
    });

    match tokio::time::timeout(timeout, receiver).await {
        Err(_) => Err(format!(
            "check timed out after {} seconds",
            timeout.as_secs()
        )),
        Ok(Err(_)) => Err("check worker exited without posting a result".to_string()),
        Ok(Ok(WorkerMessage::Success { summary, .. })) => Ok(summary),
        Ok(Ok(WorkerMessage::Error { message, .. })) => Err(message),
    }
}

fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
