use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rule name reserved for the conformance checks this system audits.
/// Findings under any other rule are filed in the "other" buckets.
pub const DOM_AUDIT_RULE_NAME: &str = "domaudit/dom-sink-checks";

/// Message key used when a finding's rule identifier has no table entry.
pub const UNKNOWN_RULE_KEY: &str = "unknown_rule";

/// An inline suppression directive attached to a finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suppression {
    #[serde(default)]
    pub justification: String,
}

/// One raw diagnostic from the checker, positions pass-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFinding {
    #[serde(default)]
    pub rule_id: Option<String>,
    pub message: String,
    pub line: i32,
    pub column: i32,
    #[serde(default)]
    pub end_line: i32,
    #[serde(default)]
    pub end_column: i32,
    /// Present when the finding was silenced in source.
    #[serde(default)]
    pub suppressions: Vec<Suppression>,
}

impl RawFinding {
    pub fn is_suppressed(&self) -> bool {
        !self.suppressions.is_empty()
    }
}

/// Findings and raw diagnostic counts for one checked file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFindings {
    pub file_path: String,
    #[serde(default)]
    pub findings: Vec<RawFinding>,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default)]
    pub error_count: u32,
}

/// The checker's complete output for one repository, in file encounter order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRun {
    pub root_dir: String,
    #[serde(default)]
    pub files: Vec<FileFindings>,
}

/// The external static-analysis engine. The pipeline treats it as a black
/// box over the installed source tree; implementations run inside the
/// isolated check worker.
pub trait Checker: Send + Sync {
    fn execute(&self, root_dir: &Path) -> Result<CheckRun>;
}

/// Adapter for an external checker program that prints a `CheckRun` as JSON
/// on stdout. The program is executed from the repository root.
pub struct CommandChecker {
    program: String,
    args: Vec<String>,
}

impl CommandChecker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Checker for CommandChecker {
    fn execute(&self, root_dir: &Path) -> Result<CheckRun> {
        let output = std::process::Command::new(&self.program)
            .args(&self.args)
            .current_dir(root_dir)
            .output()
            .with_context(|| format!("failed to run checker '{}'", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "checker '{}' exited with {}: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("checker '{}' produced invalid JSON", self.program))
    }
}

/// Sub-rule identifiers the checker embeds as a `[rule-identifier]` message
/// prefix, mapped to their stable message keys.
const RULE_MESSAGE_KEYS: &[(&str, &str)] = &[
    ("ban-base-href-assignments", "ban_base_href_assignments"),
    ("ban-document-execcommand", "ban_document_execcommand"),
    ("ban-document-write-calls", "ban_document_write_calls"),
    ("ban-document-writeln-calls", "ban_document_writeln_calls"),
    ("ban-domparser-parsefromstring", "ban_domparser_parsefromstring"),
    (
        "ban-element-innerhtml-assignments",
        "ban_element_innerhtml_assignments",
    ),
    ("ban-element-insertadjacenthtml", "ban_element_insertadjacenthtml"),
    (
        "ban-element-outerhtml-assignments",
        "ban_element_outerhtml_assignments",
    ),
    ("ban-element-setattribute", "ban_element_setattribute"),
    ("ban-eval-calls", "ban_eval_calls"),
    ("ban-function-calls", "ban_function_calls"),
    ("ban-iframe-srcdoc-assignments", "ban_iframe_srcdoc_assignments"),
    ("ban-object-data-assignments", "ban_object_data_assignments"),
    (
        "ban-range-createcontextualfragment",
        "ban_range_createcontextualfragment",
    ),
    ("ban-script-appendchild-calls", "ban_script_appendchild_calls"),
    ("ban-script-content-assignments", "ban_script_content_assignments"),
    ("ban-script-src-assignments", "ban_script_src_assignments"),
    (
        "ban-serviceworkercontainer-register",
        "ban_serviceworkercontainer_register",
    ),
    ("ban-shared-worker-calls", "ban_shared_worker_calls"),
    ("ban-trustedtypes-createpolicy", "ban_trustedtypes_createpolicy"),
    ("ban-window-stringfunctiondef", "ban_window_stringfunctiondef"),
    ("ban-worker-calls", "ban_worker_calls"),
    ("ban-worker-importscripts", "ban_worker_importscripts"),
    ("ban-legacy-conversions", "ban_legacy_conversions"),
    ("ban-reviewed-conversions", "ban_reviewed_conversions"),
];

/// Map a checker message of the form `"[rule-identifier] text"` to its stable
/// message key, `UNKNOWN_RULE_KEY` when the identifier has no table entry.
pub fn rule_message_key(message: &str) -> &'static str {
    let Some(rest) = message.strip_prefix('[') else {
        return UNKNOWN_RULE_KEY;
    };
    let Some(end) = rest.find(']') else {
        return UNKNOWN_RULE_KEY;
    };
    let identifier = &rest[..end];
    if identifier.is_empty()
        || !identifier
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '-')
    {
        return UNKNOWN_RULE_KEY;
    }
    RULE_MESSAGE_KEYS
        .iter()
        .find(|(rule, _)| *rule == identifier)
        .map(|(_, key)| *key)
        .unwrap_or(UNKNOWN_RULE_KEY)
}
