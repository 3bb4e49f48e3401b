use crate::checker::{CheckRun, RawFinding, DOM_AUDIT_RULE_NAME};
use crate::record::{Summary, Violation};

/// Justification recorded when no suppression directive carries one.
pub const NO_JUSTIFICATION: &str = "NO JUSTIFICATION";

/// Canonicalize a raw checker run into a `Summary`.
///
/// Pure function of its input: bucket order follows file encounter order,
/// then message encounter order within a file, so two identical runs diff
/// cleanly.
pub fn canonicalize(run: &CheckRun) -> Summary {
    let mut summary = Summary {
        root_dir: run.root_dir.clone(),
        ..Default::default()
    };

    for file in &run.files {
        for finding in &file.findings {
            let violation = to_violation(finding, &file.file_path);
            let own = finding.rule_id.as_deref() == Some(DOM_AUDIT_RULE_NAME);
            match (own, finding.is_suppressed()) {
                (true, false) => {
                    summary.own_violations.push(violation);
                    summary.own_violation_count += 1;
                }
                (true, true) => {
                    summary.own_silenced_violations.push(violation);
                    summary.own_silenced_violation_count += 1;
                }
                (false, false) => {
                    summary.other_violations.push(violation);
                    summary.other_violation_count += 1;
                }
                (false, true) => {
                    summary.other_silenced_violations.push(violation);
                    summary.other_silenced_violation_count += 1;
                }
            }
        }
        summary.warnings += file.warning_count as i32;
        summary.errors += file.error_count as i32;
    }

    summary
}

fn to_violation(finding: &RawFinding, file_path: &str) -> Violation {
    Violation {
        message: finding.message.clone(),
        rule_id: finding.rule_id.clone().unwrap_or_default(),
        file_path: file_path.to_string(),
        line: finding.line,
        column: finding.column,
        end_line: finding.end_line,
        end_column: finding.end_column,
        justification: if finding.is_suppressed() {
            join_justifications(finding)
        } else {
            String::new()
        },
        link: format_file_link(file_path, finding.line, finding.column),
    }
}

fn join_justifications(finding: &RawFinding) -> String {
    if finding
        .suppressions
        .iter()
        .all(|s| s.justification.is_empty())
    {
        return NO_JUSTIFICATION.to_string();
    }
    finding
        .suppressions
        .iter()
        .map(|s| s.justification.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_file_link(file_path: &str, line: i32, column: i32) -> String {
    format!("file://{}:{}:{}", file_path, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{FileFindings, Suppression};

    fn own_finding(message: &str, line: i32) -> RawFinding {
        RawFinding {
            rule_id: Some(DOM_AUDIT_RULE_NAME.to_string()),
            message: message.to_string(),
            line,
            column: 1,
            end_line: line,
            end_column: 10,
            suppressions: vec![],
        }
    }

    #[test]
    fn classifies_findings_into_four_buckets() {
        // Two unsuppressed own-rule findings in file A, one suppressed plus
        // one unsuppressed own-rule finding in file B, one fatal parse error
        // in file C.
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![
                FileFindings {
                    file_path: "a.ts".to_string(),
                    findings: vec![
                        own_finding("[ban-eval-calls] Do not use eval", 1),
                        own_finding("[ban-document-write-calls] Do not use document.write", 9),
                    ],
                    warning_count: 0,
                    error_count: 2,
                },
                FileFindings {
                    file_path: "b.ts".to_string(),
                    findings: vec![
                        RawFinding {
                            suppressions: vec![Suppression {
                                justification: "This is a legacy violation.".to_string(),
                            }],
                            ..own_finding("[ban-eval-calls] Do not use eval", 4)
                        },
                        own_finding("[ban-eval-calls] Do not use eval", 12),
                    ],
                    warning_count: 0,
                    error_count: 1,
                },
                FileFindings {
                    file_path: "c.ts".to_string(),
                    findings: vec![RawFinding {
                        rule_id: None,
                        message: "Parsing error: unexpected token".to_string(),
                        line: 1,
                        column: 1,
                        end_line: 1,
                        end_column: 1,
                        suppressions: vec![],
                    }],
                    warning_count: 0,
                    error_count: 1,
                },
            ],
        };

        let summary = canonicalize(&run);

        assert_eq!(summary.own_violations.len(), 3);
        assert_eq!(summary.own_violation_count, 3);
        assert_eq!(summary.own_silenced_violations.len(), 1);
        assert_eq!(
            summary.own_silenced_violations[0].justification,
            "This is a legacy violation."
        );
        assert_eq!(summary.other_violations.len(), 1);
        assert_eq!(summary.other_violations[0].file_path, "c.ts");
        assert_eq!(summary.other_silenced_violation_count, 0);
        assert_eq!(summary.errors, 4);
        assert_eq!(summary.warnings, 0);
    }

    #[test]
    fn bucket_order_follows_file_then_message_order() {
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![
                FileFindings {
                    file_path: "z.ts".to_string(),
                    findings: vec![own_finding("first", 1), own_finding("second", 2)],
                    warning_count: 0,
                    error_count: 0,
                },
                FileFindings {
                    file_path: "a.ts".to_string(),
                    findings: vec![own_finding("third", 1)],
                    warning_count: 0,
                    error_count: 0,
                },
            ],
        };

        let summary = canonicalize(&run);
        let messages: Vec<_> = summary
            .own_violations
            .iter()
            .map(|v| v.message.as_str())
            .collect();
        assert_eq!(messages, ["first", "second", "third"]);
    }

    #[test]
    fn joins_multiple_justifications() {
        let mut finding = own_finding("[ban-eval-calls] Do not use eval", 1);
        finding.suppressions = vec![
            Suppression {
                justification: "reviewed".to_string(),
            },
            Suppression {
                justification: "migration pending".to_string(),
            },
        ];
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![FileFindings {
                file_path: "a.ts".to_string(),
                findings: vec![finding],
                warning_count: 0,
                error_count: 0,
            }],
        };

        let summary = canonicalize(&run);
        assert_eq!(
            summary.own_silenced_violations[0].justification,
            "reviewed | migration pending"
        );
    }

    #[test]
    fn empty_justifications_use_the_sentinel() {
        let mut finding = own_finding("[ban-eval-calls] Do not use eval", 1);
        finding.suppressions = vec![Suppression::default(), Suppression::default()];
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![FileFindings {
                file_path: "a.ts".to_string(),
                findings: vec![finding],
                warning_count: 0,
                error_count: 0,
            }],
        };

        let summary = canonicalize(&run);
        assert_eq!(
            summary.own_silenced_violations[0].justification,
            NO_JUSTIFICATION
        );
    }

    #[test]
    fn carries_raw_warning_and_error_totals() {
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![
                FileFindings {
                    file_path: "a.ts".to_string(),
                    findings: vec![],
                    warning_count: 3,
                    error_count: 1,
                },
                FileFindings {
                    file_path: "b.ts".to_string(),
                    findings: vec![],
                    warning_count: 2,
                    error_count: 0,
                },
            ],
        };

        let summary = canonicalize(&run);
        assert_eq!(summary.warnings, 5);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn derives_file_links_from_position() {
        let run = CheckRun {
            root_dir: "/repo".to_string(),
            files: vec![FileFindings {
                file_path: "/repo/src/a.ts".to_string(),
                findings: vec![own_finding("[ban-eval-calls] Do not use eval", 7)],
                warning_count: 0,
                error_count: 1,
            }],
        };

        let summary = canonicalize(&run);
        assert_eq!(summary.own_violations[0].link, "file:///repo/src/a.ts:7:1");
    }
}
