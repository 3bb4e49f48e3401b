use colored::*;
use domaudit_core::checker::rule_message_key;
use domaudit_core::record::Summary;
use domaudit_core::{BatchReport, RepositoryRecord, Violation};
use std::collections::BTreeMap;
use std::path::Path;

/// Print one repository record to the terminal.
pub fn print_repository_record(record: &RepositoryRecord) {
    println!();
    println!("{}", format!(" {}", record.url).bold());

    if let Some(found) = &record.package_manager_found {
        println!(
            " {} Package manager found: {} {}",
            "|-".dimmed(),
            if found.kind.is_empty() {
                "unknown"
            } else {
                found.kind.as_str()
            },
            found.version.dimmed()
        );
    }
    if let Some(used) = &record.package_manager_used {
        println!(
            " {} Package manager used:  {} {}",
            "|-".dimmed(),
            used.kind,
            used.version.dimmed()
        );
    }

    if !record.step_failure.is_empty() {
        println!(
            " {} Failed at stage: {}",
            "|-".dimmed(),
            record.step_failure.red().bold()
        );
        return;
    }

    for package in &record.packages {
        println!(
            " {} Package {} ({})",
            "|-".dimmed(),
            package.name,
            package.outcome.green()
        );
        if let Some(summary) = &package.summary {
            print_summary(summary);
        }
    }
}

fn print_summary(summary: &Summary) {
    println!(
        " {} Violations: {} active, {} silenced, {} other, {} other silenced",
        "|-".dimmed(),
        count_display(summary.own_violation_count),
        summary.own_silenced_violation_count,
        summary.other_violation_count,
        summary.other_silenced_violation_count,
    );
    println!(
        " {} Raw totals: {} errors, {} warnings",
        "|-".dimmed(),
        summary.errors,
        summary.warnings
    );

    if !summary.own_violations.is_empty() {
        let mut by_key: BTreeMap<&str, usize> = BTreeMap::new();
        for violation in &summary.own_violations {
            *by_key.entry(rule_message_key(&violation.message)).or_default() += 1;
        }
        let grouped = by_key
            .iter()
            .map(|(key, count)| format!("{} x{}", key, count))
            .collect::<Vec<_>>()
            .join(", ");
        println!(" {} By rule: {}", "|-".dimmed(), grouped);

        for violation in &summary.own_violations {
            print_violation(violation);
        }
    }
    for violation in &summary.own_silenced_violations {
        println!(
            "    {} {} ({})",
            "silenced".yellow(),
            violation.message,
            violation.justification.dimmed()
        );
    }
}

fn print_violation(violation: &Violation) {
    println!(
        "    {} {}:{}:{} {}",
        "violation".red(),
        violation.file_path,
        violation.line,
        violation.column,
        violation.message
    );
}

fn count_display(count: i32) -> String {
    if count > 0 {
        count.to_string().red().bold().to_string()
    } else {
        count.to_string().green().to_string()
    }
}

/// Print the batch roll-up after all repositories were processed.
pub fn print_batch_summary(report: &BatchReport, output_dir: &Path) {
    println!();
    println!(" {}", "=".repeat(60).dimmed());
    println!(" {}", "Batch Summary".bold().underline());
    println!(
        " {} {} repositories processed: {} succeeded, {} failed",
        "|-".dimmed(),
        report.records.len(),
        report.succeeded_count().to_string().green(),
        if report.failed_count() > 0 {
            report.failed_count().to_string().red().to_string()
        } else {
            "0".to_string()
        }
    );
    println!(
        " {} Records written to {}",
        "|-".dimmed(),
        output_dir.display()
    );
    println!(
        " {} Finished in {}s",
        "|-".dimmed(),
        (report.finished_at - report.started_at).num_seconds()
    );
    println!();
}
