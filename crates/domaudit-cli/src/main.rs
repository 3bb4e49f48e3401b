mod display;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use domaudit_core::{CommandChecker, Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "domaudit",
    version,
    about = "DomAudit — batch security-conformance runner for unsafe DOM/API usage",
    long_about = "Clone a set of repositories, install their dependencies, run the conformance \
checker over each installed tree, and write one comparable record per repository."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and report the violations
    Run {
        /// URL of a repository to audit (repeatable)
        #[arg(long = "repository", required = true)]
        repositories: Vec<String>,

        /// Root directory to clone the repositories in
        #[arg(long, default_value = "./git")]
        clone_dir: PathBuf,

        /// Directory where the serialized records are written
        #[arg(long, default_value = "./auditResults")]
        output_dir: PathBuf,

        /// Delete the clone and output directories before running
        #[arg(long)]
        clean: bool,

        /// External checker program run from each installed tree
        #[arg(long, default_value = "domaudit-checker")]
        checker: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            repositories,
            clone_dir,
            output_dir,
            clean,
            checker,
            format,
        } => cmd_run(repositories, clone_dir, output_dir, clean, checker, &format).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "domaudit",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

async fn cmd_run(
    repositories: Vec<String>,
    clone_dir: PathBuf,
    output_dir: PathBuf,
    clean: bool,
    checker: String,
    format: &str,
) -> Result<()> {
    let pipeline = Pipeline::new(Arc::new(CommandChecker::new(checker)));
    let config = PipelineConfig {
        repositories,
        clone_dir,
        output_dir,
        clean,
    };

    let report = pipeline.run(&config).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            for record in &report.records {
                display::print_repository_record(record);
            }
            display::print_batch_summary(&report, &config.output_dir);
        }
    }

    Ok(())
}
