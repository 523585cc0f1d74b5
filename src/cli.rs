use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config;
use crate::export::{self, batch, prompt::ConsolePrompt, prompt::Prompt};
use crate::providers::azure_devops::AzureDevOpsClient;

/// Export acceptance criteria from Azure DevOps work items to text files.
#[derive(Debug, Parser)]
#[command(name = "ac-export", version)]
pub struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory to write exports into (overrides AC_EXPORT_OUTPUT_DIR)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export several work items using their default filenames
    Batch {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Ids, ranges (118556-118560), or both; prompted for when omitted
        ids: Vec<String>,
    },
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut prompt = ConsolePrompt::new();
    let loaded = config::load_config().map(|c| c.with_output_dir(cli.output_dir));
    let mut exporter = export::start(loaded, AzureDevOpsClient::new)?;

    match cli.command {
        None => {
            prompt.notice("Azure DevOps Acceptance Criteria Exporter");
            prompt.notice(&"=".repeat(50));
            let record = exporter.run_interactive(&mut prompt).await?;
            prompt.notice(&format!(
                "\n✓ Exported to {} ({} bytes)",
                record.path.display(),
                record.bytes
            ));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Batch { yes, ids }) => {
            let raw = (!ids.is_empty()).then(|| ids.join(" "));
            match batch::run(&mut exporter, raw, yes, &mut prompt).await? {
                Some(report) if !report.is_success() => Ok(ExitCode::FAILURE),
                _ => Ok(ExitCode::SUCCESS),
            }
        }
    }
}
