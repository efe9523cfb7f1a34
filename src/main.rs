//! terraform-ai
//!
//! Drafts a Terraform template from a prompt, asks before applying it and
//! runs terraform in the working directory

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use terraform_ai::cli::{Cli, Commands};
use terraform_ai::config::{FileConfig, Settings};
use terraform_ai::services::FragmentSink;
use terraform_ai::terraform::TerraformCli;
use terraform_ai::utils::files::DirFileStore;
use terraform_ai::utils::logging::init_logging;
use terraform_ai::workflow::{AutoApprove, DecisionSource, Mode, Outcome, TerminalPrompt, Workflow};
use terraform_ai::{build_client, version_info, Orchestrator};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let file_config = match &cli.global.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => FileConfig::load_default().context("Failed to load configuration file")?,
    };

    let settings = Settings::from_args(&cli.global, file_config).context("Invalid configuration")?;
    init_logging(&settings.logging);
    info!("{}", version_info());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let client = build_client(&settings)?;

    let sink: FragmentSink = Arc::new(|fragment: &str| {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(fragment.as_bytes());
        let _ = stdout.flush();
    });
    let orchestrator = Orchestrator::from_settings(client, &settings, Some(sink));

    let decisions: Arc<dyn DecisionSource> = if settings.workspace.require_confirmation {
        Arc::new(TerminalPrompt::new(!settings.stream))
    } else {
        Arc::new(AutoApprove)
    };

    let workflow = Workflow::new(
        Arc::new(orchestrator),
        decisions,
        Arc::new(DirFileStore::new(&settings.workspace.working_dir)),
        Arc::new(TerraformCli::from_workspace(&settings.workspace)),
        settings.model.clone(),
    );

    let mode = match &cli.command {
        Commands::Run(_) => Mode::Run,
        Commands::Init(_) => Mode::Init,
    };

    match workflow.run(mode, cli.command.prompt(), &cancel).await? {
        Outcome::Applied { file_name } => info!("Applied {}", file_name),
        Outcome::Aborted => println!("Template not applied."),
    }

    Ok(())
}
