//! Command-line interface definition
//!
//! Every flag can also be supplied through the environment variable named
//! next to it.

use crate::config::settings::{DEFAULT_API_VERSION, DEFAULT_OPENAI_BASE_URL};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "terraform-ai", version, about = "Draft Terraform templates from natural language and apply them")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Draft a resource template, store it and run `terraform apply`
    Run(PromptArgs),
    /// Draft a provider template, store it as provider.tf and run `terraform init`
    Init(PromptArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PromptArgs {
    /// What the template should do
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// OpenAI or Azure OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true, default_value = "")]
    pub openai_api_key: String,

    /// Model name (OpenAI) or deployment name (Azure OpenAI)
    #[arg(long, env = "OPENAI_DEPLOYMENT_NAME", global = true, default_value = "text-davinci-003")]
    pub openai_deployment_name: String,

    /// Azure OpenAI endpoint; when set, Azure OpenAI is used instead of OpenAI
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", global = true)]
    pub azure_openai_endpoint: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_BASE_URL", global = true, default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,

    /// Value of the api-version query parameter
    #[arg(long, env = "OPENAI_API_VERSION", global = true, default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, env = "TEMPERATURE", global = true, default_value_t = 0.0)]
    pub temperature: f32,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Streaming request timeout in seconds
    #[arg(long, env = "STREAM_TIMEOUT", global = true, default_value_t = 300)]
    pub stream_timeout: u64,

    /// Directory the template is written to and terraform runs in
    #[arg(long, env = "WORKING_DIR", global = true)]
    pub working_dir: Option<PathBuf>,

    /// Path of the terraform executable
    #[arg(long, env = "EXEC_DIR", global = true)]
    pub exec_dir: Option<PathBuf>,

    /// Ask for confirmation before applying a draft
    #[arg(long, env = "REQUIRE_CONFIRMATION", global = true, default_value_t = true, action = ArgAction::Set)]
    pub require_confirmation: bool,

    /// Print drafts while they stream in
    #[arg(long, env = "STREAM", global = true, default_value_t = false, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub stream: bool,

    /// Path of the JSON configuration file
    #[arg(long, env = "TERRAFORM_AI_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

impl Commands {
    pub fn prompt(&self) -> &[String] {
        match self {
            Commands::Run(args) | Commands::Init(args) => &args.prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "terraform-ai",
            "--openai-api-key",
            "sk-test",
            "--openai-deployment-name",
            "gpt-4",
            "run",
            "create",
            "an s3 bucket",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Run(_)));
        assert_eq!(cli.command.prompt(), ["create".to_string(), "an s3 bucket".to_string()]);
        assert_eq!(cli.global.openai_deployment_name, "gpt-4");
    }

    #[test]
    fn test_prompt_is_required() {
        assert!(Cli::try_parse_from(["terraform-ai", "init"]).is_err());
    }

    #[test]
    fn test_require_confirmation_flag() {
        let cli = Cli::try_parse_from(["terraform-ai", "--require-confirmation", "false", "init", "aws provider"]).unwrap();
        assert!(!cli.global.require_confirmation);
    }
}
