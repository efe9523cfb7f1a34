//! terraform-ai library
//!
//! Drafts Terraform templates from natural-language prompts with OpenAI or
//! Azure OpenAI models

pub mod cli;
pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod terraform;
pub mod utils;
pub mod workflow;

// Re-export common types
pub use config::Settings;
pub use models::CompletionRequest;
pub use providers::{build_client, Backend, BackendClient, FragmentStream};
pub use services::{Completer, Orchestrator};
pub use utils::error::{AppError, AppResult};
pub use workflow::{Mode, Outcome, Workflow};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
