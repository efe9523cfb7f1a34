//! Interactive drafting loop
//!
//! Drafts a template, lets the user apply, reprompt or abort, and on
//! acceptance stores the template and hands it to terraform.

pub mod decision;

use crate::services::Completer;
use crate::terraform::{extract_template, validate_template, Provisioner};
use crate::utils::error::{helpers::config_error, AppError, AppResult, DraftStep, ErrorContext};
use crate::utils::files::{file_name_from_draft, FileStore};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use decision::{AutoApprove, TerminalPrompt};

/// Directive for provider templates
pub const INIT_DIRECTIVE: &str =
    "You are a Terraform HCL generator, only generate valid provider Terraform HCL templates.";

/// Directive for resource templates
pub const RUN_DIRECTIVE: &str =
    "You are a Terraform HCL generator, only generate valid Terraform HCL without provider templates.";

/// Directive for template file names
pub const NAME_DIRECTIVE: &str =
    "You are a file name generator, only generate valid name for Terraform templates.";

/// File name for provider templates
pub const PROVIDER_FILE: &str = "provider.tf";

/// Which command is drafting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Resource template, applied with `terraform apply`
    Run,
    /// Provider template, stored as provider.tf and followed by `terraform init`
    Init,
}

impl Mode {
    pub fn directive(&self) -> &'static str {
        match self {
            Mode::Run => RUN_DIRECTIVE,
            Mode::Init => INIT_DIRECTIVE,
        }
    }
}

/// A drafted template and, for `run`, its drafted file name
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub template: String,
    pub name: Option<String>,
}

/// What the user chose to do with a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Apply,
    Abort,
    Reprompt,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAction::Apply => write!(f, "Apply"),
            UserAction::Abort => write!(f, "Don't Apply"),
            UserAction::Reprompt => write!(f, "Reprompt"),
        }
    }
}

/// Loop states; `Accepted` and `Aborted` are terminal
#[derive(Debug, Clone, PartialEq)]
pub enum DraftState {
    Drafting,
    AwaitingUserDecision(Draft),
    Accepted(Draft),
    Aborted,
}

/// How the loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The template was stored under `file_name` and provisioned
    Applied { file_name: String },
    Aborted,
}

/// Source of user decisions
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Decide what to do with a draft
    async fn decide(&self, draft: &Draft, cancel: &CancellationToken) -> AppResult<UserAction>;

    /// Whether to draft again after a retryable error
    async fn retry_after_error(&self, _error: &AppError, _cancel: &CancellationToken) -> AppResult<bool> {
        Ok(false)
    }
}

/// The interactive loop and its collaborators
pub struct Workflow {
    completer: Arc<dyn Completer>,
    decisions: Arc<dyn DecisionSource>,
    store: Arc<dyn FileStore>,
    provisioner: Arc<dyn Provisioner>,
    model: String,
}

impl Workflow {
    pub fn new(
        completer: Arc<dyn Completer>,
        decisions: Arc<dyn DecisionSource>,
        store: Arc<dyn FileStore>,
        provisioner: Arc<dyn Provisioner>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            completer,
            decisions,
            store,
            provisioner,
            model: model.into(),
        }
    }

    /// Run the loop until the user applies or aborts
    pub async fn run(&self, mode: Mode, prompt: &[String], cancel: &CancellationToken) -> AppResult<Outcome> {
        let prompt = prompt.join(" ");
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(config_error("prompt cannot be empty"));
        }

        let mut history = vec![prompt.to_string()];
        let mut state = DraftState::Drafting;

        loop {
            state = match state {
                DraftState::Drafting => match self.draft(mode, &history, cancel).await {
                    Ok(draft) => DraftState::AwaitingUserDecision(draft),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) if e.is_retryable() && self.decisions.retry_after_error(&e, cancel).await? => {
                        warn!("Drafting failed, retrying: {}", e);
                        DraftState::Drafting
                    }
                    Err(e) => return Err(e),
                },
                DraftState::AwaitingUserDecision(draft) => {
                    let action = self.decisions.decide(&draft, cancel).await?;
                    info!("User chose {}", action);
                    match action {
                        UserAction::Apply => DraftState::Accepted(draft),
                        UserAction::Abort => DraftState::Aborted,
                        UserAction::Reprompt => {
                            history.push(draft.template);
                            DraftState::Drafting
                        }
                    }
                }
                DraftState::Accepted(draft) => {
                    let file_name = self.accept(mode, draft, cancel).await?;
                    return Ok(Outcome::Applied { file_name });
                }
                DraftState::Aborted => {
                    info!("Draft not applied");
                    return Ok(Outcome::Aborted);
                }
            };
        }
    }

    async fn draft(&self, mode: Mode, history: &[String], cancel: &CancellationToken) -> AppResult<Draft> {
        info!("Drafting template with {} history entries", history.len());
        let completion = self
            .completer
            .complete(history, &self.model, mode.directive(), cancel)
            .await
            .step_context(DraftStep::Template)?;
        let template = extract_template(&completion);

        let name = match mode {
            Mode::Init => None,
            Mode::Run => Some(
                self.completer
                    .complete_buffered(history, &self.model, NAME_DIRECTIVE, cancel)
                    .await
                    .step_context(DraftStep::FileName)?,
            ),
        };

        Ok(Draft { template, name })
    }

    async fn accept(&self, mode: Mode, draft: Draft, cancel: &CancellationToken) -> AppResult<String> {
        validate_template(&draft.template)?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let file_name = match mode {
            Mode::Init => PROVIDER_FILE.to_string(),
            Mode::Run => file_name_from_draft(draft.name.as_deref().unwrap_or_default()),
        };
        self.store.store(&file_name, &draft.template).await?;

        match mode {
            Mode::Init => self.provisioner.init().await?,
            Mode::Run => self.provisioner.apply().await?,
        }

        Ok(file_name)
    }
}
