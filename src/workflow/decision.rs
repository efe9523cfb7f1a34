//! Decision sources for the drafting loop

use super::{DecisionSource, Draft, UserAction};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use dialoguer::{Confirm, Select};
use std::io;
use tokio_util::sync::CancellationToken;

const ACTIONS: [UserAction; 3] = [UserAction::Apply, UserAction::Abort, UserAction::Reprompt];

/// Accepts the first draft without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl DecisionSource for AutoApprove {
    async fn decide(&self, _draft: &Draft, _cancel: &CancellationToken) -> AppResult<UserAction> {
        Ok(UserAction::Apply)
    }
}

/// Asks on the terminal
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    /// Print the draft before asking; off when it was already streamed out
    show_draft: bool,
}

impl TerminalPrompt {
    pub fn new(show_draft: bool) -> Self {
        Self { show_draft }
    }
}

/// Run a blocking dialoguer prompt off the runtime, racing it against `cancel`
async fn interact<T, F>(cancel: &CancellationToken, prompt: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(prompt);

    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        joined = task => joined
            .map_err(|e| AppError::Io(io::Error::new(io::ErrorKind::Other, e)))?
            .map_err(|e| AppError::Io(io::Error::new(io::ErrorKind::Other, e))),
    }
}

#[async_trait]
impl DecisionSource for TerminalPrompt {
    async fn decide(&self, draft: &Draft, cancel: &CancellationToken) -> AppResult<UserAction> {
        if self.show_draft {
            println!("\n{}\n", draft.template);
        } else {
            // end the streamed template's last line
            println!();
        }
        if let Some(name) = &draft.name {
            println!("Suggested file name: {}", name.trim());
        }

        let items: Vec<String> = ACTIONS.iter().map(ToString::to_string).collect();
        let selection = interact(cancel, move || {
            Select::new()
                .with_prompt("Would you like to apply this?")
                .items(&items)
                .default(0)
                .interact()
        })
        .await?;

        ACTIONS
            .get(selection)
            .copied()
            .ok_or_else(|| AppError::Io(io::Error::new(io::ErrorKind::InvalidInput, "no action selected")))
    }

    async fn retry_after_error(&self, error: &AppError, cancel: &CancellationToken) -> AppResult<bool> {
        let prompt = match error {
            AppError::Step { .. } => format!("{}: {}. Try again?", error, error.root()),
            _ => format!("{}. Try again?", error),
        };
        interact(cancel, move || Confirm::new().with_prompt(prompt).default(true).interact()).await
    }
}
