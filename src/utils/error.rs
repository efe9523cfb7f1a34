//! Error handling module
//!
//! Defines error types and handling logic used in the project

use std::fmt;
use thiserror::Error;

/// The drafting step a failed call belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStep {
    /// Generating the Terraform template
    Template,
    /// Generating the template's file name
    FileName,
}

impl fmt::Display for DraftStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftStep::Template => write!(f, "drafting the template"),
            DraftStep::FileName => write!(f, "drafting the file name"),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (bad deployment name, missing key, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No tokenizer or context window is known for the model
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// The prompt leaves no room for a completion
    #[error("Prompt too large for {model}: {prompt_tokens} prompt tokens leave no room in a {context_window}-token context window")]
    PromptTooLarge {
        model: String,
        prompt_tokens: usize,
        context_window: usize,
    },

    /// Connection level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-2xx response from the remote service
    #[error("Remote API error ({status} {error_type}): {message}")]
    RemoteApi {
        status: u16,
        error_type: String,
        message: String,
    },

    /// Success body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A streamed event payload could not be decoded
    #[error("Stream decode error: {0}")]
    StreamDecode(String),

    /// Interrupted by the user or the process
    #[error("Operation cancelled")]
    Cancelled,

    /// Generated template failed validation
    #[error("Invalid template: {0}")]
    Template(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The provisioning tool failed
    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    /// Error raised while performing a drafting step
    #[error("{step} failed")]
    Step {
        step: DraftStep,
        #[source]
        source: Box<AppError>,
    },
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl AppError {
    /// Innermost error, skipping step context
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Step { source, .. } => source.error_type(),
            AppError::Configuration(_) => "configuration_error",
            AppError::UnsupportedModel(_) => "unsupported_model_error",
            AppError::PromptTooLarge { .. } => "prompt_too_large_error",
            AppError::Transport(_) => "transport_error",
            AppError::Timeout => "timeout_error",
            AppError::RemoteApi { error_type, .. } => error_type.as_str(),
            AppError::Decode(_) => "decode_error",
            AppError::StreamDecode(_) => "stream_decode_error",
            AppError::Cancelled => "cancelled",
            AppError::Template(_) => "template_error",
            AppError::Io(_) => "io_error",
            AppError::Provisioning(_) => "provisioning_error",
        }
    }

    /// Whether the invocation must stop without offering a retry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            AppError::Configuration(_)
                | AppError::UnsupportedModel(_)
                | AppError::PromptTooLarge { .. }
                | AppError::Cancelled
        )
    }

    /// Whether the user may reasonably ask for another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            AppError::RemoteApi { .. }
                | AppError::Transport(_)
                | AppError::Timeout
                | AppError::Decode(_)
                | AppError::StreamDecode(_)
        )
    }

    /// HTTP status of a remote error, if any
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            AppError::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> AppError {
        AppError::Configuration(message.into())
    }

    /// Create unsupported model error
    pub fn unsupported_model(model: impl Into<String>) -> AppError {
        AppError::UnsupportedModel(model.into())
    }

    /// Create decode error
    pub fn decode_error(message: impl Into<String>) -> AppError {
        AppError::Decode(message.into())
    }

    /// Create template error
    pub fn template_error(message: impl Into<String>) -> AppError {
        AppError::Template(message.into())
    }
}

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Attach the drafting step that produced the error
    fn step_context(self, step: DraftStep) -> AppResult<T>;
}

impl<T> ErrorContext<T> for AppResult<T> {
    fn step_context(self, step: DraftStep) -> AppResult<T> {
        self.map_err(|e| AppError::Step {
            step,
            source: Box::new(e),
        })
    }
}
