//! Data models module
//!
//! Defines the completion request value object and the OpenAI wire structures

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

/// Conversational role attached to chat messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single completion request
///
/// Built once per call by the orchestrator and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    model: String,
    prompt: String,
    role: Role,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request for `model` with the fixed `user` role
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            role: Role::User,
            temperature,
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
