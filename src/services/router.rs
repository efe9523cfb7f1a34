//! Model Router
//!
//! Decides which API surface a model is addressed on and, together with the
//! active backend, which of the four call variants a request uses

use super::catalog::{self, Capability};
use crate::providers::Backend;
use tracing::debug;

/// The concrete call a request is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallVariant {
    OpenAIChat,
    OpenAICompletion,
    AzureChat,
    AzureCompletion,
}

impl CallVariant {
    pub fn is_chat(&self) -> bool {
        matches!(self, CallVariant::OpenAIChat | CallVariant::AzureChat)
    }
}

/// Classify a model or deployment name
///
/// Exact match against the catalog; anything unknown is completion-only.
pub fn classify(model: &str) -> Capability {
    catalog::lookup(model)
        .map(|spec| spec.capability)
        .unwrap_or(Capability::CompletionOnly)
}

/// Pick the call variant for `model` on `backend`
pub fn route(backend: Backend, model: &str) -> CallVariant {
    let variant = match (backend, classify(model)) {
        (Backend::OpenAI, Capability::ChatCapable) => CallVariant::OpenAIChat,
        (Backend::OpenAI, Capability::CompletionOnly) => CallVariant::OpenAICompletion,
        (Backend::AzureOpenAI, Capability::ChatCapable) => CallVariant::AzureChat,
        (Backend::AzureOpenAI, Capability::CompletionOnly) => CallVariant::AzureCompletion,
    };
    debug!("Routed model {} to {:?}", model, variant);
    variant
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT_MODELS: &[&str] = &[
        "gpt-3.5-turbo",
        "gpt-3.5-turbo-0301",
        "gpt-3.5-turbo-0613",
        "gpt-3.5-turbo-16k",
        "gpt-3.5-turbo-16k-0613",
        "gpt-35-turbo",
        "gpt-35-turbo-0301",
        "gpt-35-turbo-0613",
        "gpt-35-turbo-16k",
        "gpt-4",
        "gpt-4-0314",
        "gpt-4-0613",
        "gpt-4-32k",
        "gpt-4-32k-0314",
        "gpt-4-32k-0613",
    ];

    const COMPLETION_MODELS: &[&str] = &[
        "text-davinci-003",
        "text-davinci-002",
        "code-davinci-002",
        "gpt-3.5-turbo-instruct",
        "davinci",
        "my-gpt-4-deployment",
        "gpt-4-custom",
        "GPT-4",
        "gpt-35-turbo ",
        "",
        "prod_gpt35",
    ];

    #[test]
    fn test_chat_models_are_chat_capable() {
        for model in CHAT_MODELS {
            assert_eq!(classify(model), Capability::ChatCapable, "model {}", model);
        }
    }

    #[test]
    fn test_everything_else_is_completion_only() {
        for model in COMPLETION_MODELS {
            assert_eq!(classify(model), Capability::CompletionOnly, "model {:?}", model);
        }
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route(Backend::OpenAI, "gpt-4"), CallVariant::OpenAIChat);
        assert_eq!(route(Backend::OpenAI, "text-davinci-003"), CallVariant::OpenAICompletion);
        assert_eq!(route(Backend::AzureOpenAI, "gpt-35-turbo"), CallVariant::AzureChat);
        assert_eq!(route(Backend::AzureOpenAI, "text-davinci-003"), CallVariant::AzureCompletion);
        assert!(route(Backend::AzureOpenAI, "gpt-4-32k").is_chat());
        assert!(!route(Backend::OpenAI, "my-deployment").is_chat());
    }
}
