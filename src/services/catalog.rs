//! Known model catalog
//!
//! Static table of the models this tool can address, with their context
//! window, BPE encoding and API surface

use crate::utils::error::{helpers::unsupported_model, AppResult};

/// BPE encoding used to estimate prompt size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Cl100kBase,
    P50kBase,
    R50kBase,
}

/// API surface a model answers on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Accepts a message list on `/chat/completions`
    ChatCapable,
    /// Accepts a flat prompt on `/completions`
    CompletionOnly,
}

/// Catalog entry
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub context_window: usize,
    pub encoding: Encoding,
    pub capability: Capability,
}

const fn chat(name: &'static str, context_window: usize) -> ModelSpec {
    ModelSpec {
        name,
        context_window,
        encoding: Encoding::Cl100kBase,
        capability: Capability::ChatCapable,
    }
}

const fn legacy(name: &'static str, context_window: usize, encoding: Encoding) -> ModelSpec {
    ModelSpec {
        name,
        context_window,
        encoding,
        capability: Capability::CompletionOnly,
    }
}

/// Every model name is matched exactly; Azure spells GPT-3.5 as `gpt-35`.
pub static MODELS: &[ModelSpec] = &[
    // OpenAI chat models
    chat("gpt-3.5-turbo", 4096),
    chat("gpt-3.5-turbo-0301", 4096),
    chat("gpt-3.5-turbo-0613", 4096),
    chat("gpt-3.5-turbo-16k", 16384),
    chat("gpt-3.5-turbo-16k-0613", 16384),
    // Azure chat deployments
    chat("gpt-35-turbo", 4096),
    chat("gpt-35-turbo-0301", 4096),
    chat("gpt-35-turbo-0613", 4096),
    chat("gpt-35-turbo-16k", 16384),
    // GPT-4 family, same spelling on both backends
    chat("gpt-4", 8192),
    chat("gpt-4-0314", 8192),
    chat("gpt-4-0613", 8192),
    chat("gpt-4-32k", 32768),
    chat("gpt-4-32k-0314", 32768),
    chat("gpt-4-32k-0613", 32768),
    // Legacy completion models
    legacy("text-davinci-003", 4097, Encoding::P50kBase),
    legacy("text-davinci-002", 4097, Encoding::P50kBase),
    legacy("code-davinci-002", 8001, Encoding::P50kBase),
    legacy("gpt-3.5-turbo-instruct", 4096, Encoding::Cl100kBase),
    legacy("gpt-35-turbo-instruct", 4096, Encoding::Cl100kBase),
    legacy("text-curie-001", 2049, Encoding::R50kBase),
    legacy("text-babbage-001", 2049, Encoding::R50kBase),
    legacy("text-ada-001", 2049, Encoding::R50kBase),
    legacy("davinci", 2049, Encoding::R50kBase),
];

/// Look up a model by exact name
pub fn lookup(model: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|spec| spec.name == model)
}

/// Look up a model, failing for names outside the catalog
pub fn require(model: &str) -> AppResult<&'static ModelSpec> {
    lookup(model).ok_or_else(|| unsupported_model(format!("no context window or tokenizer known for '{}'", model)))
}
