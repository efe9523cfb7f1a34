//! Token Budgeter
//!
//! Computes how many completion tokens a request may still ask for without
//! exceeding the model's context window

use super::catalog::{self, Capability, Encoding, ModelSpec};
use crate::models::Role;
use crate::utils::error::{AppError, AppResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use tiktoken_rs::CoreBPE;
use tracing::debug;

// Loading a BPE rank table is expensive; keep one per encoding for the process
static ENCODERS: Lazy<Mutex<HashMap<Encoding, CoreBPE>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn load(encoding: Encoding) -> AppResult<CoreBPE> {
    let bpe = match encoding {
        Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
        Encoding::P50kBase => tiktoken_rs::p50k_base(),
        Encoding::R50kBase => tiktoken_rs::r50k_base(),
    };
    bpe.map_err(|e| AppError::UnsupportedModel(format!("failed to load {:?} tokenizer: {}", encoding, e)))
}

/// Count the tokens of `text` under `encoding`
pub fn count_tokens(encoding: Encoding, text: &str) -> AppResult<usize> {
    let mut encoders = ENCODERS
        .lock()
        .map_err(|_| AppError::UnsupportedModel("tokenizer cache poisoned".to_string()))?;

    let bpe = match encoders.entry(encoding) {
        std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
        std::collections::hash_map::Entry::Vacant(entry) => entry.insert(load(encoding)?),
    };

    Ok(bpe.encode_with_special_tokens(text).len())
}

/// Join prompt parts the way the orchestrator sends them
pub fn join_prompt<S: AsRef<str>>(parts: &[S]) -> String {
    let mut prompt = String::new();
    for part in parts {
        prompt.push_str(part.as_ref());
        prompt.push('\n');
    }
    prompt
}

/// Tokens the reply is primed with on chat models
const REPLY_PRIMING_TOKENS: usize = 3;

/// Tokens a chat model spends on top of a single `user` message's content
fn chat_framing_tokens(spec: &ModelSpec) -> AppResult<usize> {
    // 0301 snapshots wrap every message in one extra token
    let per_message = if spec.name.ends_with("-0301") { 4 } else { 3 };
    Ok(per_message + count_tokens(spec.encoding, Role::User.as_str())? + REPLY_PRIMING_TOKENS)
}

/// Tokens `parts` cost on `spec` as actually sent
///
/// Chat-capable models receive the prompt as one `user` message and pay
/// the message framing on top of the text.
fn sent_prompt_tokens(spec: &ModelSpec, parts: &[impl AsRef<str>]) -> AppResult<usize> {
    let text = count_tokens(spec.encoding, &join_prompt(parts))?;
    match spec.capability {
        Capability::ChatCapable => Ok(text + chat_framing_tokens(spec)?),
        Capability::CompletionOnly => Ok(text),
    }
}

/// Remaining completion budget for `parts` on `model`
///
/// Fails with `UnsupportedModel` for models outside the catalog and with
/// `PromptTooLarge` when nothing is left for the completion.
pub fn compute_max_tokens<S: AsRef<str>>(parts: &[S], model: &str) -> AppResult<u32> {
    let spec = catalog::require(model)?;
    let prompt_tokens = sent_prompt_tokens(spec, parts)?;

    if prompt_tokens >= spec.context_window {
        return Err(AppError::PromptTooLarge {
            model: model.to_string(),
            prompt_tokens,
            context_window: spec.context_window,
        });
    }

    let remaining = spec.context_window - prompt_tokens;
    debug!(
        "Token budget for {}: {} prompt tokens, {} remaining of {}",
        model, prompt_tokens, remaining, spec.context_window
    );

    u32::try_from(remaining).map_err(|_| AppError::UnsupportedModel(format!("context window of '{}' out of range", model)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_budget_is_window_minus_prompt() {
        let history = vec!["Create an S3 bucket named logs".to_string()];
        let text = count_tokens(Encoding::P50kBase, &join_prompt(&history)).unwrap();
        let budget = compute_max_tokens(&history, "text-davinci-003").unwrap();

        assert!(text > 0);
        assert_eq!(budget as usize, 4097 - text);
    }

    #[test]
    fn test_chat_budget_leaves_room_for_message_framing() {
        let parts = ["You are a Terraform HCL generator.", "create an s3 bucket"];
        let budget = compute_max_tokens(&parts, "gpt-4").unwrap() as usize;

        let message = tiktoken_rs::ChatCompletionRequestMessage {
            role: "user".to_string(),
            content: Some(join_prompt(&parts)),
            ..Default::default()
        };
        let allowed = tiktoken_rs::get_chat_completion_max_tokens("gpt-4", &[message]).unwrap();

        assert!(budget <= allowed, "budget {} exceeds {}", budget, allowed);
        let text = count_tokens(Encoding::Cl100kBase, &join_prompt(&parts)).unwrap();
        assert!(budget + text < 8192);
    }

    #[test]
    fn test_legacy_chat_snapshot_framing() {
        let parts = ["vpc"];
        let current = compute_max_tokens(&parts, "gpt-3.5-turbo-0613").unwrap();
        let snapshot = compute_max_tokens(&parts, "gpt-3.5-turbo-0301").unwrap();

        assert_eq!(current, snapshot + 1);
    }

    #[test]
    fn test_prompt_too_large() {
        let history = vec!["resource ".repeat(5000)];
        let err = compute_max_tokens(&history, "text-davinci-003").unwrap_err();

        match err {
            AppError::PromptTooLarge { model, prompt_tokens, context_window } => {
                assert_eq!(model, "text-davinci-003");
                assert_eq!(context_window, 4097);
                assert!(prompt_tokens >= 4097);
            }
            other => panic!("Expected PromptTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let history = vec!["hello".to_string()];
        assert!(matches!(
            compute_max_tokens(&history, "my-custom-deployment"),
            Err(AppError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_join_prompt_one_part_per_line() {
        assert_eq!(join_prompt(&["a", "b"]), "a\nb\n");
        assert_eq!(join_prompt::<&str>(&[]), "");
    }
}
