//! Completion Orchestrator
//!
//! Composes the prompt from the history, budgets it, routes it and invokes
//! the backend client

use super::{budget, router};
use crate::config::Settings;
use crate::models::CompletionRequest;
use crate::providers::{drain_fragments, BackendClient};
use crate::utils::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receives streamed fragments as they arrive
pub type FragmentSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The entry point the interactive loop drafts through
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String>;

    /// Complete without handing fragments to any sink
    ///
    /// Used for drafts that must not reach the template output.
    async fn complete_buffered(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.complete(history, model, directive, cancel).await
    }
}

/// Completion Orchestrator
pub struct Orchestrator {
    client: Arc<dyn BackendClient>,
    temperature: f32,
    model_mapping: HashMap<String, String>,
    fragment_sink: Option<FragmentSink>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn BackendClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
            model_mapping: HashMap::new(),
            fragment_sink: None,
        }
    }

    /// Build from settings, streaming to `sink` when streaming is enabled
    pub fn from_settings(client: Arc<dyn BackendClient>, settings: &Settings, sink: Option<FragmentSink>) -> Self {
        let mut orchestrator = Self::new(client, settings.temperature).with_model_mapping(settings.model_mapping.clone());
        if settings.stream {
            orchestrator.fragment_sink = sink;
        }
        orchestrator
    }

    /// Route and budget custom deployment names as the mapped known model
    pub fn with_model_mapping(mut self, model_mapping: HashMap<String, String>) -> Self {
        self.model_mapping = model_mapping;
        self
    }

    /// Stream completions, handing each fragment to `sink`
    pub fn with_fragment_sink(mut self, sink: FragmentSink) -> Self {
        self.fragment_sink = Some(sink);
        self
    }

    fn known_model<'a>(&'a self, model: &'a str) -> &'a str {
        self.model_mapping.get(model).map(String::as_str).unwrap_or(model)
    }

    /// Build the request a call would send
    ///
    /// Directive first, then every history entry, one per line.
    pub fn build_request(&self, history: &[String], model: &str, directive: &str) -> AppResult<CompletionRequest> {
        let mut parts: Vec<&str> = Vec::with_capacity(history.len() + 1);
        parts.push(directive);
        parts.extend(history.iter().map(String::as_str));

        let max_tokens = budget::compute_max_tokens(&parts, self.known_model(model))?;
        let prompt = budget::join_prompt(&parts);

        Ok(CompletionRequest::new(model, prompt, self.temperature, max_tokens))
    }

    /// Draft a completion for `history` under `directive`
    ///
    /// Returns the decoded text verbatim; never retries.
    pub async fn get_completion(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.dispatch(history, model, directive, self.fragment_sink.as_ref(), cancel)
            .await
    }

    /// Like `get_completion`, but never streams to the fragment sink
    pub async fn get_buffered_completion(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.dispatch(history, model, directive, None, cancel).await
    }

    async fn dispatch(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        sink: Option<&FragmentSink>,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let request = self.build_request(history, model, directive)?;
        let variant = router::route(self.client.backend(), self.known_model(model));

        debug!(
            "Requesting {:?} completion with {} history entries, max_tokens {}",
            variant,
            history.len(),
            request.max_tokens()
        );

        match sink {
            None if variant.is_chat() => self.client.chat_completion(&request, cancel).await,
            None => self.client.completion(&request, cancel).await,
            Some(sink) => {
                let stream = if variant.is_chat() {
                    self.client.chat_completion_stream(&request, cancel).await?
                } else {
                    self.client.completion_stream(&request, cancel).await?
                };

                let mut text = String::new();
                drain_fragments(stream, |fragment| {
                    sink(&fragment);
                    text.push_str(&fragment);
                })
                .await?;
                Ok(text)
            }
        }
    }
}

#[async_trait]
impl Completer for Orchestrator {
    async fn complete(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.get_completion(history, model, directive, cancel).await
    }

    async fn complete_buffered(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.get_buffered_completion(history, model, directive, cancel).await
    }
}
