//! OpenAI client implementation
//!
//! Talks to the global OpenAI endpoint; the model is named in the request body

use super::http::Transport;
use super::{Backend, BackendClient, FragmentStream};
use crate::config::RequestConfig;
use crate::models::openai::*;
use crate::models::CompletionRequest;
use crate::utils::error::{helpers::decode_error, AppResult};
use crate::utils::logging::summarize_request;
use async_trait::async_trait;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// OpenAI client
pub struct OpenAIClient {
    transport: Transport,
    base_url: String,
    api_key: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, request: RequestConfig) -> AppResult<Self> {
        Ok(Self {
            transport: Transport::new(&request)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build the request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Build authorization header value
    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    fn completion_body(request: &CompletionRequest, stream: bool) -> CompletionApiRequest {
        CompletionApiRequest::from_request(request, Some(request.model().to_string()), stream)
    }

    fn chat_body(request: &CompletionRequest, stream: bool) -> ChatApiRequest {
        ChatApiRequest::from_request(request, Some(request.model().to_string()), stream)
    }
}

#[async_trait]
impl BackendClient for OpenAIClient {
    fn backend(&self) -> Backend {
        Backend::OpenAI
    }

    async fn completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String> {
        debug!("Sending OpenAI completion request: {}", summarize_request(request));

        let body = Self::completion_body(request, false);
        let builder = self
            .transport
            .post(&self.build_url("completions"), &body, false)
            .header("Authorization", self.auth_header());

        let response: CompletionApiResponse = self.transport.send_json(builder, cancel).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| decode_error("completion response contained no choices"))
    }

    async fn chat_completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String> {
        debug!("Sending OpenAI chat completion request: {}", summarize_request(request));

        let body = Self::chat_body(request, false);
        let builder = self
            .transport
            .post(&self.build_url("chat/completions"), &body, false)
            .header("Authorization", self.auth_header());

        let response: ChatApiResponse = self.transport.send_json(builder, cancel).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| decode_error("chat completion response contained no choices"))
    }

    async fn completion_stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<FragmentStream> {
        debug!("Sending OpenAI streaming completion request: {}", summarize_request(request));

        let body = Self::completion_body(request, true);
        let builder = self
            .transport
            .post(&self.build_url("completions"), &body, true)
            .header("Authorization", self.auth_header());

        let events = self.transport.send_stream::<CompletionApiResponse>(builder, cancel).await?;
        Ok(Box::pin(events.map(|event| {
            event.map(|e| e.first_text().unwrap_or_default().to_string())
        })))
    }

    async fn chat_completion_stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<FragmentStream> {
        debug!("Sending OpenAI streaming chat completion request: {}", summarize_request(request));

        let body = Self::chat_body(request, true);
        let builder = self
            .transport
            .post(&self.build_url("chat/completions"), &body, true)
            .header("Authorization", self.auth_header());

        let events = self.transport.send_stream::<ChatStreamChunk>(builder, cancel).await?;
        Ok(Box::pin(events.map(|event| {
            event.map(|e| e.first_delta().unwrap_or_default().to_string())
        })))
    }
}
