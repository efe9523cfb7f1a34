//! Azure OpenAI client implementation
//!
//! Addresses a single deployment through the path and authenticates with
//! the `api-key` header

use super::http::Transport;
use super::{Backend, BackendClient, FragmentStream};
use crate::config::settings::validate_deployment_name;
use crate::config::RequestConfig;
use crate::models::openai::*;
use crate::models::CompletionRequest;
use crate::utils::error::{helpers::decode_error, AppResult};
use crate::utils::logging::summarize_request;
use async_trait::async_trait;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Azure OpenAI client bound to one deployment
pub struct AzureOpenAIClient {
    transport: Transport,
    endpoint: String,
    api_key: String,
    deployment: String,
}

impl AzureOpenAIClient {
    /// Create a client; the deployment name is validated before anything else
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        request: RequestConfig,
    ) -> AppResult<Self> {
        let deployment = deployment.into();
        validate_deployment_name(&deployment)?;

        Ok(Self {
            transport: Transport::new(&request)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            deployment,
        })
    }

    /// Build the per-deployment request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/openai/deployments/{}/{}", self.endpoint, self.deployment, endpoint)
    }

    fn check_deployment(&self, request: &CompletionRequest) {
        if request.model() != self.deployment {
            warn!(
                "Request addressed model {} but this client is bound to deployment {}",
                request.model(),
                self.deployment
            );
        }
    }
}

#[async_trait]
impl BackendClient for AzureOpenAIClient {
    fn backend(&self) -> Backend {
        Backend::AzureOpenAI
    }

    async fn completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String> {
        debug!("Sending Azure completion request: {}", summarize_request(request));
        self.check_deployment(request);

        let body = CompletionApiRequest::from_request(request, None, false);
        let builder = self
            .transport
            .post(&self.build_url("completions"), &body, false)
            .header("api-key", &self.api_key);

        let response: CompletionApiResponse = self.transport.send_json(builder, cancel).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| decode_error("completion response contained no choices"))
    }

    async fn chat_completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String> {
        debug!("Sending Azure chat completion request: {}", summarize_request(request));
        self.check_deployment(request);

        let body = ChatApiRequest::from_request(request, None, false);
        let builder = self
            .transport
            .post(&self.build_url("chat/completions"), &body, false)
            .header("api-key", &self.api_key);

        let response: ChatApiResponse = self.transport.send_json(builder, cancel).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| decode_error("chat completion response contained no choices"))
    }

    async fn completion_stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<FragmentStream> {
        debug!("Sending Azure streaming completion request: {}", summarize_request(request));
        self.check_deployment(request);

        let body = CompletionApiRequest::from_request(request, None, true);
        let builder = self
            .transport
            .post(&self.build_url("completions"), &body, true)
            .header("api-key", &self.api_key);

        let events = self.transport.send_stream::<CompletionApiResponse>(builder, cancel).await?;
        Ok(Box::pin(events.map(|event| {
            event.map(|e| e.first_text().unwrap_or_default().to_string())
        })))
    }

    async fn chat_completion_stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<FragmentStream> {
        debug!("Sending Azure streaming chat completion request: {}", summarize_request(request));
        self.check_deployment(request);

        let body = ChatApiRequest::from_request(request, None, true);
        let builder = self
            .transport
            .post(&self.build_url("chat/completions"), &body, true)
            .header("api-key", &self.api_key);

        let events = self.transport.send_stream::<ChatStreamChunk>(builder, cancel).await?;
        Ok(Box::pin(events.map(|event| {
            event.map(|e| e.first_delta().unwrap_or_default().to_string())
        })))
    }
}
