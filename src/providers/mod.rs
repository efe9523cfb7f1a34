//! Provider module
//!
//! Defines the backend client trait and the OpenAI / Azure OpenAI
//! implementations

pub mod azure;
pub mod http;
pub mod openai;
pub mod sse;

use crate::config::{BackendConfig, Settings};
use crate::models::CompletionRequest;
use crate::utils::error::AppResult;
use async_trait::async_trait;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A boxed stream of streaming results
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = AppResult<T>> + Send + 'a>>;

/// Decoded text fragments of a streaming completion, in arrival order
pub type FragmentStream = BoxStream<'static, String>;

/// The remote service a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAI,
    AzureOpenAI,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::OpenAI => write!(f, "openai"),
            Backend::AzureOpenAI => write!(f, "azure-openai"),
        }
    }
}

/// Capability contract shared by both backends
///
/// Every call takes the process cancellation token and returns
/// `AppError::Cancelled` once it fires.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// The backend this client is bound to for its whole life
    fn backend(&self) -> Backend;

    /// Legacy completion endpoint, non-streaming
    async fn completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String>;

    /// Chat completion endpoint, non-streaming
    async fn chat_completion(&self, request: &CompletionRequest, cancel: &CancellationToken) -> AppResult<String>;

    /// Legacy completion endpoint, streaming
    async fn completion_stream(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> AppResult<FragmentStream>;

    /// Chat completion endpoint, streaming
    async fn chat_completion_stream(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> AppResult<FragmentStream>;
}

/// Build the client for the configured backend
pub fn build_client(settings: &Settings) -> AppResult<Arc<dyn BackendClient>> {
    let client: Arc<dyn BackendClient> = match &settings.backend {
        BackendConfig::OpenAI { api_key, base_url } => Arc::new(OpenAIClient::new(
            base_url.clone(),
            api_key.clone(),
            settings.request.clone(),
        )?),
        BackendConfig::Azure { endpoint, api_key, deployment } => Arc::new(AzureOpenAIClient::new(
            endpoint.clone(),
            api_key.clone(),
            deployment.clone(),
            settings.request.clone(),
        )?),
    };

    info!("Using {} backend", client.backend());
    Ok(client)
}

/// Drive a streaming completion, handing each fragment to `on_fragment`
///
/// Returns once the sentinel is seen or the connection closes; fragments
/// already delivered stand even when a later event fails.
pub async fn stream_completion<F>(
    client: &dyn BackendClient,
    request: &CompletionRequest,
    cancel: &CancellationToken,
    on_fragment: F,
) -> AppResult<()>
where
    F: FnMut(String),
{
    let stream = client.completion_stream(request, cancel).await?;
    drain_fragments(stream, on_fragment).await
}

/// Consume a fragment stream in order
pub async fn drain_fragments<F>(mut stream: FragmentStream, mut on_fragment: F) -> AppResult<()>
where
    F: FnMut(String),
{
    while let Some(fragment) = stream.next().await {
        on_fragment(fragment?);
    }
    Ok(())
}

pub use azure::AzureOpenAIClient;
pub use openai::OpenAIClient;
