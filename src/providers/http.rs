//! Shared HTTP transport
//!
//! Sending, cancellation, status classification and body decoding used by
//! both backend clients

use super::sse::EventStreamDecoder;
use super::BoxStream;
use crate::config::RequestConfig;
use crate::models::openai::ApiErrorResponse;
use crate::utils::error::{AppError, AppResult};
use futures::TryStreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// HTTP transport with one client for regular and one for streaming calls
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    stream_client: Client,
    api_version: String,
}

impl Transport {
    /// Create the transport with the configured timeouts
    pub fn new(request: &RequestConfig) -> AppResult<Self> {
        let user_agent = format!("{}/{}", crate::NAME, crate::VERSION);

        let client = Client::builder()
            .timeout(request.timeout())
            .user_agent(&user_agent)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let stream_client = Client::builder()
            .timeout(request.stream_timeout())
            .user_agent(&user_agent)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create streaming HTTP client: {}", e)))?;

        Ok(Self {
            client,
            stream_client,
            api_version: request.api_version.clone(),
        })
    }

    /// Start a JSON POST carrying the `api-version` query parameter
    pub fn post<B: Serialize>(&self, url: &str, body: &B, stream: bool) -> RequestBuilder {
        let client = if stream { &self.stream_client } else { &self.client };
        let builder = client
            .post(url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("Content-Type", "application/json")
            .json(body);

        if stream {
            builder.header("Accept", "text/event-stream")
        } else {
            builder
        }
    }

    /// Send a request, racing it against cancellation, and check the status
    pub async fn send(&self, builder: RequestBuilder, cancel: &CancellationToken) -> AppResult<Response> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = builder.send() => result?,
        };

        check_for_success(response, cancel).await
    }

    /// Send and decode a JSON success body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, cancel: &CancellationToken) -> AppResult<T> {
        let response = self.send(builder, cancel).await?;

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = response.bytes() => result?,
        };

        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse response body: {}", e);
            AppError::Decode(format!("invalid json response: {}", e))
        })
    }

    /// Send and decode the body as a stream of server-sent events
    pub async fn send_stream<T>(&self, builder: RequestBuilder, cancel: &CancellationToken) -> AppResult<BoxStream<'static, T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.send(builder, cancel).await?;
        debug!("Streaming response started");

        let body = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        );

        Ok(EventStreamDecoder::new(StreamReader::new(body)).into_stream(cancel.clone()))
    }
}

/// Classify the status; 200-299 is success, anything else decodes the error body
async fn check_for_success(response: Response, cancel: &CancellationToken) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = tokio::select! {
        _ = cancel.cancelled() => return Err(AppError::Cancelled),
        result = response.text() => result.map_err(|e| AppError::Transport(format!("failed to read error body: {}", e)))?,
    };

    let err = decode_error_body(status.as_u16(), &body);
    error!("Remote API request failed: {}", err);
    Err(err)
}

/// Build a remote error from a status code and raw body
pub fn decode_error_body(status: u16, body: &str) -> AppError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => AppError::RemoteApi {
            status,
            error_type: parsed.error.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: parsed.error.message,
        },
        Err(_) => AppError::RemoteApi {
            status,
            error_type: "unexpected".to_string(),
            message: body.to_string(),
        },
    }
}
