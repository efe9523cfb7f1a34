//! OpenAI API data models
//!
//! Request and response structures shared by the OpenAI and Azure OpenAI
//! completion and chat completion endpoints

use super::CompletionRequest;
use serde::{Deserialize, Serialize};

/// Legacy completion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionApiRequest {
    /// Model name (omitted for Azure, where the deployment is in the path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature parameter
    pub temperature: f32,
    /// Whether to stream the response
    pub stream: bool,
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatApiRequest {
    /// Model name (omitted for Azure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Message list
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature parameter
    pub temperature: f32,
    /// Whether to stream the response
    pub stream: bool,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (user/assistant/system)
    pub role: String,
    /// Message content
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionApiRequest {
    pub fn from_request(request: &CompletionRequest, model: Option<String>, stream: bool) -> Self {
        Self {
            model,
            prompt: request.prompt().to_string(),
            max_tokens: request.max_tokens(),
            temperature: request.temperature(),
            stream,
        }
    }
}

impl ChatApiRequest {
    /// Wrap the prompt as a single message carrying the request's role
    pub fn from_request(request: &CompletionRequest, model: Option<String>, stream: bool) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: request.role().as_str().to_string(),
                content: Some(request.prompt().to_string()),
            }],
            max_tokens: request.max_tokens(),
            temperature: request.temperature(),
            stream,
        }
    }
}

/// Legacy completion response (also the shape of each streamed event)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionApiResponse {
    /// Response ID
    #[serde(default)]
    pub id: String,
    /// Object type
    #[serde(default)]
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Choice list
    pub choices: Vec<CompletionChoice>,
    /// Usage statistics (absent on streamed events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Legacy completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    /// Generated text
    #[serde(default)]
    pub text: String,
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatApiResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Streamed chat completion chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatStreamChoice>,
}

/// Streamed chat choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChatDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Streamed chat delta
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt token count
    pub prompt_tokens: u32,
    /// Completion token count
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total token count
    pub total_tokens: u32,
}

/// OpenAI error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error information
    pub error: ApiErrorBody,
}

/// OpenAI error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error message
    pub message: String,
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
}

impl CompletionApiResponse {
    /// Text of the first choice
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

impl ChatApiResponse {
    /// Content of the first choice's message
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.message.content.as_deref().unwrap_or_default())
    }
}

impl ChatStreamChunk {
    /// Delta content of the first choice, empty for role-only deltas
    pub fn first_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.delta.content.as_deref().unwrap_or_default())
    }
}
