//! AI Provider Port - Interface for the generative model service.
//!
//! This port abstracts every call the dream pipeline makes to the model
//! service (titles, panoramas, scene plans, questions, analyses), so the
//! application layer never couples to a specific vendor API.
//!
//! # Design
//!
//! - Supports both streaming and non-streaming completions
//! - Streams carry either text deltas or inline image data
//! - Each request names its purpose so adapters can pick a model
//! - Error types for the failure modes the pipeline distinguishes (safety
//!   rejection vs. everything else)
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl AIProvider for EchoProvider {
//!     async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
//!         Ok(CompletionResponse {
//!             content: request.prompt_text(),
//!             usage: TokenUsage::default(),
//!             model: "echo".to_string(),
//!             finish_reason: FinishReason::Stop,
//!         })
//!     }
//!     // ... other methods
//! }
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

use crate::domain::foundation::SessionId;

/// Boxed stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AIError>> + Send>>;

/// Port for generative model interactions.
///
/// Implementations connect to the external service and translate between
/// its wire format and these types.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a single completion (non-streaming).
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Generate a streaming completion.
    ///
    /// Returns a stream of chunks as they arrive from the provider. Image
    /// requests yield inline image chunks interleaved with text.
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError>;

    /// Get provider information (name, models).
    fn provider_info(&self) -> ProviderInfo;
}

/// What a request is for. Adapters use it to pick a model; logs use it to
/// tell calls apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPurpose {
    Title,
    Panorama,
    ScenePlan,
    Questions,
    Analysis,
}

impl RequestPurpose {
    /// Returns true if the request expects image output.
    pub fn wants_image(&self) -> bool {
        matches!(self, RequestPurpose::Panorama)
    }
}

impl fmt::Display for RequestPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestPurpose::Title => "title",
            RequestPurpose::Panorama => "panorama",
            RequestPurpose::ScenePlan => "scene_plan",
            RequestPurpose::Questions => "questions",
            RequestPurpose::Analysis => "analysis",
        };
        write!(f, "{}", s)
    }
}

/// Request for AI completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// What the request is for.
    pub purpose: RequestPurpose,
    /// Conversation messages; the pipeline sends a single user prompt.
    pub messages: Vec<Message>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Reasoning budget in tokens; `Some(0)` disables model thinking.
    pub thinking_budget: Option<u32>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    /// Creates a new completion request with required metadata.
    pub fn new(purpose: RequestPurpose, metadata: RequestMetadata) -> Self {
        Self {
            purpose,
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            thinking_budget: None,
            metadata,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    /// Adds the user prompt.
    pub fn with_prompt(self, prompt: impl Into<String>) -> Self {
        self.with_message(MessageRole::User, prompt)
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Sets the thinking budget.
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// All user message text, joined by blank lines.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates a model message.
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input.
    User,
    /// Model response.
    Model,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Session the request belongs to.
    pub session_id: SessionId,
    /// Trace ID correlating the log lines of one request.
    pub trace_id: String,
}

impl RequestMetadata {
    /// Creates new request metadata.
    pub fn new(session_id: SessionId, trace_id: impl Into<String>) -> Self {
        Self {
            session_id,
            trace_id: trace_id.into(),
        }
    }

    /// Metadata with a trace id derived from the session and purpose.
    pub fn for_purpose(session_id: SessionId, purpose: RequestPurpose) -> Self {
        let trace_id = format!("{}-{}", session_id.short(), purpose);
        Self::new(session_id, trace_id)
    }
}

/// Response from AI completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Creates zero usage.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// An error occurred.
    Error,
}

/// Inline binary payload (base64) carried in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Streaming chunk from AI completion.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// New text in this chunk.
    pub delta: String,
    /// Image payload, when the chunk carries one.
    pub inline_data: Option<InlineData>,
    /// If present, generation is complete.
    pub finish_reason: Option<FinishReason>,
    /// Token usage (only present on final chunk).
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    /// Creates a text chunk.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            inline_data: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// Creates an image chunk.
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            delta: String::new(),
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            finish_reason: None,
            usage: None,
        }
    }

    /// Creates a final chunk with usage information.
    pub fn final_chunk(finish_reason: FinishReason, usage: TokenUsage) -> Self {
        Self {
            delta: String::new(),
            inline_data: None,
            finish_reason: Some(finish_reason),
            usage: Some(usage),
        }
    }

    /// Returns true if this is the final chunk.
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// Returns true if this chunk carries an image.
    pub fn is_image(&self) -> bool {
        self.inline_data.is_some()
    }
}

/// Provider information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "gemini", "mock").
    pub name: String,
    /// Model used for text requests.
    pub text_model: String,
    /// Model used for image requests.
    pub image_model: String,
    /// Whether streaming is supported.
    pub supports_streaming: bool,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(
        name: impl Into<String>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            text_model: text_model.into(),
            image_model: image_model.into(),
            supports_streaming: true,
        }
    }

    /// Sets streaming support.
    pub fn with_streaming(mut self, supports: bool) -> Self {
        self.supports_streaming = supports;
        self
    }

    /// Model serving the given purpose.
    pub fn model_for(&self, purpose: RequestPurpose) -> &str {
        if purpose.wants_image() {
            &self.image_model
        } else {
            &self.text_model
        }
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Content was blocked by the provider's safety policies.
    #[error("content filtered (SAFETY): {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The response ended without the expected payload.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an empty response error.
    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::EmptyResponse(message.into())
    }

    /// Returns true if the provider refused the content on safety grounds.
    pub fn is_safety_block(&self) -> bool {
        match self {
            AIError::ContentFiltered { .. } => true,
            other => other.to_string().contains("SAFETY"),
        }
    }
}
