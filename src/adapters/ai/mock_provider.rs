//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling the real model service.
//!
//! # Features
//!
//! - Pre-configured responses per request purpose (title, panorama, ...)
//! - Simulated delays for cancellation testing
//! - Error injection for degraded-path testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_text(RequestPurpose::Title, "Glass Tide Harbor")
//!     .with_image("image/png", PNG_BASE64)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(title_request).await?;
//! assert_eq!(response.content, "Glass Tide Harbor");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, RequestPurpose, StreamChunk, TokenUsage,
};

/// One-pixel transparent PNG, returned for panorama requests when nothing
/// else is queued.
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Mock AI provider for testing.
///
/// Responses are queued per purpose and consumed in order.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses by purpose.
    responses: Arc<Mutex<HashMap<RequestPurpose, VecDeque<MockResponse>>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return text (streamed word by word for streaming calls).
    Text(String),
    /// Stream some text followed by an inline image.
    Image { mime_type: String, data: String },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate a safety rejection.
    ContentFiltered { reason: String },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate a stream that ends without the expected payload.
    EmptyResponse,
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::EmptyResponse => AIError::empty_response("mock stream ended"),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            info: ProviderInfo::new("mock", "mock-text-1", "mock-image-1").with_streaming(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a text response for the given purpose.
    pub fn with_text(self, purpose: RequestPurpose, content: impl Into<String>) -> Self {
        self.with_response(purpose, MockResponse::Text(content.into()))
    }

    /// Queues an image for the next panorama request.
    pub fn with_image(self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.with_response(
            RequestPurpose::Panorama,
            MockResponse::Image {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        )
    }

    /// Queues an error for the given purpose.
    pub fn with_error(self, purpose: RequestPurpose, error: MockError) -> Self {
        self.with_response(purpose, MockResponse::Error(error))
    }

    /// Queues any response for the given purpose.
    pub fn with_response(self, purpose: RequestPurpose, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(purpose)
            .or_default()
            .push_back(response);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns the number of calls made for one purpose.
    pub fn calls_for(&self, purpose: RequestPurpose) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.purpose == purpose)
            .count()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Gets the next response for a purpose or a default.
    fn next_response(&self, purpose: RequestPurpose) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .get_mut(&purpose)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Self::default_response(purpose))
    }

    fn default_response(purpose: RequestPurpose) -> MockResponse {
        match purpose {
            RequestPurpose::Title => MockResponse::Text("Mock Dream Title".to_string()),
            RequestPurpose::Panorama => MockResponse::Image {
                mime_type: "image/png".to_string(),
                data: PLACEHOLDER_PNG_BASE64.to_string(),
            },
            RequestPurpose::ScenePlan | RequestPurpose::Questions => {
                MockResponse::Text("[]".to_string())
            }
            RequestPurpose::Analysis => MockResponse::Text("Mock response".to_string()),
        }
    }

    async fn record(&self, request: CompletionRequest) -> MockResponse {
        let purpose = request.purpose;
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.next_response(purpose)
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.record(request).await {
            MockResponse::Text(content) => Ok(CompletionResponse {
                usage: TokenUsage::new(10, content.split_whitespace().count() as u32),
                content,
                model: self.info.text_model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Image { .. } => Err(AIError::InvalidRequest(
                "image responses are only available through streaming".to_string(),
            )),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let response = self.record(request).await;

        let chunks: Vec<Result<StreamChunk, AIError>> = match response {
            MockResponse::Text(content) => content
                .split_whitespace()
                .map(|s| Ok(StreamChunk::content(format!("{} ", s))))
                .collect(),
            MockResponse::Image { mime_type, data } => vec![
                Ok(StreamChunk::content("Rendering your dream ")),
                Ok(StreamChunk::image(mime_type, data)),
            ],
            MockResponse::Error(err) => return Err(err.into()),
        };

        let final_chunk = stream::once(async move {
            Ok(StreamChunk::final_chunk(FinishReason::Stop, TokenUsage::new(10, 20)))
        });

        Ok(Box::pin(stream::iter(chunks).chain(final_chunk)))
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
