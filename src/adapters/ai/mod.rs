//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini text and image models (REST + SSE)
//! - `MockAIProvider` - Configurable mock for testing

mod gemini_provider;
mod mock_provider;
mod sse;

pub use gemini_provider::{
    GeminiConfig, GeminiProvider, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
};
pub use mock_provider::{MockAIProvider, MockError, MockResponse, PLACEHOLDER_PNG_BASE64};
pub use sse::{SseDecoder, SseFrame};
