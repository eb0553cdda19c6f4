//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Generative model service (text, streamed images)
//! - `DreamExporter` - Hands a finished dream to the viewer as files

mod ai_provider;
mod dream_exporter;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    InlineData, Message, MessageRole, ProviderInfo, RequestMetadata, RequestPurpose, StreamChunk,
    TokenUsage,
};
pub use dream_exporter::{DreamExporter, ExportError, ExportedDream};
