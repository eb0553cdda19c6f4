//! Application layer - Handlers and the session controller.
//!
//! Handlers wrap one model operation each; the controller sequences them
//! through the session's stages.

pub mod controller;
pub mod handlers;
pub mod prompts;

pub use controller::{DreamController, StageOutcome, StageResult, StageTask};
pub use handlers::{
    AnalyzeDreamCommand, AnalyzeDreamHandler, GenerateDreamscapeCommand,
    GenerateDreamscapeError, GenerateDreamscapeHandler, RequestQuestionsCommand,
    RequestQuestionsHandler,
};
