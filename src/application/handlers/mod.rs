//! Application handlers.
//!
//! Command handlers, one per remote operation of the dream pipeline.

pub mod dream;

pub use dream::{
    AnalyzeDreamCommand, AnalyzeDreamHandler, GenerateDreamscapeCommand,
    GenerateDreamscapeError, GenerateDreamscapeHandler, RequestQuestionsCommand,
    RequestQuestionsHandler,
};
