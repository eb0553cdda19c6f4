//! Dream handlers: one per remote operation of the pipeline.

mod analyze_dream;
mod generate_dreamscape;
mod request_questions;

pub use analyze_dream::{AnalyzeDreamCommand, AnalyzeDreamHandler};
pub use generate_dreamscape::{
    GenerateDreamscapeCommand, GenerateDreamscapeError, GenerateDreamscapeHandler,
};
pub use request_questions::{RequestQuestionsCommand, RequestQuestionsHandler};
