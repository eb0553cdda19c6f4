//! Clarification dialogue: interviewer questions and the user's answers.

pub mod flow;
pub mod question;

pub use flow::{Answer, ClarificationFlow, ClarifyError, ClarifyPhase, QAEntry};
pub use question::{
    questions_from_text, questions_from_value, ClarifyingQuestion, MAX_CHOICES, MAX_QUESTIONS,
};
