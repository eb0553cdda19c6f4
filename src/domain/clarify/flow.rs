//! Question-and-answer dialogue held between description and analysis.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::question::ClarifyingQuestion;
use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle of the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarifyPhase {
    /// Waiting for the interviewer's questions.
    #[default]
    Loading,
    /// Questions shown, answers being collected.
    AwaitingAnswers,
    /// Transcript emitted; the flow accepts no further input.
    Submitted,
}

impl StateMachine for ClarifyPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ClarifyPhase::*;
        matches!(
            (self, target),
            (Loading, AwaitingAnswers) | (Loading, Submitted) | (AwaitingAnswers, Submitted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ClarifyPhase::*;
        match self {
            Loading => vec![AwaitingAnswers, Submitted],
            AwaitingAnswers => vec![Submitted],
            Submitted => vec![],
        }
    }
}

/// One answered question, as handed to the analyst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAEntry {
    pub question: String,
    pub answer: String,
}

impl QAEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A pending answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Choice(String),
    /// Selected choices in the order they were picked.
    Multi(Vec<String>),
}

impl Answer {
    /// The answer as transcript text, before trimming.
    pub fn render(&self) -> String {
        match self {
            Answer::Text(text) | Answer::Choice(text) => text.clone(),
            Answer::Multi(picked) => picked.join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClarifyError {
    #[error("No question with id '{0}'")]
    UnknownQuestion(String),

    #[error("'{choice}' is not offered for question '{id}'")]
    ChoiceNotOffered { id: String, choice: String },

    #[error(transparent)]
    Phase(#[from] ValidationError),
}

/// Clarification dialogue state.
#[derive(Debug, Clone, Default)]
pub struct ClarificationFlow {
    phase: ClarifyPhase,
    questions: Vec<ClarifyingQuestion>,
    answers: HashMap<String, Answer>,
}

impl ClarificationFlow {
    /// Starts a flow waiting for questions.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> ClarifyPhase {
        self.phase
    }

    pub fn questions(&self) -> &[ClarifyingQuestion] {
        &self.questions
    }

    pub fn answer_for(&self, id: &str) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == ClarifyPhase::Submitted
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Installs the interviewer's questions.
    ///
    /// With no questions the flow completes at once and the empty transcript
    /// is returned; otherwise `None` and the flow awaits answers.
    pub fn load(
        &mut self,
        questions: Vec<ClarifyingQuestion>,
    ) -> Result<Option<Vec<QAEntry>>, ClarifyError> {
        if questions.is_empty() {
            self.phase = self.phase.transition_to(ClarifyPhase::Submitted)?;
            return Ok(Some(Vec::new()));
        }
        self.phase = self.phase.transition_to(ClarifyPhase::AwaitingAnswers)?;
        self.questions = questions;
        self.answers.clear();
        Ok(None)
    }

    /// Sets a free-text answer, replacing any previous answer.
    pub fn answer_text(&mut self, id: &str, text: impl Into<String>) -> Result<(), ClarifyError> {
        self.question(id)?;
        self.answers.insert(id.to_string(), Answer::Text(text.into()));
        Ok(())
    }

    /// Picks a choice. Multi-select questions toggle the choice in or out of
    /// the selection; single-select questions replace the answer.
    pub fn select(&mut self, id: &str, choice: &str) -> Result<(), ClarifyError> {
        let question = self.question(id)?;
        if !question.offers(choice) {
            return Err(ClarifyError::ChoiceNotOffered {
                id: id.to_string(),
                choice: choice.to_string(),
            });
        }
        let multi = question.multi;

        if multi {
            let mut picked = match self.answers.remove(id) {
                Some(Answer::Multi(picked)) => picked,
                _ => Vec::new(),
            };
            match picked.iter().position(|c| c == choice) {
                Some(at) => {
                    picked.remove(at);
                }
                None => picked.push(choice.to_string()),
            }
            self.answers.insert(id.to_string(), Answer::Multi(picked));
        } else {
            self.answers
                .insert(id.to_string(), Answer::Choice(choice.to_string()));
        }
        Ok(())
    }

    /// Clears the answer to one question.
    pub fn clear(&mut self, id: &str) -> Result<(), ClarifyError> {
        self.question(id)?;
        self.answers.remove(id);
        Ok(())
    }

    /// Emits the transcript: questions in their original order, each with a
    /// non-empty trimmed answer. Unanswered questions are left out.
    pub fn submit(&mut self) -> Result<Vec<QAEntry>, ClarifyError> {
        self.phase = self.phase.transition_to(ClarifyPhase::Submitted)?;
        let transcript = self
            .questions
            .iter()
            .filter_map(|q| {
                let answer = self.answers.get(&q.id)?.render();
                let answer = answer.trim();
                (!answer.is_empty()).then(|| QAEntry::new(q.question.clone(), answer))
            })
            .collect();
        Ok(transcript)
    }

    /// Abandons the dialogue, emitting an empty transcript.
    pub fn skip(&mut self) -> Result<Vec<QAEntry>, ClarifyError> {
        self.phase = self.phase.transition_to(ClarifyPhase::Submitted)?;
        Ok(Vec::new())
    }

    fn question(&self, id: &str) -> Result<&ClarifyingQuestion, ClarifyError> {
        if self.phase != ClarifyPhase::AwaitingAnswers {
            return Err(ValidationError::invalid_transition(
                format!("{:?}", self.phase),
                "answering",
            )
            .into());
        }
        self.questions
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| ClarifyError::UnknownQuestion(id.to_string()))
    }
}
