//! Dream session aggregate.
//!
//! Holds everything produced for the dream currently being worked on. The
//! controller is the only writer; every mutation below is a stage
//! transition or an update the current stage allows.

use crate::domain::clarify::{ClarificationFlow, ClarifyingQuestion, QAEntry};
use crate::domain::dream::{DreamAnalysis, DreamDescription, GeneratedDream};
use crate::domain::foundation::{SessionId, StateMachine, Timestamp, ValidationError};

use super::errors::{DreamError, SessionError};
use super::stage::Stage;

/// The single active dream session.
///
/// # Invariants
///
/// - `description` is set in every stage after `Input`
/// - `clarification` exists only while in `Clarify`
/// - `generated` is set only in `Done`
/// - `halted` is set only in `Visualizing`, after a failed generation
#[derive(Debug, Clone)]
pub struct DreamSession {
    id: SessionId,
    stage: Stage,
    description: Option<DreamDescription>,
    clarification: Option<ClarificationFlow>,
    transcript: Vec<QAEntry>,
    analysis: Option<DreamAnalysis>,
    generated: Option<GeneratedDream>,
    error: Option<DreamError>,
    halted: bool,
    started_at: Timestamp,
}

impl Default for DreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DreamSession {
    /// Creates a session waiting for a description.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            stage: Stage::Input,
            description: None,
            clarification: None,
            transcript: Vec::new(),
            analysis: None,
            generated: None,
            error: None,
            halted: false,
            started_at: Timestamp::now(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn description(&self) -> Option<&DreamDescription> {
        self.description.as_ref()
    }

    pub fn clarification(&self) -> Option<&ClarificationFlow> {
        self.clarification.as_ref()
    }

    /// Questions currently shown, empty outside `Clarify`.
    pub fn questions(&self) -> &[ClarifyingQuestion] {
        self.clarification
            .as_ref()
            .map(ClarificationFlow::questions)
            .unwrap_or_default()
    }

    pub fn transcript(&self) -> &[QAEntry] {
        &self.transcript
    }

    pub fn analysis(&self) -> Option<&DreamAnalysis> {
        self.analysis.as_ref()
    }

    pub fn generated(&self) -> Option<&GeneratedDream> {
        self.generated.as_ref()
    }

    pub fn error(&self) -> Option<DreamError> {
        self.error
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Accepts the description and enters `Clarify`.
    ///
    /// Empty text leaves the stage unchanged and records
    /// [`DreamError::EmptyDescription`].
    pub fn submit(&mut self, text: &str) -> Result<(), SessionError> {
        self.expect_stage(Stage::Input, Stage::Clarify)?;
        let description = match DreamDescription::new(text) {
            Ok(description) => description,
            Err(_) => {
                self.error = Some(DreamError::EmptyDescription);
                return Err(DreamError::EmptyDescription.into());
            }
        };

        self.stage = self.stage.transition_to(Stage::Clarify)?;
        self.description = Some(description);
        self.clarification = Some(ClarificationFlow::new());
        self.transcript.clear();
        self.analysis = None;
        self.generated = None;
        self.error = None;
        Ok(())
    }

    /// Installs the interviewer's questions. Returns the (empty) transcript
    /// when there is nothing to ask.
    pub fn load_questions(
        &mut self,
        questions: Vec<ClarifyingQuestion>,
    ) -> Result<Option<Vec<QAEntry>>, SessionError> {
        Ok(self.flow_mut()?.load(questions)?)
    }

    /// Mutable access to the dialogue while in `Clarify`.
    pub fn flow_mut(&mut self) -> Result<&mut ClarificationFlow, SessionError> {
        self.expect_stage(Stage::Clarify, Stage::Clarify)?;
        self.clarification
            .as_mut()
            .ok_or_else(|| ValidationError::empty_field("clarification").into())
    }

    /// Leaves `Clarify` with the transcript; the questions are discarded.
    pub fn complete_clarification(&mut self, transcript: Vec<QAEntry>) -> Result<(), SessionError> {
        self.stage = self.stage.transition_to(Stage::Analyzing)?;
        self.clarification = None;
        self.transcript = transcript;
        Ok(())
    }

    /// Stores the analysis and enters `Visualizing`.
    pub fn record_analysis(&mut self, analysis: DreamAnalysis) -> Result<(), SessionError> {
        self.stage = self.stage.transition_to(Stage::Visualizing)?;
        self.analysis = Some(analysis);
        Ok(())
    }

    /// Enters `Visualizing` without an analysis, leaving an advisory error.
    pub fn skip_analysis(&mut self) -> Result<(), SessionError> {
        self.stage = self.stage.transition_to(Stage::Visualizing)?;
        self.analysis = None;
        self.error = Some(DreamError::AnalysisFailed);
        Ok(())
    }

    /// Stores the finished dream and enters `Done`. An advisory error from
    /// analysis stays visible.
    pub fn complete(&mut self, dream: GeneratedDream) -> Result<(), SessionError> {
        if self.halted {
            return Err(SessionError::Halted);
        }
        self.stage = self.stage.transition_to(Stage::Done)?;
        self.generated = Some(dream);
        Ok(())
    }

    /// Records a failed generation. The session stays in `Visualizing` and
    /// accepts nothing but a restart.
    pub fn halt(&mut self, error: DreamError) -> Result<(), SessionError> {
        self.expect_stage(Stage::Visualizing, Stage::Visualizing)?;
        self.halted = true;
        self.error = Some(error);
        Ok(())
    }

    /// Discards everything and returns to `Input` under a fresh id.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn expect_stage(&self, expected: Stage, target: Stage) -> Result<(), SessionError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ValidationError::invalid_transition(self.stage.to_string(), target.to_string()).into())
        }
    }
}
