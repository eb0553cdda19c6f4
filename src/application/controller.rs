//! DreamController - Drives a dream session through its stages.
//!
//! The controller owns the session and is its only writer. Remote work is
//! handed out as [`StageTask`]s: `'static` futures that hold their own
//! `Arc` to the provider, so the caller can keep accepting input (most
//! importantly Dream Again) while a request is pending. A finished task is
//! fed back through [`DreamController::commit`], which applies the outcome
//! and dispatches the next stage's task, if any.
//!
//! ```ignore
//! let mut controller = DreamController::new(provider);
//! let mut next = controller.submit("A city of glass bells")?;
//! while let Some(task) = next {
//!     next = controller.commit(task.run().await)?;
//! }
//! ```

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::handlers::{
    AnalyzeDreamCommand, AnalyzeDreamHandler, GenerateDreamscapeCommand,
    GenerateDreamscapeError, GenerateDreamscapeHandler, RequestQuestionsCommand,
    RequestQuestionsHandler,
};
use crate::domain::clarify::{ClarifyPhase, ClarifyingQuestion, QAEntry};
use crate::domain::dream::{DreamAnalysis, GeneratedDream};
use crate::domain::session::{DreamSession, SessionError, Stage};
use crate::ports::{AIError, AIProvider};

/// What a finished task produced.
#[derive(Debug)]
pub enum StageOutcome {
    Questions(Result<Vec<ClarifyingQuestion>, AIError>),
    Analysis(Result<DreamAnalysis, AIError>),
    Dream(Result<GeneratedDream, GenerateDreamscapeError>),
}

/// A task's outcome together with the token it ran under.
///
/// `outcome` is `None` when the task stopped early because its token was
/// cancelled.
#[derive(Debug)]
pub struct StageResult {
    token: CancellationToken,
    outcome: Option<StageOutcome>,
}

impl StageResult {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn outcome(&self) -> Option<&StageOutcome> {
        self.outcome.as_ref()
    }
}

/// One outstanding remote request, bound to the session that issued it.
pub struct StageTask {
    stage: Stage,
    token: CancellationToken,
    future: BoxFuture<'static, StageOutcome>,
}

impl StageTask {
    /// Stage that dispatched this task.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Token that cancels this task.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs the request, returning early if the token is cancelled.
    pub async fn run(self) -> StageResult {
        let StageTask { token, future, .. } = self;
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            outcome = future => Some(outcome),
        };
        StageResult { token, outcome }
    }
}

impl std::fmt::Debug for StageTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageTask")
            .field("stage", &self.stage)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// Orchestrates one dream session at a time.
///
/// # Cancellation
///
/// Every task runs under a child of the session token. Dream Again cancels
/// the session token, which cancels whatever is in flight, and installs a
/// fresh one. Skipping clarification while questions are loading cancels
/// only that task. Results carrying a cancelled token are never written to
/// the session.
pub struct DreamController<P: ?Sized + AIProvider + 'static> {
    session: DreamSession,
    provider: Arc<P>,
    session_token: CancellationToken,
    in_flight: Option<CancellationToken>,
    ask_questions: bool,
}

impl<P: ?Sized + AIProvider + 'static> DreamController<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            session: DreamSession::new(),
            provider,
            session_token: CancellationToken::new(),
            in_flight: None,
            ask_questions: true,
        }
    }

    /// When disabled, clarification completes at once with an empty
    /// transcript and no question request is made.
    pub fn with_questions(mut self, ask: bool) -> Self {
        self.ask_questions = ask;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> &DreamSession {
        &self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    /// Whether a dispatched task has not been committed yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Accepts a description and dispatches the clarify stage.
    pub fn submit(&mut self, text: &str) -> Result<Option<StageTask>, SessionError> {
        self.session.submit(text)?;
        tracing::info!(session_id = %self.session.id(), stage = %self.stage(), "Dream submitted");
        self.advance()
    }

    pub fn answer_text(&mut self, question_id: &str, text: &str) -> Result<(), SessionError> {
        self.session.flow_mut()?.answer_text(question_id, text)?;
        Ok(())
    }

    pub fn select(&mut self, question_id: &str, choice: &str) -> Result<(), SessionError> {
        self.session.flow_mut()?.select(question_id, choice)?;
        Ok(())
    }

    pub fn clear_answer(&mut self, question_id: &str) -> Result<(), SessionError> {
        self.session.flow_mut()?.clear(question_id)?;
        Ok(())
    }

    /// Sends the answered questions on to analysis.
    pub fn submit_answers(&mut self) -> Result<Option<StageTask>, SessionError> {
        let transcript = self.session.flow_mut()?.submit()?;
        self.finish_clarification(transcript)
    }

    /// Moves on to analysis with an empty transcript. A pending question
    /// request is cancelled.
    pub fn skip_clarification(&mut self) -> Result<Option<StageTask>, SessionError> {
        let transcript = self.session.flow_mut()?.skip()?;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.finish_clarification(transcript)
    }

    /// Abandons the current dream from any stage.
    pub fn dream_again(&mut self) {
        self.session_token.cancel();
        self.session_token = CancellationToken::new();
        self.in_flight = None;
        let previous = *self.session.id();
        self.session.reset();
        tracing::info!(previous = %previous, session_id = %self.session.id(), "Dreaming again");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Task plumbing
    // ─────────────────────────────────────────────────────────────────────────

    /// Task for the current stage's entry action, if it has one and nothing
    /// is in flight.
    pub fn dispatch(&mut self) -> Option<StageTask> {
        if self.in_flight.is_some() || self.session.is_halted() {
            return None;
        }
        let description = self.session.description()?.clone();
        let session_id = *self.session.id();

        match self.session.stage() {
            Stage::Clarify => {
                let loading = self
                    .session
                    .clarification()
                    .is_some_and(|flow| flow.phase() == ClarifyPhase::Loading);
                if !loading {
                    return None;
                }
                let handler = RequestQuestionsHandler::new(Arc::clone(&self.provider));
                let cmd = RequestQuestionsCommand {
                    session_id,
                    description,
                };
                Some(self.spawn(Stage::Clarify, async move {
                    StageOutcome::Questions(handler.handle(cmd).await)
                }))
            }
            Stage::Analyzing => {
                let handler = AnalyzeDreamHandler::new(Arc::clone(&self.provider));
                let cmd = AnalyzeDreamCommand {
                    session_id,
                    description,
                    transcript: self.session.transcript().to_vec(),
                };
                Some(self.spawn(Stage::Analyzing, async move {
                    StageOutcome::Analysis(handler.handle(cmd).await)
                }))
            }
            Stage::Visualizing => {
                let handler = GenerateDreamscapeHandler::new(Arc::clone(&self.provider));
                let cmd = GenerateDreamscapeCommand {
                    session_id,
                    description,
                };
                Some(self.spawn(Stage::Visualizing, async move {
                    StageOutcome::Dream(handler.handle(cmd).await)
                }))
            }
            Stage::Input | Stage::Done => None,
        }
    }

    /// Applies a finished task and returns the next stage's task.
    ///
    /// Results from cancelled tasks are dropped without touching the
    /// session.
    pub fn commit(&mut self, result: StageResult) -> Result<Option<StageTask>, SessionError> {
        if result.is_cancelled() {
            tracing::debug!(session_id = %self.session.id(), "Discarding result of cancelled task");
            return Ok(None);
        }
        self.in_flight = None;
        let Some(outcome) = result.outcome else {
            return Ok(None);
        };
        let session_id = *self.session.id();

        match outcome {
            StageOutcome::Questions(Ok(questions)) => self.apply_questions(questions),
            StageOutcome::Questions(Err(e)) => {
                tracing::warn!(session_id = %session_id, error = %e, "Question request failed, continuing without questions");
                self.apply_questions(Vec::new())
            }
            StageOutcome::Analysis(Ok(analysis)) => {
                self.session.record_analysis(analysis)?;
                tracing::info!(session_id = %session_id, stage = %self.stage(), "Analysis recorded");
                self.advance()
            }
            StageOutcome::Analysis(Err(e)) => {
                tracing::error!(session_id = %session_id, error = %e, "Analysis failed");
                self.session.skip_analysis()?;
                self.advance()
            }
            StageOutcome::Dream(Ok(dream)) => {
                tracing::info!(
                    session_id = %session_id,
                    title = %dream.title,
                    objects = dream.object_count(),
                    "Dream visualized"
                );
                self.session.complete(dream)?;
                Ok(None)
            }
            StageOutcome::Dream(Err(e)) => {
                tracing::error!(session_id = %session_id, error = %e, "Visualization failed");
                self.session.halt(e.user_error())?;
                Ok(None)
            }
        }
    }

    /// Runs tasks to completion until the session waits on the user or
    /// reaches a terminal state.
    pub async fn drive(&mut self, first: Option<StageTask>) -> Result<(), SessionError> {
        let mut next = first;
        while let Some(task) = next {
            next = self.commit(task.run().await)?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<StageTask>, SessionError> {
        if self.stage() == Stage::Clarify && !self.ask_questions {
            return self.apply_questions(Vec::new());
        }
        Ok(self.dispatch())
    }

    fn apply_questions(
        &mut self,
        questions: Vec<ClarifyingQuestion>,
    ) -> Result<Option<StageTask>, SessionError> {
        match self.session.load_questions(questions)? {
            Some(transcript) => self.finish_clarification(transcript),
            None => {
                tracing::info!(
                    session_id = %self.session.id(),
                    count = self.session.questions().len(),
                    "Awaiting answers"
                );
                Ok(None)
            }
        }
    }

    fn finish_clarification(
        &mut self,
        transcript: Vec<QAEntry>,
    ) -> Result<Option<StageTask>, SessionError> {
        self.session.complete_clarification(transcript)?;
        tracing::info!(
            session_id = %self.session.id(),
            answers = self.session.transcript().len(),
            "Clarification complete"
        );
        self.advance()
    }

    fn spawn(
        &mut self,
        stage: Stage,
        future: impl Future<Output = StageOutcome> + Send + 'static,
    ) -> StageTask {
        let token = self.session_token.child_token();
        self.in_flight = Some(token.clone());
        StageTask {
            stage,
            token,
            future: Box::pin(future),
        }
    }
}
