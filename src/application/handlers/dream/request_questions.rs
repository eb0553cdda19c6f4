//! RequestQuestionsHandler - Ask the interviewer for clarifying questions

use std::sync::Arc;

use crate::application::prompts;
use crate::domain::clarify::{questions_from_text, ClarifyingQuestion};
use crate::domain::dream::DreamDescription;
use crate::domain::foundation::SessionId;
use crate::domain::normalize::TolerantNormalizer;
use crate::ports::{AIError, AIProvider, CompletionRequest, RequestMetadata, RequestPurpose};

/// Command to request clarifying questions
#[derive(Debug, Clone)]
pub struct RequestQuestionsCommand {
    pub session_id: SessionId,
    pub description: DreamDescription,
}

/// Handler returning at most three questions. Unusable output is an empty
/// list; only transport failures are errors.
pub struct RequestQuestionsHandler<P: ?Sized + AIProvider> {
    ai_provider: Arc<P>,
    normalizer: TolerantNormalizer,
}

impl<P: ?Sized + AIProvider> RequestQuestionsHandler<P> {
    pub fn new(ai_provider: Arc<P>) -> Self {
        Self {
            ai_provider,
            normalizer: TolerantNormalizer,
        }
    }

    pub async fn handle(
        &self,
        cmd: RequestQuestionsCommand,
    ) -> Result<Vec<ClarifyingQuestion>, AIError> {
        let request = CompletionRequest::new(
            RequestPurpose::Questions,
            RequestMetadata::for_purpose(cmd.session_id, RequestPurpose::Questions),
        )
        .with_prompt(prompts::questions_prompt(&cmd.description))
        .with_temperature(prompts::QUESTIONS_TEMPERATURE);

        let response = self.ai_provider.complete(request).await?;
        let questions = questions_from_text(&self.normalizer, response.content.trim());
        tracing::debug!(session_id = %cmd.session_id, count = questions.len(), "Clarifying questions received");
        Ok(questions)
    }
}
