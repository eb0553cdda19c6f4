//! AnalyzeDreamHandler - Structured analysis of a dream and its transcript

use std::sync::Arc;

use crate::application::prompts;
use crate::domain::clarify::QAEntry;
use crate::domain::dream::{DreamAnalysis, DreamDescription};
use crate::domain::foundation::SessionId;
use crate::domain::normalize::TolerantNormalizer;
use crate::ports::{AIError, AIProvider, CompletionRequest, RequestMetadata, RequestPurpose};

/// Command to analyze a dream
#[derive(Debug, Clone)]
pub struct AnalyzeDreamCommand {
    pub session_id: SessionId,
    pub description: DreamDescription,
    pub transcript: Vec<QAEntry>,
}

/// Handler producing a bounded analysis. Unstructured output is turned into
/// a synthesized analysis; only transport failures are errors.
pub struct AnalyzeDreamHandler<P: ?Sized + AIProvider> {
    ai_provider: Arc<P>,
    normalizer: TolerantNormalizer,
}

impl<P: ?Sized + AIProvider> AnalyzeDreamHandler<P> {
    pub fn new(ai_provider: Arc<P>) -> Self {
        Self {
            ai_provider,
            normalizer: TolerantNormalizer,
        }
    }

    pub async fn handle(&self, cmd: AnalyzeDreamCommand) -> Result<DreamAnalysis, AIError> {
        let request = CompletionRequest::new(
            RequestPurpose::Analysis,
            RequestMetadata::for_purpose(cmd.session_id, RequestPurpose::Analysis),
        )
        .with_prompt(prompts::analysis_prompt(&cmd.description, &cmd.transcript))
        .with_temperature(prompts::ANALYSIS_TEMPERATURE);

        let response = self.ai_provider.complete(request).await?;
        let raw = response.content.trim();
        tracing::debug!(session_id = %cmd.session_id, raw = %raw, "Raw analysis response");

        Ok(DreamAnalysis::from_model_output(&self.normalizer, raw))
    }
}
