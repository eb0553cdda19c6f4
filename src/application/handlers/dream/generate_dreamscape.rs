//! GenerateDreamscapeHandler - Title, panorama and scene plan for a dream

use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;

use crate::application::prompts;
use crate::domain::dream::{
    plan_from_text, sanitize_title, DreamDescription, DreamImage, GeneratedDream, SceneObject,
};
use crate::domain::foundation::SessionId;
use crate::domain::normalize::TolerantNormalizer;
use crate::domain::session::DreamError;
use crate::ports::{AIError, AIProvider, CompletionRequest, RequestMetadata, RequestPurpose};

/// Command to visualize a dream
#[derive(Debug, Clone)]
pub struct GenerateDreamscapeCommand {
    pub session_id: SessionId,
    pub description: DreamDescription,
}

/// Error type for visualization
#[derive(Debug, Error)]
pub enum GenerateDreamscapeError {
    #[error("title request failed: {0}")]
    Title(#[source] AIError),

    #[error("panorama request failed: {0}")]
    Panorama(#[source] AIError),
}

impl GenerateDreamscapeError {
    fn source_error(&self) -> &AIError {
        match self {
            GenerateDreamscapeError::Title(e) | GenerateDreamscapeError::Panorama(e) => e,
        }
    }

    /// Message shown to the user.
    pub fn user_error(&self) -> DreamError {
        if self.source_error().is_safety_block() {
            DreamError::SafetyBlocked
        } else {
            DreamError::VisualizationFailed
        }
    }
}

/// Handler producing the finished dream.
///
/// Title and panorama are required; the scene plan is best effort and its
/// failure yields an image-only dream.
pub struct GenerateDreamscapeHandler<P: ?Sized + AIProvider> {
    ai_provider: Arc<P>,
    normalizer: TolerantNormalizer,
}

impl<P: ?Sized + AIProvider> GenerateDreamscapeHandler<P> {
    pub fn new(ai_provider: Arc<P>) -> Self {
        Self {
            ai_provider,
            normalizer: TolerantNormalizer,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateDreamscapeCommand,
    ) -> Result<GeneratedDream, GenerateDreamscapeError> {
        // 1. Title
        let title = self
            .request_title(&cmd)
            .await
            .map_err(GenerateDreamscapeError::Title)?;
        tracing::debug!(session_id = %cmd.session_id, title = %title, "Dream titled");

        // 2. Panorama
        let image = self
            .request_panorama(&cmd, &title)
            .await
            .map_err(GenerateDreamscapeError::Panorama)?;

        // 3. Scene plan, degrading to no objects
        let scene_objects = self.request_scene_plan(&cmd, &title).await;

        Ok(GeneratedDream::new(image, title, scene_objects))
    }

    async fn request_title(&self, cmd: &GenerateDreamscapeCommand) -> Result<String, AIError> {
        let request = CompletionRequest::new(
            RequestPurpose::Title,
            RequestMetadata::for_purpose(cmd.session_id, RequestPurpose::Title),
        )
        .with_prompt(prompts::title_prompt(&cmd.description))
        .with_temperature(prompts::TITLE_TEMPERATURE)
        .with_max_tokens(prompts::TITLE_MAX_TOKENS)
        .with_thinking_budget(prompts::NO_THINKING);

        let response = self.ai_provider.complete(request).await?;
        Ok(sanitize_title(response.content.trim()))
    }

    /// Streams the image request and stops at the first image chunk.
    async fn request_panorama(
        &self,
        cmd: &GenerateDreamscapeCommand,
        title: &str,
    ) -> Result<DreamImage, AIError> {
        let request = CompletionRequest::new(
            RequestPurpose::Panorama,
            RequestMetadata::for_purpose(cmd.session_id, RequestPurpose::Panorama),
        )
        .with_prompt(prompts::panorama_prompt(title, &cmd.description));

        let mut stream = self.ai_provider.stream_complete(request).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(inline) = chunk.inline_data {
                return Ok(DreamImage::new(inline.mime_type, inline.data));
            }
            if !chunk.delta.is_empty() {
                tracing::debug!(session_id = %cmd.session_id, text = %chunk.delta, "Ignoring panorama text");
            }
        }

        Err(AIError::empty_response(
            "No image data received from the AI model.",
        ))
    }

    async fn request_scene_plan(
        &self,
        cmd: &GenerateDreamscapeCommand,
        title: &str,
    ) -> Option<Vec<SceneObject>> {
        let request = CompletionRequest::new(
            RequestPurpose::ScenePlan,
            RequestMetadata::for_purpose(cmd.session_id, RequestPurpose::ScenePlan),
        )
        .with_prompt(prompts::scene_prompt(title, &cmd.description))
        .with_temperature(prompts::SCENE_TEMPERATURE)
        .with_max_tokens(prompts::SCENE_MAX_TOKENS)
        .with_thinking_budget(prompts::NO_THINKING);

        match self.ai_provider.complete(request).await {
            Ok(response) => {
                let plan = plan_from_text(&self.normalizer, &response.content);
                if plan.is_none() {
                    tracing::warn!(session_id = %cmd.session_id, "Scene plan unusable, proceeding without objects");
                }
                plan
            }
            Err(e) => {
                tracing::warn!(session_id = %cmd.session_id, error = %e, "Scene planning failed, proceeding without objects");
                None
            }
        }
    }
}
