//! Gemini Provider - Implementation of AIProvider for Google's Gemini API.
//!
//! Text requests go to the text model through `generateContent`; panorama
//! requests stream from the image model through `streamGenerateContent`
//! with Server-Sent Events, yielding inline image data as it arrives.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_text_model("gemini-2.5-flash")
//!     .with_image_model("gemini-2.5-flash-image-preview");
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! No retries happen here: a failed call surfaces immediately and the user
//! decides whether to start over.

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::sse::SseDecoder;
use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    MessageRole, ProviderInfo, StreamChunk, TokenUsage,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Finish reasons Gemini uses when a candidate is withheld on policy grounds.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model for text requests.
    pub text_model: String,
    /// Model for image requests.
    pub image_model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the text model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Sets the image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url, model)
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, model
        )
    }

    fn model_for(&self, request: &CompletionRequest) -> &str {
        if request.purpose.wants_image() {
            &self.config.image_model
        } else {
            &self.config.text_model
        }
    }

    /// Sends a request body and checks the status.
    async fn post(&self, url: String, body: &GeminiRequest) -> Result<Response, AIError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &error_body))
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let model = self.model_for(&request).to_string();
        tracing::debug!(
            purpose = %request.purpose,
            model = %model,
            trace_id = %request.metadata.trace_id,
            "Sending completion request"
        );

        let body = GeminiRequest::from_completion(&request);
        let response = self.post(self.generate_url(&model), &body).await?;

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        into_completion(gemini_response, model)
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let model = self.model_for(&request).to_string();
        tracing::debug!(
            purpose = %request.purpose,
            model = %model,
            trace_id = %request.metadata.trace_id,
            "Opening streaming request"
        );

        let body = GeminiRequest::from_completion(&request);
        let response = self.post(self.stream_url(&model), &body).await?;

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk_result| {
                let items: Vec<Result<StreamChunk, AIError>> = match chunk_result {
                    Ok(bytes) => decoder
                        .push(&bytes)
                        .into_iter()
                        .flat_map(|frame| parse_stream_frame(&frame.data))
                        .collect(),
                    Err(e) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
                };
                future::ready(Some(items))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.text_model, &self.config.image_model)
            .with_streaming(true)
    }
}

/// Maps a non-success status to an error.
fn error_for_status(status: StatusCode, error_body: &str) -> AIError {
    match status.as_u16() {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(error_body)),
        400 if error_body.contains("SAFETY") => AIError::content_filtered(error_body),
        400 | 404 => AIError::InvalidRequest(error_body.to_string()),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
    }
}

/// Reads `retryDelay` ("30s") from a RetryInfo error detail.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            parsed
                .get("error")?
                .get("details")?
                .as_array()?
                .iter()
                .find_map(|detail| detail.get("retryDelay")?.as_str().map(str::to_string))
        })
        .and_then(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
        .map(|secs| secs.ceil() as u32)
        .unwrap_or(30)
}

fn finish_reason_from(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("MAX_TOKENS") => FinishReason::Length,
        Some(r) if SAFETY_FINISH_REASONS.contains(&r) => FinishReason::ContentFilter,
        Some("STOP") | None => FinishReason::Stop,
        Some(_) => FinishReason::Error,
    }
}

/// Rejects responses Gemini withheld on safety grounds.
fn check_blocked(response: &GeminiResponse) -> Result<(), AIError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(AIError::content_filtered(format!("prompt blocked: {}", reason)));
    }
    let withheld = response
        .candidates
        .iter()
        .filter_map(|c| c.finish_reason.as_deref())
        .find(|r| SAFETY_FINISH_REASONS.contains(r));
    if let Some(reason) = withheld {
        return Err(AIError::content_filtered(format!("response withheld: {}", reason)));
    }
    Ok(())
}

fn usage_from(metadata: Option<&UsageMetadata>) -> TokenUsage {
    metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default()
}

/// Converts a `generateContent` response.
fn into_completion(response: GeminiResponse, model: String) -> Result<CompletionResponse, AIError> {
    check_blocked(&response)?;

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| AIError::empty_response("No candidates in response"))?;

    let content = candidate
        .content
        .as_ref()
        .map(|c| {
            c.parts
                .iter()
                .filter(|p| !p.thought.unwrap_or(false))
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        usage: usage_from(response.usage_metadata.as_ref()),
        model: response.model_version.clone().unwrap_or(model),
        finish_reason: finish_reason_from(candidate.finish_reason.as_deref()),
    })
}

/// Converts one SSE frame of a `streamGenerateContent` response.
fn parse_stream_frame(data: &str) -> Vec<Result<StreamChunk, AIError>> {
    let response = match serde_json::from_str::<GeminiResponse>(data) {
        Ok(response) => response,
        Err(e) => {
            return vec![Err(AIError::parse(format!(
                "Failed to parse SSE chunk: {}",
                e
            )))]
        }
    };

    if let Err(e) = check_blocked(&response) {
        return vec![Err(e)];
    }

    let mut results = Vec::new();
    let Some(candidate) = response.candidates.first() else {
        return results;
    };

    if let Some(content) = &candidate.content {
        for part in &content.parts {
            if let Some(inline) = &part.inline_data {
                results.push(Ok(StreamChunk::image(&inline.mime_type, &inline.data)));
            } else if let Some(text) = part.text.as_deref().filter(|t| !t.is_empty()) {
                if !part.thought.unwrap_or(false) {
                    results.push(Ok(StreamChunk::content(text)));
                }
            }
        }
    }

    if let Some(reason) = candidate.finish_reason.as_deref() {
        results.push(Ok(StreamChunk::final_chunk(
            finish_reason_from(Some(reason)),
            usage_from(response.usage_metadata.as_ref()),
        )));
    }

    results
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        MessageRole::User => "user",
                        MessageRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart::text(&msg.content)],
            })
            .collect();

        let system_instruction = request.system_prompt.as_ref().map(|prompt| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(prompt)],
        });

        let generation_config = GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            thinking_config: request
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
        };

        Self {
            contents,
            system_instruction,
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.max_output_tokens.is_none()
            && self.thinking_config.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{RequestMetadata, RequestPurpose};

    fn request(purpose: RequestPurpose) -> CompletionRequest {
        CompletionRequest::new(purpose, RequestMetadata::new(SessionId::new(), "trace-1"))
            .with_prompt("A dream about tides")
    }

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::new("test-key").with_base_url("http://localhost:9/v1beta/"))
            .unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_text_model("text-x")
            .with_image_model("image-x")
            .with_base_url("https://custom.example/v1/")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.text_model, "text-x");
        assert_eq!(config.image_model, "image-x");
        assert_eq!(config.base_url, "https://custom.example/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_debug_hides_key() {
        let config = GeminiConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn urls_and_models_follow_purpose() {
        let provider = provider();
        let panorama = request(RequestPurpose::Panorama);
        let title = request(RequestPurpose::Title);

        assert_eq!(provider.model_for(&panorama), DEFAULT_IMAGE_MODEL);
        assert_eq!(provider.model_for(&title), DEFAULT_TEXT_MODEL);
        assert_eq!(
            provider.generate_url("m"),
            "http://localhost:9/v1beta/models/m:generateContent"
        );
        assert_eq!(
            provider.stream_url("m"),
            "http://localhost:9/v1beta/models/m:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn request_serializes_generation_config() {
        let request = request(RequestPurpose::Title)
            .with_system_prompt("Be brief")
            .with_temperature(0.5)
            .with_max_tokens(16)
            .with_thinking_budget(0);
        let json = serde_json::to_value(GeminiRequest::from_completion(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "A dream about tides");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16);
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn bare_request_omits_generation_config() {
        let json =
            serde_json::to_value(GeminiRequest::from_completion(&request(RequestPurpose::Panorama)))
                .unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn completion_joins_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "internal", "thought": true},
                    {"text": "Glass "},
                    {"text": "Tide"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3},
            "modelVersion": "gemini-2.5-flash-001"
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let completion = into_completion(response, "fallback".into()).unwrap();

        assert_eq!(completion.content, "Glass Tide");
        assert_eq!(completion.model, "gemini-2.5-flash-001");
        assert_eq!(completion.usage, TokenUsage::new(12, 3));
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn max_tokens_maps_to_length() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "Cut"}]}, "finishReason": "MAX_TOKENS"}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let completion = into_completion(response, "m".into()).unwrap();
        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert_eq!(completion.model, "m");
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let err = into_completion(response, "m".into()).unwrap_err();
        assert!(err.is_safety_block());
    }

    #[test]
    fn empty_candidates_is_empty_response() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            into_completion(response, "m".into()),
            Err(AIError::EmptyResponse(_))
        ));
    }

    #[test]
    fn stream_frame_with_text_and_image() {
        let data = r#"{"candidates": [{"content": {"parts": [
            {"text": "Here is your panorama"},
            {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
        ]}}]}"#;
        let chunks: Vec<StreamChunk> = parse_stream_frame(data)
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].delta, "Here is your panorama");
        let image = chunks[1].inline_data.as_ref().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn stream_frame_with_finish_reason_is_final() {
        let data = r#"{"candidates": [{"content": {"parts": []}, "finishReason": "STOP"}],
                      "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 1290}}"#;
        let chunks = parse_stream_frame(data);
        let last = chunks.last().unwrap().as_ref().unwrap();
        assert!(last.is_final());
        assert_eq!(last.usage, Some(TokenUsage::new(5, 1290)));
    }

    #[test]
    fn stream_frame_safety_finish_is_error() {
        let data = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let chunks = parse_stream_frame(data);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].as_ref().unwrap_err().is_safety_block());
    }

    #[test]
    fn stream_frame_garbage_is_parse_error() {
        let chunks = parse_stream_frame("{not json");
        assert!(matches!(chunks[0], Err(AIError::Parse(_))));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, ""),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, ""),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AIError::RateLimited { retry_after_secs: 30 }
        ));
        assert!(matches!(
            error_for_status(StatusCode::SERVICE_UNAVAILABLE, "overloaded"),
            AIError::Unavailable { .. }
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "bad field"),
            AIError::InvalidRequest(_)
        ));
    }

    #[test]
    fn retry_delay_is_parsed() {
        let body = r#"{"error": {"code": 429, "details": [
            {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
            {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "17s"}
        ]}}"#;
        assert_eq!(parse_retry_after(body), 17);
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[test]
    fn provider_info_reports_models() {
        let info = provider().provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(info.image_model, DEFAULT_IMAGE_MODEL);
    }
}
