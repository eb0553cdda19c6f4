//! Integration tests for the dream pipeline.
//!
//! These tests drive the controller end to end against the mock provider:
//! 1. Description submitted, clarifying questions requested
//! 2. Answers collected into a transcript
//! 3. Analysis recorded (or skipped with an advisory error)
//! 4. Panorama and scene plan generated, then exported to disk
//!
//! Degraded paths (safety rejection, scene-plan failure, question failure)
//! and Dream Again cancellation are covered as well.

use std::sync::Arc;
use std::time::Duration;

use dreamscape::adapters::ai::{MockAIProvider, MockError, PLACEHOLDER_PNG_BASE64};
use dreamscape::adapters::export::LocalFileExporter;
use dreamscape::application::{DreamController, StageOutcome};
use dreamscape::domain::clarify::QAEntry;
use dreamscape::domain::dream::PrimitiveShape;
use dreamscape::domain::session::{DreamError, SessionError, Stage};
use dreamscape::ports::{DreamExporter, RequestPurpose};

// =============================================================================
// Test Infrastructure
// =============================================================================

const QUESTIONS: &str = r#"Here you go:
```json
[
  {"id": "q1", "question": "How did the water feel?", "choices": ["warm", "cold", "weightless"], "multi": true},
  {"id": "q2", "question": "Was anyone with you?"},
  {"id": "q3", "question": "Did the whale speak?", "choices": ["yes", "no"]},
  {"id": "q4", "question": "This one is never shown"}
]
```"#;

const ANALYSIS: &str = r#"{
  "summary": "A calm descent into the unknown.",
  "emotions": ["wonder", "calm", "curiosity"],
  "themes": [{"name": "Depth", "description": "Exploring the hidden", "strength": 1.7}],
  "symbols": [{"symbol": "whale", "meaning": "guidance"}],
  "likelyFactors": ["a new job"],
  "suggestions": ["journal about the whale"],
  "confidence": 0.8,
  "narrative": "You sank gently, unafraid.",
  "intensity": 0.3,
}"#;

const SCENE: &str = r##"[
  {"type": "sphere", "position": [0, 1, -3], "color": "#3b82f6", "animation": "float"},
  {"type": "torus", "position": [20, -9, 0], "scale": [1, 2, "x"]}
]"##;

fn full_provider() -> MockAIProvider {
    MockAIProvider::new()
        .with_text(RequestPurpose::Questions, QUESTIONS)
        .with_text(RequestPurpose::Analysis, ANALYSIS)
        .with_text(RequestPurpose::Title, "1. \"Whale Song Descent\"")
        .with_image("image/png", PLACEHOLDER_PNG_BASE64)
        .with_text(RequestPurpose::ScenePlan, SCENE)
}

fn controller(provider: MockAIProvider) -> (DreamController<MockAIProvider>, Arc<MockAIProvider>) {
    let provider = Arc::new(provider);
    (DreamController::new(Arc::clone(&provider)), provider)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn whitespace_description_stays_at_input() {
    let (mut controller, provider) = controller(full_provider());

    let result = controller.submit(" \n\t ");

    assert!(matches!(
        result,
        Err(SessionError::Rejected(DreamError::EmptyDescription))
    ));
    assert_eq!(controller.stage(), Stage::Input);
    assert_eq!(
        controller.session().error().map(|e| e.to_string()).as_deref(),
        Some("Please describe your dream first.")
    );
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn full_dream_is_analyzed_visualized_and_exported() {
    let (mut controller, provider) = controller(full_provider());

    let task = controller.submit("I swam down to a whale who hummed").unwrap();
    controller.drive(task).await.unwrap();

    assert_eq!(controller.stage(), Stage::Clarify);
    let questions = controller.session().questions();
    assert_eq!(questions.len(), 3);
    assert!(questions[0].multi);
    assert!(!questions[2].multi);

    controller.select("q1", "cold").unwrap();
    controller.select("q1", "weightless").unwrap();
    controller.select("q1", "cold").unwrap();
    controller.answer_text("q2", "  my sister ").unwrap();
    controller.select("q3", "no").unwrap();
    controller.select("q3", "yes").unwrap();

    let task = controller.submit_answers().unwrap();
    controller.drive(task).await.unwrap();

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Done);
    assert!(session.error().is_none());
    assert_eq!(
        session.transcript(),
        &[
            QAEntry::new("How did the water feel?", "weightless"),
            QAEntry::new("Was anyone with you?", "my sister"),
            QAEntry::new("Did the whale speak?", "yes"),
        ]
    );

    let analysis = session.analysis().unwrap();
    assert_eq!(analysis.summary, "A calm descent into the unknown.");
    assert_eq!(analysis.themes[0].strength.value(), 1.0);
    assert_eq!(analysis.likely_factors, vec!["a new job".to_string()]);

    let dream = session.generated().unwrap();
    assert_eq!(dream.title, "Whale Song Descent");
    let objects = dream.scene_objects.as_ref().unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].shape, PrimitiveShape::Sphere);
    assert_eq!(objects[1].position, [8.0, -2.0, 0.0]);

    let order: Vec<RequestPurpose> = provider.get_calls().iter().map(|c| c.purpose).collect();
    assert_eq!(
        order,
        vec![
            RequestPurpose::Questions,
            RequestPurpose::Analysis,
            RequestPurpose::Title,
            RequestPurpose::Panorama,
            RequestPurpose::ScenePlan,
        ]
    );

    let dir = tempfile::tempdir().unwrap();
    let exporter = LocalFileExporter::new(dir.path());
    let exported = exporter.export(dream, session.analysis()).await.unwrap();
    assert!(exported.image_path.exists());
    let scene: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&exported.scene_path).unwrap()).unwrap();
    assert_eq!(scene["title"], "Whale Song Descent");
    assert_eq!(scene["sceneObjects"].as_array().unwrap().len(), 2);
    assert_eq!(scene["analysis"]["summary"], "A calm descent into the unknown.");
}

#[tokio::test]
async fn analysis_failure_still_reaches_done() {
    let (mut controller, provider) = controller(MockAIProvider::new().with_error(
        RequestPurpose::Analysis,
        MockError::RateLimited {
            retry_after_secs: 30,
        },
    ));

    let task = controller.submit("A train made of paper").unwrap();
    controller.drive(task).await.unwrap();

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Done);
    assert!(session.analysis().is_none());
    assert!(session.generated().is_some());
    assert_eq!(session.error(), Some(DreamError::AnalysisFailed));
    assert!(session.error().unwrap().is_advisory());
    assert_eq!(provider.calls_for(RequestPurpose::Analysis), 1);
}

#[tokio::test]
async fn safety_rejection_halts_until_dream_again() {
    let (mut controller, _) = controller(MockAIProvider::new().with_error(
        RequestPurpose::Title,
        MockError::ContentFiltered {
            reason: "SAFETY".into(),
        },
    ));

    let task = controller.submit("Something the model refuses").unwrap();
    controller.drive(task).await.unwrap();

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Visualizing);
    assert!(session.is_halted());
    assert!(session.generated().is_none());
    assert_eq!(session.error(), Some(DreamError::SafetyBlocked));
    assert!(controller.dispatch().is_none());

    controller.dream_again();
    assert_eq!(controller.stage(), Stage::Input);
    assert!(controller.session().error().is_none());
    assert!(!controller.session().is_halted());
}

#[tokio::test]
async fn other_generation_failures_use_generic_message() {
    let (mut controller, _) =
        controller(MockAIProvider::new().with_error(RequestPurpose::Panorama, MockError::EmptyResponse));

    let task = controller.submit("A bridge of birds").unwrap();
    controller.drive(task).await.unwrap();

    assert_eq!(
        controller.session().error(),
        Some(DreamError::VisualizationFailed)
    );
}

#[tokio::test]
async fn scene_plan_failure_gives_image_only_dream() {
    let (mut controller, _) = controller(
        MockAIProvider::new().with_text(RequestPurpose::ScenePlan, "I'd rather describe it in words."),
    );

    let task = controller.submit("A forest that breathes").unwrap();
    controller.drive(task).await.unwrap();

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Done);
    let dream = session.generated().unwrap();
    assert!(dream.scene_objects.is_none());
    assert_eq!(dream.object_count(), 0);
}

#[tokio::test]
async fn question_failure_auto_completes_clarification() {
    let (mut controller, _) = controller(MockAIProvider::new().with_error(
        RequestPurpose::Questions,
        MockError::Timeout { timeout_secs: 120 },
    ));

    let task = controller.submit("Flying over my old school").unwrap();
    controller.drive(task).await.unwrap();

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Done);
    assert!(session.transcript().is_empty());
    assert!(session.error().is_none());
}

#[tokio::test]
async fn skip_discards_answers() {
    let (mut controller, provider) = controller(full_provider());

    let task = controller.submit("I swam down to a whale who hummed").unwrap();
    controller.drive(task).await.unwrap();
    controller.answer_text("q2", "my sister").unwrap();

    let task = controller.skip_clarification().unwrap();
    controller.drive(task).await.unwrap();

    assert_eq!(controller.stage(), Stage::Done);
    assert!(controller.session().transcript().is_empty());
    let analysis_prompt = provider
        .get_calls()
        .into_iter()
        .find(|c| c.purpose == RequestPurpose::Analysis)
        .unwrap()
        .prompt_text();
    assert!(analysis_prompt.ends_with("Transcript: []"));
}

#[tokio::test(start_paused = true)]
async fn dream_again_drops_late_generation_result() {
    let (controller, provider) =
        controller(full_provider().with_delay(Duration::from_millis(500)));
    let mut controller = controller.with_questions(false);

    let analysis = controller.submit("I swam down to a whale who hummed").unwrap().unwrap();
    let generation = controller.commit(analysis.run().await).unwrap().unwrap();
    assert_eq!(generation.stage(), Stage::Visualizing);

    let token = generation.token().clone();
    let pending = tokio::spawn(generation.run());
    tokio::time::sleep(Duration::from_millis(100)).await;

    controller.dream_again();
    assert!(token.is_cancelled());

    let late = pending.await.unwrap();
    assert!(late.is_cancelled());
    assert!(!matches!(late.outcome(), Some(StageOutcome::Dream(Ok(_)))));
    assert!(controller.commit(late).unwrap().is_none());

    let session = controller.session();
    assert_eq!(session.stage(), Stage::Input);
    assert!(session.description().is_none());
    assert!(session.analysis().is_none());
    assert!(session.generated().is_none());
    assert_eq!(provider.calls_for(RequestPurpose::Panorama), 0);

    let next = controller.submit("A second, quieter dream").unwrap();
    controller.drive(next).await.unwrap();
    assert_eq!(controller.stage(), Stage::Done);
}
