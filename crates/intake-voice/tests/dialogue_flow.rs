//! End-to-end dialogue tests against an in-process `/process_speech` backend.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use intake_voice::prompts::{INITIAL_PROMPT, RECOGNITION_ERROR, TRANSPORT_ERROR};
use intake_voice::validation::SpeechRequest;
use intake_voice::{
    DialogueSession, HttpValidationClient, IntakeConfig, IntakeError, MemoryTranscript,
    RecognitionError, ScriptedRecognizer, Sender, TriggerHandle, ValidationClient,
    ValidationOutcome,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the validation service.
#[derive(Clone, Default)]
struct Backend {
    replies: Arc<Mutex<VecDeque<Value>>>,
    received: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

async fn process_speech(State(backend): State<Backend>, Json(req): Json<SpeechRequest>) -> Json<Value> {
    backend.received.lock().unwrap().push(req.speech_text);
    let reply = backend
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| json!({"response": "Error: No speech input detected."}));
    Json(reply)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_backend(replies: Vec<Value>) -> (String, Backend) {
    let backend = Backend {
        replies: Arc::new(Mutex::new(replies.into())),
        received: Arc::default(),
    };
    let app = Router::new()
        .route("/process_speech", post(process_speech))
        .with_state(backend.clone());
    (serve(app).await, backend)
}

/// An address nothing listens on.
async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn session_for(
    endpoint: String,
    recognizer: Arc<ScriptedRecognizer>,
) -> (DialogueSession, TriggerHandle, MemoryTranscript) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = IntakeConfig {
        endpoint,
        ..Default::default()
    };
    let transcript = MemoryTranscript::new();
    let (session, triggers) =
        DialogueSession::from_config(&config, Box::new(transcript.clone()), recognizer)
            .expect("session");
    (session, triggers, transcript)
}

/// Press the capture button and let the turn play out.
async fn press(session: &mut DialogueSession, triggers: &TriggerHandle) {
    triggers.trigger().unwrap();
    assert!(session.step().await);
    session.run_until_idle().await;
}

#[tokio::test]
async fn full_intake_scenario() {
    let (url, backend) = spawn_backend(vec![
        json!({
            "response": "Error: Invalid or missing values for features: RDW level. Please provide these values again.",
            "invalid_features": ["RDW level"]
        }),
        json!({"response": "Recorded."}),
    ])
    .await;
    let recognizer = Arc::new(ScriptedRecognizer::with_transcripts(["65 male", "14.5"]));
    let (mut session, triggers, transcript) = session_for(url, recognizer.clone());

    // trigger 1: opening prompt only
    press(&mut session, &triggers).await;
    assert_eq!(transcript.bot_messages(), vec![INITIAL_PROMPT.to_string()]);
    assert_eq!(recognizer.sessions_started(), 0);

    // trigger 2: whole answer goes out as-is, one feature rejected
    press(&mut session, &triggers).await;
    assert_eq!(backend.received(), vec!["65 male".to_string()]);
    assert_eq!(
        transcript.last().unwrap().message,
        "Please re-enter the value for the following features: RDW level."
    );
    assert_eq!(
        session.controller().pending_invalid_features().names(),
        vec!["RDW level"]
    );

    // trigger 3: answer is tagged with the rejected feature
    press(&mut session, &triggers).await;
    assert_eq!(
        backend.received(),
        vec!["65 male".to_string(), "RDW level: 14.5".to_string()]
    );
    assert_eq!(transcript.last().unwrap().message, "Recorded.");
    assert!(session.controller().pending_invalid_features().is_empty());

    assert_eq!(recognizer.locales(), vec!["en-US".to_string(), "en-US".to_string()]);
    let senders: Vec<Sender> = transcript.entries().iter().map(|e| e.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::Bot, Sender::User, Sender::Bot, Sender::User, Sender::Bot]
    );
}

#[tokio::test]
async fn session_start_then_first_trigger_listens() {
    let (url, backend) = spawn_backend(vec![json!({"response": "Risk: low"})]).await;
    let recognizer = Arc::new(ScriptedRecognizer::with_transcripts(["male"]));
    let (mut session, triggers, transcript) = session_for(url, recognizer.clone());

    session.start();
    session.run_until_idle().await;
    assert!(session.controller().state().initial_prompt_given());
    assert_eq!(transcript.bot_messages(), vec![INITIAL_PROMPT.to_string()]);

    press(&mut session, &triggers).await;
    assert_eq!(recognizer.sessions_started(), 1);
    assert_eq!(backend.received(), vec!["male".to_string()]);
    assert_eq!(transcript.last().unwrap().message, "Risk: low");
}

#[tokio::test]
async fn reentry_list_replaces_queue_in_order() {
    let (url, _backend) = spawn_backend(vec![json!({"invalid_features": ["RDW level", "gender"]})]).await;
    let recognizer = Arc::new(ScriptedRecognizer::with_transcripts(["65"]));
    let (mut session, triggers, transcript) = session_for(url, recognizer);

    session.start();
    session.run_until_idle().await;
    press(&mut session, &triggers).await;

    assert_eq!(
        transcript.last().unwrap().message,
        "Please re-enter the value for the following features: RDW level, gender."
    );
    assert_eq!(
        session.controller().pending_invalid_features().names(),
        vec!["RDW level", "gender"]
    );
}

#[tokio::test]
async fn unreachable_backend_reports_transport_error() {
    let recognizer = Arc::new(ScriptedRecognizer::with_transcripts(["14.5", "female"]));
    let (mut session, triggers, transcript) = session_for(dead_endpoint().await, recognizer);

    session.start();
    session.run_until_idle().await;
    session
        .controller_mut()
        .set_pending_invalid_features(["RDW level", "gender"].into_iter().collect());

    press(&mut session, &triggers).await;
    assert_eq!(transcript.last().unwrap().message, TRANSPORT_ERROR);
    assert_eq!(
        session.controller().pending_invalid_features().names(),
        vec!["gender"]
    );

    // still usable afterwards
    press(&mut session, &triggers).await;
    assert_eq!(transcript.last().unwrap().message, TRANSPORT_ERROR);
    assert!(session.controller().pending_invalid_features().is_empty());
}

#[tokio::test]
async fn recognition_failure_is_reported() {
    let (url, backend) = spawn_backend(vec![]).await;
    let recognizer = Arc::new(ScriptedRecognizer::new(vec![Err(RecognitionError::new(
        "audio-capture",
    ))]));
    let (mut session, triggers, transcript) = session_for(url, recognizer);

    session.start();
    session.run_until_idle().await;
    press(&mut session, &triggers).await;

    assert_eq!(transcript.last().unwrap().message, RECOGNITION_ERROR);
    assert!(backend.received().is_empty());
    assert!(!session.controller().is_listening());
}

#[tokio::test]
async fn http_client_maps_error_statuses_and_bad_bodies() {
    let app = Router::new()
        .route(
            "/process_speech",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );
    let client = HttpValidationClient::new(&serve(app).await, None).unwrap();
    match client.validate("65 male").await {
        Err(IntakeError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("expected status error, got {:?}", other),
    }

    let app = Router::new().route("/process_speech", post(|| async { "<html>oops</html>" }));
    let client = HttpValidationClient::new(&serve(app).await, None).unwrap();
    assert!(matches!(
        client.validate("65 male").await,
        Err(IntakeError::MalformedResponse(_))
    ));

    let app = Router::new().route("/process_speech", post(|| async { Json(json!({})) }));
    let client = HttpValidationClient::new(&serve(app).await, None).unwrap();
    assert!(matches!(
        client.validate("65 male").await,
        Err(IntakeError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn http_client_parses_answer() {
    let (url, backend) = spawn_backend(vec![json!({"invalid_features": [], "response": "Recorded."})]).await;
    let client = HttpValidationClient::new(&url, None).unwrap();

    assert_eq!(
        client.validate("RDW level: 14.5").await.unwrap(),
        ValidationOutcome::Answer("Recorded.".to_string())
    );
    assert_eq!(backend.received(), vec!["RDW level: 14.5".to_string()]);
}
