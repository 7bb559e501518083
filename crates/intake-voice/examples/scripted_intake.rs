//! Scripted Intake Demo — drive a whole intake without a microphone.
//!
//! Each command-line argument is one "spoken" answer. The demo presses the
//! capture button once for the opening prompt and once per answer, printing the
//! transcript as it goes. Point it at a running validation service with
//! `INTAKE__ENDPOINT` (default http://127.0.0.1:5000).
//!
//!   cargo run -p intake-voice --example scripted_intake -- "65 male" "14.5"

use intake_voice::{ConsoleTranscript, DialogueSession, IntakeConfig, ScriptedRecognizer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let answers: Vec<String> = std::env::args().skip(1).collect();
    if answers.is_empty() {
        info!("No answers given; pass each spoken answer as an argument.");
        return Ok(());
    }

    let config = IntakeConfig::load()?;
    let recognizer = Arc::new(ScriptedRecognizer::with_transcripts(answers.clone()));
    let (mut session, triggers) =
        DialogueSession::from_config(&config, Box::new(ConsoleTranscript), recognizer)?;

    // opening prompt, then one turn per answer
    for _ in 0..=answers.len() {
        triggers.trigger()?;
        session.step().await;
        session.run_until_idle().await;
    }

    let pending = session.controller().pending_invalid_features().names();
    if pending.is_empty() {
        info!("Intake complete");
    } else {
        info!(?pending, "Intake stopped with features still awaiting re-entry");
    }
    Ok(())
}
