//! Intake console: run the voice intake dialogue in a terminal.
//!
//! Usage:
//!   cargo run -p intake-console -- [--endpoint http://127.0.0.1:5000] [--tts "espeak -v en-us"]
//!
//! An empty line is the "speak" button. While the bot is listening, the next
//! line typed is taken as the spoken answer (an empty line counts as no speech).
//! Type `quit` when idle or press Ctrl-C to leave.

use anyhow::Context;
use intake_voice::{
    ConsoleTranscript, DialogueSession, InputFlow, IntakeConfig, ManualRecognizer, TriggerOutcome,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[intake-console] .env not loaded: {} (using system environment)", e);
    }

    // logs go to stderr so they don't interleave with the transcript on stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = IntakeConfig::load().context("load intake config")?;
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--endpoint" => {
                if let Some(url) = args.next() {
                    config.endpoint = url;
                }
            }
            "--tts" => config.tts_command = args.next(),
            "--help" | "-h" => {
                eprintln!("Intake console — spoken patient intake in a terminal");
                eprintln!("  --endpoint URL     Validation service base URL (default {})", config.endpoint);
                eprintln!("  --tts \"CMD ARGS\"   Speak prompts with a local TTS program (e.g. say, espeak)");
                eprintln!();
                eprintln!("Config: INTAKE_CONFIG or config/intake.toml, overridden by INTAKE__* env vars.");
                return Ok(());
            }
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }

    let recognizer = Arc::new(ManualRecognizer::new());
    let (mut session, _triggers) = DialogueSession::from_config(
        &config,
        Box::new(ConsoleTranscript),
        recognizer.clone(),
    )
    .context("build intake session")?;

    eprintln!("Press Enter to speak. Type `quit` to exit.");
    session.start();

    // blocking stdin reads stay off the runtime
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if lines_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });

    session
        .run(lines_rx, |controller, line| {
            if controller.is_listening() {
                recognizer.deliver(&line);
            } else if line.trim().eq_ignore_ascii_case("quit") {
                return InputFlow::Quit;
            } else if controller.on_capture_trigger() == TriggerOutcome::CaptureStarted {
                eprintln!("(listening — type your answer)");
            }
            InputFlow::Continue
        })
        .await
        .context("run intake session")?;

    Ok(())
}
