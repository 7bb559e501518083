//! **VoiceOutput** — speaking bot prompts aloud.
//!
//! Synthesis is fire-and-forget from the controller's point of view: it spawns
//! `speak()` and only watches the start/end notifications to drive the
//! "speaking" indicator.

use crate::error::{IntakeError, IntakeResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Backend that speaks text. Resolves once the utterance has finished.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> IntakeResult<()>;
}

/// Placeholder TTS: finishes immediately without producing audio.
#[derive(Debug, Default)]
pub struct PlaceholderTts;

#[async_trait]
impl SpeechSynthesizer for PlaceholderTts {
    async fn speak(&self, text: &str) -> IntakeResult<()> {
        debug!(chars = text.len(), "placeholder TTS: skipping utterance");
        Ok(())
    }
}

/// TTS through a local program that takes the utterance as its last argument
/// (macOS `say`, `espeak`, `spd-say`, ...).
///
/// Utterances play one after another: a `speak` call waits for the one before
/// it (clones share the same queue).
#[derive(Debug, Clone)]
pub struct CommandTts {
    program: String,
    args: Vec<String>,
    speaking: Arc<Mutex<()>>,
}

impl CommandTts {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            speaking: Arc::new(Mutex::new(())),
        }
    }

    /// Fixed arguments placed before the utterance.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a command line such as `"espeak -v en-us"`; the text is appended per call.
    pub fn from_command_line(line: &str) -> IntakeResult<Self> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| IntakeError::Config("TTS command is empty".to_string()))?;
        Ok(Self::new(program).with_args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandTts {
    async fn speak(&self, text: &str) -> IntakeResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let _turn = self.speaking.lock().await;
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IntakeError::Synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Pick the synthesizer for a configured command: `CommandTts` when one is set,
/// otherwise `PlaceholderTts`.
pub fn create_synthesizer(tts_command: Option<&str>) -> IntakeResult<Arc<dyn SpeechSynthesizer>> {
    match tts_command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(line) => {
            let tts = CommandTts::from_command_line(line)?;
            info!(program = %tts.program(), "speaking prompts through local TTS command");
            Ok(Arc::new(tts))
        }
        None => Ok(Arc::new(PlaceholderTts)),
    }
}
