//! **DialogueSession** — the event loop around one `DialogueController`.
//!
//! All controller handlers run on the task that drives the session, one event
//! at a time. Front ends post capture triggers through a `TriggerHandle`;
//! background tasks post their completions on the same channel.

use crate::config::IntakeConfig;
use crate::controller::{Collaborators, DialogueController, DialogueEvent};
use crate::error::{IntakeError, IntakeResult};
use crate::stt::SpeechRecognizer;
use crate::transcript::TranscriptSink;
use crate::validation::HttpValidationClient;
use crate::voice_output::create_synthesizer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Cloneable handle for posting capture triggers into a session.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    events: mpsc::UnboundedSender<DialogueEvent>,
}

impl TriggerHandle {
    /// Post one capture trigger (e.g. the "speak" button).
    pub fn trigger(&self) -> IntakeResult<()> {
        self.events
            .send(DialogueEvent::CaptureTrigger)
            .map_err(|e| IntakeError::ChannelSend(e.to_string()))
    }
}

/// What the front end wants after one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFlow {
    Continue,
    Quit,
}

pub struct DialogueSession {
    controller: DialogueController,
    events: mpsc::UnboundedReceiver<DialogueEvent>,
}

impl DialogueSession {
    /// Build a session around the given collaborators.
    pub fn new(collaborators: Collaborators, locale: &str) -> (Self, TriggerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = DialogueController::new(collaborators, locale, tx.clone());
        let session = Self {
            controller,
            events: rx,
        };
        (session, TriggerHandle { events: tx })
    }

    /// Build a session wired to the HTTP validation endpoint and the configured
    /// TTS command.
    pub fn from_config(
        config: &IntakeConfig,
        transcript: Box<dyn TranscriptSink>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> IntakeResult<(Self, TriggerHandle)> {
        let validator = HttpValidationClient::from_config(config)?;
        info!(url = %validator.url(), locale = %config.locale, "intake session configured");
        let collaborators = Collaborators {
            transcript,
            synthesizer: create_synthesizer(config.tts_command.as_deref())?,
            recognizer,
            validator: Arc::new(validator),
        };
        Ok(Self::new(collaborators, &config.locale))
    }

    /// Give the opening prompt.
    pub fn start(&mut self) {
        self.controller.on_session_start();
    }

    /// Wait for the next event without handling it.
    pub async fn next_event(&mut self) -> Option<DialogueEvent> {
        self.events.recv().await
    }

    /// Wait for one event and handle it. Returns false once the channel is closed.
    pub async fn step(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.controller.handle(event);
                true
            }
            None => false,
        }
    }

    /// Handle events until every spawned task has reported back.
    pub async fn run_until_idle(&mut self) {
        while self.controller.has_pending_work() {
            if !self.step().await {
                break;
            }
        }
    }

    /// Drive the session for an interactive front end.
    ///
    /// Controller events and front-end input lines are handled one at a time on
    /// this task; `on_input` gets the controller for each line. Returns when the
    /// input channel closes, `on_input` asks to quit, or on Ctrl-C.
    pub async fn run<F>(
        &mut self,
        mut input: mpsc::UnboundedReceiver<String>,
        mut on_input: F,
    ) -> IntakeResult<()>
    where
        F: FnMut(&mut DialogueController, String) -> InputFlow,
    {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.controller.handle(event),
                    None => break,
                },
                line = input.recv() => {
                    let Some(line) = line else {
                        info!("front-end input closed; ending intake session");
                        break;
                    };
                    if on_input(&mut self.controller, line) == InputFlow::Quit {
                        info!("front end asked to quit; ending intake session");
                        break;
                    }
                }
                res = tokio::signal::ctrl_c() => {
                    res?;
                    info!("CTRL-C received; ending intake session");
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn controller(&self) -> &DialogueController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DialogueController {
        &mut self.controller
    }
}
