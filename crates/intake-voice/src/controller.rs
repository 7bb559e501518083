//! Turn-taking dialogue controller
//!
//! Sequences prompt → listen → validate → react. The controller owns the
//! `ConversationState`; every handler below runs to completion before the next
//! event is taken off the session channel, so the invalid-feature queue is never
//! touched by two turns at once. Slow work (synthesis, recognition, validation)
//! runs in spawned tasks that report back as `DialogueEvent`s.

use crate::error::IntakeResult;
use crate::prompts;
use crate::state::{ConversationState, FeatureQueue};
use crate::stt::{RecognitionError, SpeechRecognizer};
use crate::transcript::{Sender, TranscriptSink};
use crate::validation::{ValidationClient, ValidationOutcome};
use crate::voice_output::SpeechSynthesizer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events delivered to the controller.
#[derive(Debug)]
pub enum DialogueEvent {
    /// User asked to speak (button press, key press).
    CaptureTrigger,
    /// Recognizer produced the best transcript for the open session.
    Transcript(String),
    /// Recognizer ended the open session without a transcript.
    RecognitionFailed(RecognitionError),
    /// Validation call for an earlier payload finished.
    ValidationCompleted(IntakeResult<ValidationOutcome>),
    /// Synthesizer began an utterance.
    SpeakingStarted,
    /// Synthesizer finished (or abandoned) an utterance.
    SpeakingEnded,
}

/// Coarse view of where the conversation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Opening prompt not given yet; the next trigger gives it instead of listening.
    AwaitingFirstTrigger,
    Idle,
    Listening,
    AwaitingValidation,
}

/// What a capture trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Trigger was spent on the opening prompt.
    PromptGiven,
    /// A recognition session was started.
    CaptureStarted,
    /// A recognition session was already open; nothing changed.
    Ignored,
}

/// The external pieces a controller drives.
pub struct Collaborators {
    pub transcript: Box<dyn TranscriptSink>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub validator: Arc<dyn ValidationClient>,
}

pub struct DialogueController {
    state: ConversationState,
    locale: String,

    // Indicators and outstanding background work
    listening: bool,
    validations_in_flight: usize,
    utterances_pending: usize,
    utterances_playing: usize,

    transcript: Box<dyn TranscriptSink>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    recognizer: Arc<dyn SpeechRecognizer>,
    validator: Arc<dyn ValidationClient>,

    events: mpsc::UnboundedSender<DialogueEvent>,
}

impl DialogueController {
    /// Create a controller that posts its async completions to `events`.
    pub fn new(
        collaborators: Collaborators,
        locale: impl Into<String>,
        events: mpsc::UnboundedSender<DialogueEvent>,
    ) -> Self {
        Self {
            state: ConversationState::new(),
            locale: locale.into(),
            listening: false,
            validations_in_flight: 0,
            utterances_pending: 0,
            utterances_playing: 0,
            transcript: collaborators.transcript,
            synthesizer: collaborators.synthesizer,
            recognizer: collaborators.recognizer,
            validator: collaborators.validator,
            events,
        }
    }

    /// Route one event to its handler.
    pub fn handle(&mut self, event: DialogueEvent) {
        match event {
            DialogueEvent::CaptureTrigger => {
                self.on_capture_trigger();
            }
            DialogueEvent::Transcript(text) => {
                self.on_transcript(&text);
            }
            DialogueEvent::RecognitionFailed(err) => self.on_recognition_error(&err),
            DialogueEvent::ValidationCompleted(result) => self.on_validation_result(result),
            DialogueEvent::SpeakingStarted => self.on_speaking_started(),
            DialogueEvent::SpeakingEnded => self.on_speaking_ended(),
        }
    }

    /// Give the opening prompt.
    pub fn on_session_start(&mut self) {
        info!("🩺 Intake session started");
        self.emit_bot(prompts::INITIAL_PROMPT);
        self.state.mark_initial_prompt_given();
    }

    pub fn on_capture_trigger(&mut self) -> TriggerOutcome {
        if !self.state.initial_prompt_given() {
            self.on_session_start();
            return TriggerOutcome::PromptGiven;
        }
        if self.listening {
            debug!("capture already in progress, ignoring trigger");
            return TriggerOutcome::Ignored;
        }

        info!(locale = %self.locale, "🎤 Listening");
        self.listening = true;

        let recognizer = Arc::clone(&self.recognizer);
        let locale = self.locale.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = match recognizer.recognize(&locale).await {
                Ok(text) => DialogueEvent::Transcript(text),
                Err(err) => DialogueEvent::RecognitionFailed(err),
            };
            post(&events, event);
        });

        TriggerOutcome::CaptureStarted
    }

    /// Record the user's answer and send it for validation. Returns the payload sent.
    pub fn on_transcript(&mut self, text: &str) -> String {
        self.listening = false;
        self.transcript.append(text, Sender::User);

        let payload = self.state.take_payload(text);
        debug!(payload = %payload, remaining = self.state.pending_invalid_features().len(), "dispatching speech for validation");

        self.validations_in_flight += 1;
        let validator = Arc::clone(&self.validator);
        let events = self.events.clone();
        let speech_text = payload.clone();
        tokio::spawn(async move {
            let result = validator.validate(&speech_text).await;
            post(&events, DialogueEvent::ValidationCompleted(result));
        });

        payload
    }

    pub fn on_validation_result(&mut self, result: IntakeResult<ValidationOutcome>) {
        self.validations_in_flight = self.validations_in_flight.saturating_sub(1);

        match result {
            Ok(ValidationOutcome::NeedsReentry(features)) => {
                let prompt = prompts::reentry_prompt(&features);
                info!(invalid = features.len(), "🔁 Asking for re-entry");
                self.state
                    .pending_invalid_features_mut()
                    .replace_all(features);
                self.emit_bot(&prompt);
            }
            Ok(ValidationOutcome::Answer(response)) => {
                info!("✅ Turn accepted");
                self.emit_bot(&response);
            }
            Err(e) => {
                warn!(error = %e, "validation request failed");
                self.emit_bot(prompts::TRANSPORT_ERROR);
            }
        }
    }

    pub fn on_recognition_error(&mut self, err: &RecognitionError) {
        self.listening = false;
        warn!(reason = %err, "speech recognition failed");
        self.emit_bot(prompts::RECOGNITION_ERROR);
    }

    pub fn on_speaking_started(&mut self) {
        self.utterances_playing += 1;
    }

    pub fn on_speaking_ended(&mut self) {
        self.utterances_playing = self.utterances_playing.saturating_sub(1);
        self.utterances_pending = self.utterances_pending.saturating_sub(1);
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn pending_invalid_features(&self) -> &FeatureQueue {
        self.state.pending_invalid_features()
    }

    /// Seed the invalid-feature queue, e.g. when resuming a half-finished intake.
    pub fn set_pending_invalid_features(&mut self, features: FeatureQueue) {
        self.state
            .pending_invalid_features_mut()
            .replace_all(features.iter().cloned());
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.utterances_playing > 0
    }

    pub fn phase(&self) -> Phase {
        if !self.state.initial_prompt_given() {
            Phase::AwaitingFirstTrigger
        } else if self.listening {
            Phase::Listening
        } else if self.validations_in_flight > 0 {
            Phase::AwaitingValidation
        } else {
            Phase::Idle
        }
    }

    /// Whether any spawned task has yet to report back.
    pub fn has_pending_work(&self) -> bool {
        self.listening || self.validations_in_flight > 0 || self.utterances_pending > 0
    }

    /// Show `text` as a bot message and speak it.
    fn emit_bot(&mut self, text: &str) {
        self.transcript.append(text, Sender::Bot);
        self.speak(text);
    }

    fn speak(&mut self, text: &str) {
        self.utterances_pending += 1;
        let synthesizer = Arc::clone(&self.synthesizer);
        let events = self.events.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            post(&events, DialogueEvent::SpeakingStarted);
            if let Err(e) = synthesizer.speak(&text).await {
                warn!(error = %e, "TTS failed");
            }
            post(&events, DialogueEvent::SpeakingEnded);
        });
    }
}

/// Post an event back to the session. A closed channel means the session is gone.
fn post(events: &mpsc::UnboundedSender<DialogueEvent>, event: DialogueEvent) {
    if let Err(e) = events.send(event) {
        debug!(event = ?e.0, "session closed, dropping event");
    }
}
