//! **Speech-to-Text (STT)** — one capture session per trigger.
//!
//! A session resolves to exactly one transcript or exactly one error. The
//! controller never starts a second session before the first has resolved.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Why a capture session produced no transcript. Codes follow the usual
/// recognizer vocabulary (`no-speech`, `aborted`, `network`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionError {
    pub reason: String,
}

impl RecognitionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn no_speech() -> Self {
        Self::new("no-speech")
    }

    pub fn aborted() -> Self {
        Self::new("aborted")
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for RecognitionError {}

pub type RecognitionOutcome = Result<String, RecognitionError>;

/// Backend for one speech capture session.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Capture one utterance in `locale` and return its best transcript.
    async fn recognize(&self, locale: &str) -> RecognitionOutcome;
}

/// Recognizer whose sessions are completed from outside, e.g. by a terminal
/// front end typing the "spoken" answer or by a test.
///
/// An empty delivered transcript resolves the session as `no-speech`. An answer
/// delivered before the capture task has registered is held for the next session.
#[derive(Debug, Default)]
pub struct ManualRecognizer {
    slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Waiting(oneshot::Sender<RecognitionOutcome>),
    Held(RecognitionOutcome),
}

impl ManualRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is waiting for `deliver`/`fail`.
    pub fn is_waiting(&self) -> bool {
        self.slot
            .lock()
            .map(|s| matches!(&*s, Slot::Waiting(tx) if !tx.is_closed()))
            .unwrap_or(false)
    }

    /// Complete the open session with `text`. Returns false if no session was
    /// waiting; the answer is then held for the next one.
    pub fn deliver(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return self.resolve(Err(RecognitionError::no_speech()));
        }
        self.resolve(Ok(text.to_string()))
    }

    /// Complete the open session with an error. Same holding rule as `deliver`.
    pub fn fail(&self, error: RecognitionError) -> bool {
        self.resolve(Err(error))
    }

    fn resolve(&self, outcome: RecognitionOutcome) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        match std::mem::take(&mut *slot) {
            Slot::Waiting(tx) if !tx.is_closed() => tx.send(outcome).is_ok(),
            _ => {
                debug!("manual recognizer: no session waiting, holding input");
                *slot = Slot::Held(outcome);
                false
            }
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ManualRecognizer {
    async fn recognize(&self, locale: &str) -> RecognitionOutcome {
        let rx = {
            let Ok(mut slot) = self.slot.lock() else {
                return Err(RecognitionError::new("recognizer-unavailable"));
            };
            if let Slot::Held(outcome) = std::mem::take(&mut *slot) {
                return outcome;
            }
            let (tx, rx) = oneshot::channel();
            *slot = Slot::Waiting(tx);
            rx
        };
        debug!(locale, "manual recognizer: waiting for input");
        rx.await.unwrap_or_else(|_| Err(RecognitionError::aborted()))
    }
}

/// Recognizer that replays a fixed list of outcomes, one per session. Once the
/// script is exhausted every session fails with `no-speech`.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<RecognitionOutcome>>,
    locales: Mutex<Vec<String>>,
}

impl ScriptedRecognizer {
    pub fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = RecognitionOutcome>,
    {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            locales: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for a script of successful transcripts.
    pub fn with_transcripts<I, S>(transcripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(transcripts.into_iter().map(|t| Ok(t.into())))
    }

    /// Number of sessions started so far.
    pub fn sessions_started(&self) -> usize {
        self.locales.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Locale requested by each session, in order.
    pub fn locales(&self) -> Vec<String> {
        self.locales.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&self, locale: &str) -> RecognitionOutcome {
        if let Ok(mut locales) = self.locales.lock() {
            locales.push(locale.to_string());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(RecognitionError::no_speech()))
    }
}
