//! **Transcript** — the visible chat log.
//!
//! A sink appends one tagged entry per call and keeps the newest entry in view.
//! It makes no decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Bot => f.write_str("bot"),
        }
    }
}

/// One rendered line of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Output collaborator for the chat log.
pub trait TranscriptSink: Send {
    /// Render `message` as a new entry tagged by `sender`, then bring it into view.
    fn append(&mut self, message: &str, sender: Sender);
}

/// In-memory transcript. Clones share the same log, so one handle can be given
/// to the controller while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscript {
    entries: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages only, in append order.
    pub fn messages(&self) -> Vec<(Sender, String)> {
        self.entries()
            .into_iter()
            .map(|e| (e.sender, e.message))
            .collect()
    }

    pub fn bot_messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.sender == Sender::Bot)
            .map(|e| e.message)
            .collect()
    }

    pub fn last(&self) -> Option<TranscriptEntry> {
        self.entries.lock().ok().and_then(|e| e.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TranscriptSink for MemoryTranscript {
    fn append(&mut self, message: &str, sender: Sender) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(TranscriptEntry {
                sender,
                message: message.to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}

/// Terminal transcript: one tagged line per entry on stdout, flushed immediately.
#[derive(Debug, Default)]
pub struct ConsoleTranscript;

impl TranscriptSink for ConsoleTranscript {
    fn append(&mut self, message: &str, sender: Sender) {
        let mut out = std::io::stdout().lock();
        let label = match sender {
            Sender::User => "You",
            Sender::Bot => "Bot",
        };
        // stdout going away is not a controller error
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            chrono::Local::now().format("%H:%M:%S"),
            label,
            message
        );
        let _ = out.flush();
    }
}
