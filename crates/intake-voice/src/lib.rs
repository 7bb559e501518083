//! # Intake Voice - Spoken Patient Intake
//!
//! Turn-taking dialogue that collects clinical intake features by voice. The
//! bot prompts for the patient's details, captures the spoken answer, sends it
//! to the validation service, and re-prompts only for the features the service
//! rejected until every value is accepted.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       DialogueSession                         │
//! │   trigger ─┐                                                  │
//! │            ▼                                                  │
//! │  ┌────────────────────┐   spawn   ┌──────────────────────┐    │
//! │  │ DialogueController │──────────▶│ SpeechRecognizer     │    │
//! │  │  ConversationState │◀──────────│ (transcript / error) │    │
//! │  │  FeatureQueue      │   event   └──────────────────────┘    │
//! │  │                    │   spawn   ┌──────────────────────┐    │
//! │  │                    │──────────▶│ ValidationClient     │    │
//! │  │                    │◀──────────│ POST /process_speech │    │
//! │  └────────────────────┘   event   └──────────────────────┘    │
//! │      │            │                                           │
//! │      ▼            ▼                                           │
//! │  Transcript   SpeechSynthesizer (speaking start/end events)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod prompts;
pub mod session;
pub mod state;
pub mod stt;
pub mod transcript;
pub mod validation;
pub mod voice_output;

pub use config::IntakeConfig;
pub use controller::{Collaborators, DialogueController, DialogueEvent, Phase, TriggerOutcome};
pub use error::{IntakeError, IntakeResult};
pub use session::{DialogueSession, InputFlow, TriggerHandle};
pub use state::{ConversationState, FeatureName, FeatureQueue};
pub use stt::{ManualRecognizer, RecognitionError, ScriptedRecognizer, SpeechRecognizer};
pub use transcript::{ConsoleTranscript, MemoryTranscript, Sender, TranscriptEntry, TranscriptSink};
pub use validation::{HttpValidationClient, ValidationClient, ValidationOutcome, ValidationResult};
pub use voice_output::{create_synthesizer, CommandTts, PlaceholderTts, SpeechSynthesizer};
