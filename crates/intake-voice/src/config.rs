//! Intake configuration loaded from an optional TOML file and the environment.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | endpoint | INTAKE__ENDPOINT | http://127.0.0.1:5000 |
//! | locale | INTAKE__LOCALE | en-US |
//! | validation_timeout_secs | INTAKE__VALIDATION_TIMEOUT_SECS | unset (no timeout) |
//! | tts_command | INTAKE__TTS_COMMAND | unset (silent) |

use crate::error::IntakeResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default validation backend (the Flask intake service listens here).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// The single recognition locale supported.
pub const DEFAULT_LOCALE: &str = "en-US";

const DEFAULT_CONFIG_PATH: &str = "config/intake.toml";

/// Runtime settings for a dialogue session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeConfig {
    /// Base URL of the validation service, without the `/process_speech` path.
    pub endpoint: String,
    /// Locale handed to the recognizer for every capture session.
    pub locale: String,
    /// Per-request timeout for validation calls. `None` waits indefinitely.
    #[serde(default)]
    pub validation_timeout_secs: Option<u64>,
    /// External program used to speak prompts (e.g. `say`, `espeak`).
    #[serde(default)]
    pub tts_command: Option<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            validation_timeout_secs: None,
            tts_command: None,
        }
    }
}

impl IntakeConfig {
    /// Load config. Precedence: env `INTAKE__*` > file (`INTAKE_CONFIG` or `config/intake.toml`) > defaults.
    pub fn load() -> IntakeResult<Self> {
        let config_path =
            std::env::var("INTAKE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load config using `path` as the optional file layer.
    pub fn load_from(path: &Path) -> IntakeResult<Self> {
        let builder = config::Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("locale", DEFAULT_LOCALE)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("INTAKE").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    pub fn validation_timeout(&self) -> Option<Duration> {
        self.validation_timeout_secs.map(Duration::from_secs)
    }
}
