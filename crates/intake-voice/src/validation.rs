//! Client for the backend that validates spoken intake answers.
//!
//! Wire contract: `POST /process_speech` with `{"speech_text": "..."}`; the
//! reply carries `invalid_features` (needs re-entry) and/or `response` (final
//! output for the turn).

use crate::config::IntakeConfig;
use crate::error::{IntakeError, IntakeResult};
use crate::state::FeatureName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request body for `/process_speech`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechRequest {
    pub speech_text: String,
}

/// Raw response body from `/process_speech`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    #[serde(default)]
    pub invalid_features: Option<Vec<FeatureName>>,
    #[serde(default)]
    pub response: Option<String>,
}

/// What the controller should do with a validation reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Backend rejected these features; ask for them again.
    NeedsReentry(Vec<FeatureName>),
    /// Turn accepted; speak this back.
    Answer(String),
}

impl ValidationResult {
    /// Interpret the reply. A non-empty `invalid_features` wins over `response`;
    /// an empty or absent list means "no re-entry". With no re-entry and no
    /// `response` the reply is unusable.
    pub fn into_outcome(self) -> IntakeResult<ValidationOutcome> {
        match self.invalid_features {
            Some(features) if !features.is_empty() => Ok(ValidationOutcome::NeedsReentry(features)),
            _ => self.response.map(ValidationOutcome::Answer).ok_or_else(|| {
                IntakeError::MalformedResponse("missing `response` field".to_string())
            }),
        }
    }
}

/// Backend that validates one speech payload.
#[async_trait]
pub trait ValidationClient: Send + Sync {
    async fn validate(&self, speech_text: &str) -> IntakeResult<ValidationOutcome>;
}

/// HTTP implementation of the `/process_speech` contract.
#[derive(Debug, Clone)]
pub struct HttpValidationClient {
    url: String,
    client: reqwest::Client,
}

impl HttpValidationClient {
    /// Build a client for `endpoint` (base URL). `timeout` of `None` waits indefinitely.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> IntakeResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IntakeError::Transport(e.to_string()))?;
        Ok(Self {
            url: format!("{}/process_speech", endpoint.trim_end_matches('/')),
            client,
        })
    }

    pub fn from_config(config: &IntakeConfig) -> IntakeResult<Self> {
        Self::new(&config.endpoint, config.validation_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ValidationClient for HttpValidationClient {
    async fn validate(&self, speech_text: &str) -> IntakeResult<ValidationOutcome> {
        let body = SpeechRequest {
            speech_text: speech_text.to_string(),
        };
        debug!(url = %self.url, "posting speech for validation");
        let res = self.client.post(&self.url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(IntakeError::Status { status, body });
        }
        let result: ValidationResult = res.json().await?;
        result.into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> IntakeResult<ValidationOutcome> {
        serde_json::from_str::<ValidationResult>(json)
            .unwrap()
            .into_outcome()
    }

    #[test]
    fn invalid_features_take_precedence_over_response() {
        let outcome = parse(
            r#"{"response": "Error: Invalid or missing values", "invalid_features": ["RDW level", "gender"]}"#,
        )
        .unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::NeedsReentry(vec!["RDW level".into(), "gender".into()])
        );
    }

    #[test]
    fn empty_and_absent_lists_both_mean_answer() {
        assert_eq!(
            parse(r#"{"response": "Risk: low"}"#).unwrap(),
            ValidationOutcome::Answer("Risk: low".to_string())
        );
        assert_eq!(
            parse(r#"{"invalid_features": [], "response": "Recorded."}"#).unwrap(),
            ValidationOutcome::Answer("Recorded.".to_string())
        );
    }

    #[test]
    fn missing_response_is_malformed() {
        assert!(matches!(parse("{}"), Err(IntakeError::MalformedResponse(_))));
        assert!(matches!(
            parse(r#"{"invalid_features": null}"#),
            Err(IntakeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn client_targets_process_speech_route() {
        let client = HttpValidationClient::new("http://127.0.0.1:5000/", None).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:5000/process_speech");
    }

    #[test]
    fn request_body_shape() {
        let json = serde_json::to_value(SpeechRequest {
            speech_text: "RDW level: 14.5".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"speech_text": "RDW level: 14.5"}));
    }
}
