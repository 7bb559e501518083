//! Conversation state owned by the dialogue controller.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// One structured intake field as named by the validation service (e.g. "RDW level").
///
/// The name is opaque: it is echoed back to the user and prefixed onto the next
/// answer, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureName(String);

impl FeatureName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FeatureName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ordered queue of features the backend rejected.
///
/// Only two mutations exist: one feature is consumed per answered turn
/// (`pop_front`), or the whole queue is swapped for the latest rejection list
/// (`replace_all`). Nothing is ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureQueue {
    features: VecDeque<FeatureName>,
}

impl FeatureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop_front(&mut self) -> Option<FeatureName> {
        self.features.pop_front()
    }

    pub fn replace_all<I>(&mut self, features: I)
    where
        I: IntoIterator<Item = FeatureName>,
    {
        self.features = features.into_iter().collect();
    }

    pub fn front(&self) -> Option<&FeatureName> {
        self.features.front()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureName> {
        self.features.iter()
    }

    /// Feature names in queue order, for display and assertions.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(FeatureName::as_str).collect()
    }
}

impl<T: Into<FeatureName>> FromIterator<T> for FeatureQueue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-session conversation state.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    initial_prompt_given: bool,
    pending_invalid_features: FeatureQueue,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_prompt_given(&self) -> bool {
        self.initial_prompt_given
    }

    /// Record that the opening prompt went out. One-way; there is no reset.
    pub fn mark_initial_prompt_given(&mut self) {
        self.initial_prompt_given = true;
    }

    pub fn pending_invalid_features(&self) -> &FeatureQueue {
        &self.pending_invalid_features
    }

    pub fn pending_invalid_features_mut(&mut self) -> &mut FeatureQueue {
        &mut self.pending_invalid_features
    }

    /// Build the text sent for validation, consuming the head of the queue if any.
    pub fn take_payload(&mut self, transcript: &str) -> String {
        match self.pending_invalid_features.pop_front() {
            Some(feature) => format!("{}: {}", feature, transcript),
            None => transcript.to_string(),
        }
    }
}
