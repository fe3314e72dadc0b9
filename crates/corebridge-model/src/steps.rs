//! Append-only progress records emitted by pipeline stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::FieldMappingId;

/// An immutable progress record emitted by an agent or pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub agent: String,
    pub action: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mapping_id: Option<FieldMappingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_before: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_after: Option<f64>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AgentStep {
    pub fn new(
        agent: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            detail: detail.into(),
            field_mapping_id: None,
            confidence_before: None,
            confidence_after: None,
            duration_ms: 0,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_mapping(mut self, id: FieldMappingId) -> Self {
        self.field_mapping_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, before: f64, after: f64) -> Self {
        self.confidence_before = Some(before);
        self.confidence_after = Some(after);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One-directional step channel.
///
/// Producers push steps; the sink forwards each step to the caller's
/// callback (when one is registered) and accumulates every step for the
/// final summary. The producer never blocks on the consumer and there is
/// no acknowledgment path.
pub struct StepSink<'a> {
    callback: Option<Box<dyn FnMut(&AgentStep) + 'a>>,
    steps: Vec<AgentStep>,
}

impl std::fmt::Debug for StepSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSink")
            .field("steps", &self.steps.len())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl Default for StepSink<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StepSink<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            callback: None,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_callback(callback: impl FnMut(&AgentStep) + 'a) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: AgentStep) {
        if let Some(callback) = self.callback.as_mut() {
            callback(&step);
        }
        self.steps.push(step);
    }

    #[must_use]
    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }
}
