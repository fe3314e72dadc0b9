//! Entity and field correspondence records.
//!
//! Confidence values are clamped to `[0.0, 1.0]` on every write: mappings
//! are constructed through [`FieldMapping::new`] and adjusted through
//! [`FieldMapping::set_confidence`], so no pipeline stage can leave a
//! mapping in an invalid state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, EntityMappingId, FieldId, FieldMappingId};

/// Transformation applied when moving a value from source to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Copy as-is.
    Direct,
    /// Trim surrounding whitespace.
    Trim,
    /// Concatenate with sibling fragments into one target value.
    Concat,
    /// Reformat into the target date representation.
    DateFormat,
    /// Translate through a value-level lookup table.
    Lookup,
}

impl TransformKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::DateFormat => "date_format",
            Self::Lookup => "lookup",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transform descriptor carried on a field mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub kind: TransformKind,
    pub description: String,
}

impl Transform {
    pub fn new(kind: TransformKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    #[must_use]
    pub fn direct() -> Self {
        Self::new(TransformKind::Direct, "Copy value unchanged")
    }
}

/// Review status of a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    /// Proposed by the candidate matcher.
    Suggested,
    /// Confidence or rationale rewritten by a downstream stage.
    Adjusted,
    /// Passed the final validation stage.
    Validated,
}

/// A proposed correspondence between a source and target entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMapping {
    pub id: EntityMappingId,
    pub source_entity_id: EntityId,
    pub target_entity_id: EntityId,
    confidence: f64,
    pub rationale: String,
}

impl EntityMapping {
    pub fn new(
        source_entity_id: EntityId,
        target_entity_id: EntityId,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        let id = EntityMappingId::derived(&[source_entity_id.as_str(), target_entity_id.as_str()]);
        Self {
            id,
            source_entity_id,
            target_entity_id,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }
}

/// A proposed correspondence between a source and target field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub id: FieldMappingId,
    pub entity_mapping_id: EntityMappingId,
    pub source_field_id: FieldId,
    pub target_field_id: FieldId,
    pub transform: Transform,
    confidence: f64,
    pub rationale: String,
    pub status: MappingStatus,
}

impl FieldMapping {
    pub fn new(
        entity_mapping_id: EntityMappingId,
        source_field_id: FieldId,
        target_field_id: FieldId,
        transform: Transform,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        let id = FieldMappingId::derived(&[
            entity_mapping_id.as_str(),
            source_field_id.as_str(),
            target_field_id.as_str(),
        ]);
        Self {
            id,
            entity_mapping_id,
            source_field_id,
            target_field_id,
            transform,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
            status: MappingStatus::Suggested,
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Rewrites the confidence, clamped to `[0.0, 1.0]`.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    /// Applies a relative adjustment, clamped to `[0.0, 1.0]`.
    pub fn adjust_confidence(&mut self, delta: f64) {
        self.set_confidence(self.confidence + delta);
    }

    /// Appends a sentence to the rationale.
    pub fn append_rationale(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        if self.rationale.is_empty() {
            self.rationale = note.to_string();
        } else {
            self.rationale.push_str("; ");
            self.rationale.push_str(note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(confidence: f64) -> FieldMapping {
        FieldMapping::new(
            EntityMappingId::new("em1"),
            FieldId::new("src"),
            FieldId::new("tgt"),
            Transform::direct(),
            confidence,
            "test",
        )
    }

    #[test]
    fn confidence_is_clamped_on_construction() {
        assert_eq!(mapping(1.7).confidence(), 1.0);
        assert_eq!(mapping(-0.3).confidence(), 0.0);
        assert_eq!(mapping(0.42).confidence(), 0.42);
    }

    #[test]
    fn confidence_is_clamped_on_adjustment() {
        let mut m = mapping(0.9);
        m.adjust_confidence(0.5);
        assert_eq!(m.confidence(), 1.0);
        m.adjust_confidence(-2.0);
        assert_eq!(m.confidence(), 0.0);
    }

    #[test]
    fn rationale_appends_with_separator() {
        let mut m = mapping(0.5);
        m.append_rationale("extra context");
        assert_eq!(m.rationale, "test; extra context");
    }

    #[test]
    fn mapping_ids_are_deterministic() {
        assert_eq!(mapping(0.2).id, mapping(0.9).id);
    }
}
