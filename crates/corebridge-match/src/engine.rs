//! Candidate matching engine.
//!
//! For every source entity the engine picks the best-scoring target
//! entity (ties resolved by target-list order) and records one entity
//! mapping unconditionally. Within the chosen pair each source field is
//! scored against every target field; the best candidate is kept only
//! when it clears the acceptance threshold for the pair kind.

use serde::{Deserialize, Serialize};

use corebridge_model::{Entity, EntityMapping, Field, FieldCatalog, FieldMapping, SemanticType};

use crate::similarity::{name_similarity, text_overlap};
use crate::tables::{
    CanonicalFamily, canonical_target_family, core_record_family, normalize_name,
    preferred_target_field,
};
use crate::transform::infer_transform;

/// Weight of name similarity in the field score.
const FIELD_NAME_WEIGHT: f64 = 0.65;
/// Weight of type compatibility in the field score.
const FIELD_TYPE_WEIGHT: f64 = 0.35;
/// Boost when a recognized core record pairs with its canonical family.
const ENTITY_DOMAIN_BOOST: f64 = 0.30;
/// Field boost when the observed target matches the preferred name.
const PREFERRED_FIELD_BOOST: f64 = 0.28;
/// Field penalty when a preferred pair exists but another target won.
const PREFERRED_FIELD_MISS: f64 = -0.05;
/// Acceptance threshold inside a recognized core-to-canonical pair.
const CORE_PAIR_THRESHOLD: f64 = 0.58;
/// Acceptance threshold for all other entity pairs.
const DEFAULT_THRESHOLD: f64 = 0.35;

/// Type-compatibility component of the field score.
const TYPE_IDENTICAL: f64 = 1.0;
const TYPE_SAME_GROUP: f64 = 0.75;
const TYPE_UNRESOLVED: f64 = 0.45;
const TYPE_MISMATCH: f64 = 0.2;

/// Proposed mappings for one run of the matcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub entity_mappings: Vec<EntityMapping>,
    pub field_mappings: Vec<FieldMapping>,
}

/// Candidate matcher over one source/target schema pair.
pub struct CandidateMatcher<'a> {
    target_entities: &'a [Entity],
    catalog: &'a FieldCatalog,
}

struct EntityChoice<'a> {
    target: &'a Entity,
    score: f64,
    core_pair: Option<CanonicalFamily>,
}

impl<'a> CandidateMatcher<'a> {
    #[must_use]
    pub fn new(target_entities: &'a [Entity], catalog: &'a FieldCatalog) -> Self {
        Self {
            target_entities,
            catalog,
        }
    }

    /// Proposes entity and field mappings for every source entity.
    #[must_use]
    pub fn propose(&self, source_entities: &[Entity]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        for source in source_entities {
            let Some(choice) = self.best_target(source) else {
                continue;
            };

            let rationale = match choice.core_pair {
                Some(family) => format!(
                    "Name overlap {:.0}% with core-record boost ({} family)",
                    (choice.score - ENTITY_DOMAIN_BOOST) * 100.0,
                    family.as_str()
                ),
                None => format!("Name overlap {:.0}%", choice.score * 100.0),
            };
            let entity_mapping = EntityMapping::new(
                source.id.clone(),
                choice.target.id.clone(),
                choice.score,
                rationale,
            );
            tracing::debug!(
                source = %source.name,
                target = %choice.target.name,
                score = choice.score,
                "entity pair selected"
            );

            let field_mappings = self.map_fields(&entity_mapping, source, &choice);
            outcome.entity_mappings.push(entity_mapping);
            outcome.field_mappings.extend(field_mappings);
        }

        outcome
    }

    /// Highest-scoring target entity; ties keep the earliest target.
    fn best_target(&self, source: &Entity) -> Option<EntityChoice<'a>> {
        let source_family = core_record_family(&source.name);
        let source_text = source.display_text();

        let mut best: Option<EntityChoice<'a>> = None;
        for target in self.target_entities {
            let overlap = text_overlap(&source_text, &target.display_text());
            let target_family = canonical_target_family(&target.name);
            let core_pair = match (source_family, target_family) {
                (Some(s), Some(t)) if s == t => Some(s),
                _ => None,
            };
            let score = if core_pair.is_some() {
                overlap + ENTITY_DOMAIN_BOOST
            } else {
                overlap
            };
            let better = best.as_ref().is_none_or(|current| score > current.score);
            if better {
                best = Some(EntityChoice {
                    target,
                    score,
                    core_pair,
                });
            }
        }
        best
    }

    fn map_fields(
        &self,
        entity_mapping: &EntityMapping,
        source: &Entity,
        choice: &EntityChoice<'a>,
    ) -> Vec<FieldMapping> {
        let source_fields = self.catalog.entity_fields(&source.id);
        let target_fields = self.catalog.entity_fields(&choice.target.id);
        let threshold = if choice.core_pair.is_some() {
            CORE_PAIR_THRESHOLD
        } else {
            DEFAULT_THRESHOLD
        };

        let mut mappings = Vec::new();
        for source_field in &source_fields {
            let mut best: Option<(&Field, f64, f64, f64)> = None;
            for target_field in &target_fields {
                let name_score = name_similarity(
                    &source_field.display_text(),
                    &target_field.display_text(),
                );
                let type_score =
                    type_compatibility(source_field.semantic_type, target_field.semantic_type);
                let boost = choice
                    .core_pair
                    .map(|family| field_boost(family, source_field, target_field))
                    .unwrap_or(0.0);
                let score =
                    FIELD_NAME_WEIGHT * name_score + FIELD_TYPE_WEIGHT * type_score + boost;
                if best.as_ref().is_none_or(|(_, s, _, _)| score > *s) {
                    best = Some((target_field, score, name_score, type_score));
                }
            }

            let Some((target_field, score, name_score, type_score)) = best else {
                continue;
            };
            if score < threshold {
                continue;
            }

            let transform = infer_transform(source_field, target_field);
            let rationale = format!(
                "Name similarity {:.0}%, type {} \u{2192} {} ({:.0}% compatible)",
                name_score * 100.0,
                source_field.semantic_type,
                target_field.semantic_type,
                type_score * 100.0
            );
            mappings.push(FieldMapping::new(
                entity_mapping.id.clone(),
                source_field.id.clone(),
                target_field.id.clone(),
                transform,
                score,
                rationale,
            ));
        }
        mappings
    }
}

/// Type-compatibility score between declared semantic types.
#[must_use]
pub fn type_compatibility(source: SemanticType, target: SemanticType) -> f64 {
    if source == SemanticType::Unknown || target == SemanticType::Unknown {
        return TYPE_UNRESOLVED;
    }
    if source == target {
        return TYPE_IDENTICAL;
    }
    if source.group() == target.group() {
        return TYPE_SAME_GROUP;
    }
    TYPE_MISMATCH
}

/// Preferred-pair boost inside a recognized core-to-canonical entity pair.
fn field_boost(family: CanonicalFamily, source_field: &Field, target_field: &Field) -> f64 {
    match preferred_target_field(family, &source_field.name) {
        Some(preferred) if normalize_name(&target_field.name) == preferred => {
            PREFERRED_FIELD_BOOST
        }
        Some(_) => PREFERRED_FIELD_MISS,
        None => 0.0,
    }
}
