//! Candidate entity and field matching.
//!
//! Proposes entity pairs and confidence-scored field mappings between a
//! source and a target schema, using synonym-expanded token overlap,
//! Jaro-Winkler similarity, and fixed domain tables for core-banking
//! record recognition.

pub mod engine;
pub mod similarity;
pub mod tables;
pub mod transform;

pub use engine::{CandidateMatcher, MatchOutcome, type_compatibility};
pub use similarity::{name_similarity, text_overlap, token_set};
pub use tables::{
    CanonicalFamily, canonical_target_family, core_record_family, expand_synonym,
    normalize_entity_name, preferred_target_field,
};
pub use transform::infer_transform;
