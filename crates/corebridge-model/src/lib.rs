pub mod compliance;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod schema;
pub mod steps;
pub mod system;

pub use compliance::{
    ComplianceIssue, ComplianceReport, ComplianceSummary, ComplianceTag, IssueSeverity,
};
pub use error::{ModelError, Result};
pub use ids::{EntityId, EntityMappingId, FieldId, FieldMappingId, SystemId};
pub use mapping::{EntityMapping, FieldMapping, MappingStatus, Transform, TransformKind};
pub use schema::{Entity, Field, FieldCatalog, FieldMetadata, Relationship, SemanticType, TypeGroup};
pub use steps::{AgentStep, StepSink};
pub use system::{SystemFamily, SystemType};
