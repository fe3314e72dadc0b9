//! File formats read and written by the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use corebridge_model::{
    AgentStep, ComplianceReport, ComplianceTag, Entity, EntityMapping, Field, FieldMapping,
    FieldMetadata, SemanticType, SystemId, SystemType,
};
use corebridge_pipeline::Stage;

/// Input workspace: two schema sides to be matched.
#[derive(Debug, Deserialize)]
pub struct WorkspaceFile {
    pub source: SchemaSide,
    pub target: SchemaSide,
}

/// One side of a mapping workspace.
#[derive(Debug, Deserialize)]
pub struct SchemaSide {
    pub system: SystemType,
    pub entities: Vec<EntityDef>,
}

/// An entity as written in a workspace file.
#[derive(Debug, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A field as written in a workspace file. Everything except the name
/// is optional; unknown types are resolved by the pipeline.
#[derive(Debug, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_external_id: bool,
    #[serde(default)]
    pub picklist_values: Option<Vec<String>>,
    #[serde(default)]
    pub compliance_tags: Vec<ComplianceTag>,
}

impl SchemaSide {
    /// Builds model entities and fields with derived ids.
    #[must_use]
    pub fn build(&self) -> (Vec<Entity>, Vec<Field>) {
        let system_id = SystemId::new(self.system.as_str());
        let mut entities = Vec::with_capacity(self.entities.len());
        let mut fields = Vec::new();
        for def in &self.entities {
            let mut entity = Entity::new(system_id.clone(), &def.name);
            entity.label = def.label.clone();
            for field_def in &def.fields {
                fields.push(field_def.build(&entity));
            }
            entities.push(entity);
        }
        (entities, fields)
    }
}

impl FieldDef {
    fn build(&self, entity: &Entity) -> Field {
        let mut field = Field::new(entity.id.clone(), &self.name, self.semantic_type);
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        field.required = self.required;
        field.is_key = self.is_key;
        field.is_external_id = self.is_external_id;
        field.picklist_values = self.picklist_values.clone();
        if !self.compliance_tags.is_empty() {
            field.metadata = Some(FieldMetadata {
                compliance_tags: self.compliance_tags.clone(),
                ..FieldMetadata::default()
            });
        }
        field
    }
}

/// Output of `corebridge map`, also the input of `corebridge scan`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MappingFile {
    pub source_system: SystemType,
    pub target_system: SystemType,
    pub fields: Vec<Field>,
    pub entity_mappings: Vec<EntityMapping>,
    pub field_mappings: Vec<FieldMapping>,
    pub compliance_report: ComplianceReport,
    pub total_improved: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages_run: Vec<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<AgentStep>,
}

/// In-memory result handed to the summary printer.
pub struct MapRun {
    pub output_path: PathBuf,
    pub file: MappingFile,
}

impl MappingFile {
    #[must_use]
    pub fn stage_names(stages: &[Stage]) -> Vec<String> {
        stages.iter().map(|stage| stage.as_str().to_string()).collect()
    }
}
