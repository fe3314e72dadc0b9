//! Schema records: entities, fields, and relationships.
//!
//! Entities and fields are created by a connector or by the schema
//! inferencer and are immutable for the remainder of a run. Compliance
//! tags and protocol addressing hints travel on an optional metadata
//! block instead of a separate field variant, so no stage needs runtime
//! type narrowing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceTag;
use crate::error::ModelError;
use crate::ids::{EntityId, FieldId, SystemId};

/// Semantic data type of a field.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Text,
    Integer,
    Decimal,
    Number,
    Boolean,
    Date,
    Datetime,
    Email,
    Phone,
    Id,
    Reference,
    Picklist,
    #[default]
    Unknown,
}

/// Coarse grouping used for type-compatibility scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeGroup {
    StringLike,
    NumericLike,
    TemporalLike,
    Unknown,
}

impl SemanticType {
    #[must_use]
    pub fn group(&self) -> TypeGroup {
        match self {
            Self::String
            | Self::Text
            | Self::Email
            | Self::Phone
            | Self::Id
            | Self::Reference
            | Self::Picklist => TypeGroup::StringLike,
            Self::Integer | Self::Decimal | Self::Number | Self::Boolean => TypeGroup::NumericLike,
            Self::Date | Self::Datetime => TypeGroup::TemporalLike,
            Self::Unknown => TypeGroup::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Id => "id",
            Self::Reference => "reference",
            Self::Picklist => "picklist",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "text" | "textarea" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "decimal" | "float" | "currency" => Ok(Self::Decimal),
            "number" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" | "timestamp" => Ok(Self::Datetime),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "id" => Ok(Self::Id),
            "reference" | "lookup" => Ok(Self::Reference),
            "picklist" => Ok(Self::Picklist),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ModelError::UnknownSemanticType(value.to_string())),
        }
    }
}

/// A schema-level record type (table/object) within one system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub system_id: SystemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity {
    pub fn new(system_id: SystemId, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = EntityId::derived(&[system_id.as_str(), &name]);
        Self {
            id,
            system_id,
            name,
            label: None,
            description: None,
        }
    }

    /// Name and label joined for similarity scoring.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.label {
            Some(label) if !label.eq_ignore_ascii_case(&self.name) => {
                format!("{} {}", self.name, label)
            }
            _ => self.name.clone(),
        }
    }
}

/// Opaque pass-through metadata carried on regulated or connector fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Regulatory classifications for this field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_tags: Vec<ComplianceTag>,
    /// ISO 20022 canonical element name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso20022_name: Option<String>,
    /// Protocol-specific addressing hints (record path, segment id, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub protocol_hints: BTreeMap<String, String>,
}

/// A named, typed attribute of an [`Entity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub entity_id: EntityId,
    pub name: String,
    pub label: String,
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_external_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picklist_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FieldMetadata>,
}

impl Field {
    pub fn new(entity_id: EntityId, name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let name = name.into();
        let id = FieldId::derived(&[entity_id.as_str(), &name]);
        Self {
            id,
            entity_id,
            label: name.clone(),
            name,
            semantic_type,
            required: false,
            is_key: false,
            is_external_id: false,
            picklist_values: None,
            metadata: None,
        }
    }

    /// Compliance tags, empty when no metadata is attached.
    #[must_use]
    pub fn compliance_tags(&self) -> &[ComplianceTag] {
        self.metadata
            .as_ref()
            .map(|m| m.compliance_tags.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn has_tag(&self, tag: ComplianceTag) -> bool {
        self.compliance_tags().contains(&tag)
    }

    /// Name and label joined for similarity scoring.
    #[must_use]
    pub fn display_text(&self) -> String {
        if self.label.eq_ignore_ascii_case(&self.name) || self.label.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.label)
        }
    }
}

/// A reference link between a field and the entity it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from_field_id: FieldId,
    pub to_entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Index over a flat field list for id and name resolution.
///
/// Built once per pipeline run; every stage resolves mapping endpoints
/// through it instead of scanning the field list.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    by_id: BTreeMap<FieldId, Field>,
    by_entity: BTreeMap<EntityId, Vec<FieldId>>,
}

impl FieldCatalog {
    #[must_use]
    pub fn new(fields: &[Field]) -> Self {
        let mut by_id = BTreeMap::new();
        let mut by_entity: BTreeMap<EntityId, Vec<FieldId>> = BTreeMap::new();
        for field in fields {
            by_entity
                .entry(field.entity_id.clone())
                .or_default()
                .push(field.id.clone());
            by_id.insert(field.id.clone(), field.clone());
        }
        Self { by_id, by_entity }
    }

    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn entity_fields(&self, entity_id: &EntityId) -> Vec<&Field> {
        self.by_entity
            .get(entity_id)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Resolves a field by name within one entity, case-insensitively.
    #[must_use]
    pub fn resolve_name(&self, entity_id: &EntityId, name: &str) -> Option<&Field> {
        self.entity_fields(entity_id)
            .into_iter()
            .find(|field| field.name.eq_ignore_ascii_case(name.trim()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_type_groups() {
        assert_eq!(SemanticType::Email.group(), TypeGroup::StringLike);
        assert_eq!(SemanticType::Decimal.group(), TypeGroup::NumericLike);
        assert_eq!(SemanticType::Datetime.group(), TypeGroup::TemporalLike);
        assert_eq!(SemanticType::Unknown.group(), TypeGroup::Unknown);
    }

    #[test]
    fn semantic_type_round_trips_through_serde() {
        let json = serde_json::to_string(&SemanticType::Datetime).unwrap();
        assert_eq!(json, "\"datetime\"");
        let back: SemanticType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SemanticType::Datetime);
    }

    #[test]
    fn catalog_resolves_names_case_insensitively() {
        let entity = Entity::new(SystemId::new("src"), "Customer");
        let field = Field::new(entity.id.clone(), "CUST_NAME", SemanticType::String);
        let catalog = FieldCatalog::new(std::slice::from_ref(&field));

        assert!(catalog.resolve_name(&entity.id, "cust_name").is_some());
        assert!(catalog.resolve_name(&entity.id, "missing").is_none());
    }

    #[test]
    fn untagged_field_has_no_compliance_tags() {
        let entity = Entity::new(SystemId::new("src"), "Customer");
        let field = Field::new(entity.id, "CUST_NAME", SemanticType::String);
        assert!(field.compliance_tags().is_empty());
        assert!(!field.has_tag(ComplianceTag::GlbaNpi));
    }
}
