//! Field-name redaction for externally-sent prompts.
//!
//! Regulated field names never leave the process: payment card columns
//! and nonpublic personal information are replaced by fixed placeholders
//! before any schema description is handed to a completion provider.
//! Everything here is pure so callers can redact the same catalog any
//! number of times and get the same text.

use corebridge_model::{ComplianceTag, Entity, Field, SemanticType};

pub const REDACTED_CARD: &str = "[REDACTED-CARD]";
pub const REDACTED_PII: &str = "[REDACTED-PII]";

/// Externally-presentable copy of a field.
///
/// `redacted` marks names replaced by a placeholder; the source field
/// is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedField {
    pub name: String,
    pub semantic_type: SemanticType,
    pub required: bool,
    pub is_key: bool,
    pub redacted: bool,
}

impl RedactedField {
    fn from_field(field: &Field) -> Self {
        let placeholder = redaction_placeholder(field);
        Self {
            name: placeholder.unwrap_or(&field.name).to_string(),
            semantic_type: field.semantic_type,
            required: field.required,
            is_key: field.is_key,
            redacted: placeholder.is_some(),
        }
    }
}

/// Redacted copies of a field list, in input order.
#[must_use]
pub fn redact_fields(fields: &[&Field]) -> Vec<RedactedField> {
    fields.iter().map(|field| RedactedField::from_field(field)).collect()
}

/// Placeholder for a field whose name must not be sent externally.
#[must_use]
pub fn redaction_placeholder(field: &Field) -> Option<&'static str> {
    if field.has_tag(ComplianceTag::PciCard) {
        Some(REDACTED_CARD)
    } else if field.has_tag(ComplianceTag::GlbaNpi) {
        Some(REDACTED_PII)
    } else {
        None
    }
}

/// The field name as it may appear in an external prompt.
#[must_use]
pub fn presentable_name(field: &Field) -> &str {
    redaction_placeholder(field).unwrap_or(&field.name)
}

/// Number of fields whose names were withheld.
#[must_use]
pub fn redacted_count<'a>(fields: impl IntoIterator<Item = &'a Field>) -> usize {
    fields
        .into_iter()
        .filter(|field| redaction_placeholder(field).is_some())
        .count()
}

/// One-line schema description of an entity for prompt building.
///
/// Format: `Customer: CUST_NO (id, key), [REDACTED-PII] (string, required), ...`
#[must_use]
pub fn describe_entity(entity: &Entity, fields: &[&Field]) -> String {
    let mut line = String::with_capacity(fields.len() * 24 + entity.name.len());
    line.push_str(&entity.name);
    line.push_str(": ");
    for (index, field) in redact_fields(fields).iter().enumerate() {
        if index > 0 {
            line.push_str(", ");
        }
        line.push_str(&field.name);
        line.push_str(" (");
        line.push_str(field.semantic_type.as_str());
        if field.is_key {
            line.push_str(", key");
        } else if field.required {
            line.push_str(", required");
        }
        line.push(')');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebridge_model::{FieldMetadata, SemanticType, SystemId};

    fn tagged(entity: &Entity, name: &str, tag: ComplianceTag) -> Field {
        let mut field = Field::new(entity.id.clone(), name, SemanticType::String);
        field.metadata = Some(FieldMetadata {
            compliance_tags: vec![tag],
            ..FieldMetadata::default()
        });
        field
    }

    #[test]
    fn card_and_npi_fields_are_masked() {
        let entity = Entity::new(SystemId::new("fis"), "CARD_MASTER");
        let card = tagged(&entity, "CARD_NO", ComplianceTag::PciCard);
        let npi = tagged(&entity, "SSN", ComplianceTag::GlbaNpi);
        let plain = Field::new(entity.id.clone(), "CARD_TYPE", SemanticType::String);

        assert_eq!(presentable_name(&card), REDACTED_CARD);
        assert_eq!(presentable_name(&npi), REDACTED_PII);
        assert_eq!(presentable_name(&plain), "CARD_TYPE");
        assert_eq!(redacted_count([&card, &npi, &plain]), 2);
    }

    #[test]
    fn redacted_copies_carry_the_flag_and_leave_inputs_alone() {
        let entity = Entity::new(SystemId::new("fis"), "CUSTOMER_MASTER");
        let ssn = tagged(&entity, "SSN", ComplianceTag::GlbaNpi);
        let mut name = Field::new(entity.id.clone(), "CUST_NAME", SemanticType::String);
        name.required = true;

        let view = redact_fields(&[&ssn, &name]);
        assert_eq!(view[0].name, REDACTED_PII);
        assert!(view[0].redacted);
        assert_eq!(view[1].name, "CUST_NAME");
        assert!(!view[1].redacted);
        assert!(view[1].required);

        // Source fields keep their original names.
        assert_eq!(ssn.name, "SSN");
        assert_eq!(name.name, "CUST_NAME");
    }

    #[test]
    fn card_tag_wins_over_npi_when_both_present() {
        let entity = Entity::new(SystemId::new("fis"), "CARD_MASTER");
        let mut field = Field::new(entity.id.clone(), "PAN", SemanticType::String);
        field.metadata = Some(FieldMetadata {
            compliance_tags: vec![ComplianceTag::GlbaNpi, ComplianceTag::PciCard],
            ..FieldMetadata::default()
        });
        assert_eq!(presentable_name(&field), REDACTED_CARD);
    }

    #[test]
    fn entity_description_never_contains_blocked_names() {
        let entity = Entity::new(SystemId::new("fis"), "CUSTOMER_MASTER");
        let ssn = tagged(&entity, "SSN", ComplianceTag::GlbaNpi);
        let mut name = Field::new(entity.id.clone(), "CUST_NAME", SemanticType::String);
        name.required = true;

        let line = describe_entity(&entity, &[&ssn, &name]);
        assert!(!line.contains("SSN"));
        assert!(line.contains(REDACTED_PII));
        assert!(line.contains("CUST_NAME (string, required)"));
    }

    #[test]
    fn audit_tags_are_not_redacted() {
        let entity = Entity::new(SystemId::new("fis"), "GL_ENTRY");
        let field = tagged(&entity, "POSTING_REF", ComplianceTag::FfiecAudit);
        assert_eq!(presentable_name(&field), "POSTING_REF");
    }
}
