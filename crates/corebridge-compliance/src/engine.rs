//! Compliance rule engine.
//!
//! Scans a proposed mapping set against the regulatory tags carried on
//! the source schema and reports findings. Scanning is pure: it never
//! mutates a mapping, and scanning the same input twice yields the same
//! report. Findings are data, so an error-severity issue still comes
//! back inside a successful report.

use std::collections::BTreeSet;

use corebridge_match::tables::normalize_name;
use corebridge_model::{
    ComplianceIssue, ComplianceReport, ComplianceTag, Field, FieldCatalog, FieldMapping,
    IssueSeverity,
};

/// Mappings below this confidence on SOX-tagged fields need review.
const SOX_CONFIDENCE_FLOOR: f64 = 0.7;

/// Target-name vocabulary accepted as evidence of secure card storage.
const SECURE_TARGET_TOKENS: [&str; 4] = ["encrypted", "vault", "token", "pci"];

/// Rationale markers accepted as a privacy-handling note.
const PRIVACY_MARKERS: [&str; 3] = ["privacy", "npi", "mask"];

/// Scans a mapping set and returns every rule finding.
///
/// An empty mapping set yields an empty report; coverage rules only
/// apply once at least one mapping has been proposed.
#[must_use]
pub fn scan(catalog: &FieldCatalog, mappings: &[FieldMapping]) -> ComplianceReport {
    let mut report = ComplianceReport::default();
    if mappings.is_empty() {
        return report;
    }

    let mut covered_ids = BTreeSet::new();
    for mapping in mappings {
        let Some(source) = catalog.get(&mapping.source_field_id) else {
            continue;
        };
        let Some(target) = catalog.get(&mapping.target_field_id) else {
            continue;
        };
        covered_ids.insert(source.id.clone());
        covered_ids.insert(target.id.clone());

        if let Some(issue) = glba_missing_privacy_note(mapping, source) {
            report.issues.push(issue);
        }
        if let Some(issue) = pci_insecure_target(mapping, source, target) {
            report.issues.push(issue);
        }
        if let Some(issue) = bsa_untracked_target(mapping, source, target) {
            report.issues.push(issue);
        }
        if let Some(issue) = sox_low_confidence(mapping, source) {
            report.issues.push(issue);
        }
    }

    for field in catalog.iter() {
        if let Some(issue) = unmapped_audit_field(field, &covered_ids) {
            report.issues.push(issue);
        }
    }

    tracing::debug!(
        issues = report.issues.len(),
        errors = report.error_count(),
        "compliance scan complete"
    );
    report
}

/// CB-GLBA-001: NPI data moved without a privacy-handling note.
fn glba_missing_privacy_note(mapping: &FieldMapping, source: &Field) -> Option<ComplianceIssue> {
    if !source.has_tag(ComplianceTag::GlbaNpi) {
        return None;
    }
    let rationale = mapping.rationale.to_lowercase();
    if PRIVACY_MARKERS.iter().any(|marker| rationale.contains(marker)) {
        return None;
    }
    Some(ComplianceIssue {
        code: "CB-GLBA-001".to_string(),
        severity: IssueSeverity::Warning,
        message: format!(
            "{} carries nonpublic personal information but the mapping rationale does not \
             describe privacy handling",
            source.name
        ),
        tag: Some(ComplianceTag::GlbaNpi),
        source_field_id: Some(source.id.clone()),
        target_field_id: Some(mapping.target_field_id.clone()),
        field_mapping_id: Some(mapping.id.clone()),
    })
}

/// CB-PCI-001: cardholder data mapped to a target with no sign of
/// tokenized or encrypted storage.
fn pci_insecure_target(
    mapping: &FieldMapping,
    source: &Field,
    target: &Field,
) -> Option<ComplianceIssue> {
    if !source.has_tag(ComplianceTag::PciCard) {
        return None;
    }
    let normalized = normalize_name(&target.name);
    if SECURE_TARGET_TOKENS
        .iter()
        .any(|token| normalized.contains(token))
    {
        return None;
    }
    Some(ComplianceIssue {
        code: "CB-PCI-001".to_string(),
        severity: IssueSeverity::Error,
        message: format!(
            "cardholder data in {} maps to {}, which does not indicate tokenized or encrypted \
             storage",
            source.name, target.name
        ),
        tag: Some(ComplianceTag::PciCard),
        source_field_id: Some(source.id.clone()),
        target_field_id: Some(target.id.clone()),
        field_mapping_id: Some(mapping.id.clone()),
    })
}

/// CB-BSA-001: AML-relevant data landing on a target that preserves no
/// audit trail.
fn bsa_untracked_target(
    mapping: &FieldMapping,
    source: &Field,
    target: &Field,
) -> Option<ComplianceIssue> {
    if !source.has_tag(ComplianceTag::BsaAml) {
        return None;
    }
    if target.has_tag(ComplianceTag::BsaAml) || target.has_tag(ComplianceTag::FfiecAudit) {
        return None;
    }
    Some(ComplianceIssue {
        code: "CB-BSA-001".to_string(),
        severity: IssueSeverity::Warning,
        message: format!(
            "{} is AML-relevant but {} is not marked for audit-trail preservation",
            source.name, target.name
        ),
        tag: Some(ComplianceTag::BsaAml),
        source_field_id: Some(source.id.clone()),
        target_field_id: Some(target.id.clone()),
        field_mapping_id: Some(mapping.id.clone()),
    })
}

/// CB-SOX-001: financial-controls data mapped below the review floor.
fn sox_low_confidence(mapping: &FieldMapping, source: &Field) -> Option<ComplianceIssue> {
    if !source.has_tag(ComplianceTag::SoxFinancial) {
        return None;
    }
    if mapping.confidence() >= SOX_CONFIDENCE_FLOOR {
        return None;
    }
    Some(ComplianceIssue {
        code: "CB-SOX-001".to_string(),
        severity: IssueSeverity::Warning,
        message: format!(
            "{} is SOX-relevant and mapped at {:.0}% confidence; manual review required below \
             {:.0}%",
            source.name,
            mapping.confidence() * 100.0,
            SOX_CONFIDENCE_FLOOR * 100.0
        ),
        tag: Some(ComplianceTag::SoxFinancial),
        source_field_id: Some(source.id.clone()),
        target_field_id: Some(mapping.target_field_id.clone()),
        field_mapping_id: Some(mapping.id.clone()),
    })
}

/// CB-AUD-001: a required, audit-relevant field that no mapping covers
/// as either endpoint.
fn unmapped_audit_field(
    field: &Field,
    covered_ids: &BTreeSet<corebridge_model::FieldId>,
) -> Option<ComplianceIssue> {
    if !field.required || covered_ids.contains(&field.id) {
        return None;
    }
    let tag = field
        .compliance_tags()
        .iter()
        .copied()
        .find(ComplianceTag::is_audit_relevant)?;
    Some(ComplianceIssue {
        code: "CB-AUD-001".to_string(),
        severity: IssueSeverity::Info,
        message: format!(
            "required field {} is audit-relevant ({}) and not covered by any mapping",
            field.name, tag
        ),
        tag: Some(tag),
        source_field_id: Some(field.id.clone()),
        target_field_id: None,
        field_mapping_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebridge_model::{
        Entity, EntityMapping, FieldMetadata, SemanticType, SystemId, Transform,
    };

    struct Fixture {
        catalog: FieldCatalog,
        mapping: FieldMapping,
    }

    fn fixture(
        source_name: &str,
        source_tags: Vec<ComplianceTag>,
        target_name: &str,
        target_tags: Vec<ComplianceTag>,
        confidence: f64,
        rationale: &str,
    ) -> Fixture {
        let src_entity = Entity::new(SystemId::new("fis"), "CARD_MASTER");
        let tgt_entity = Entity::new(SystemId::new("sf"), "PaymentCard");
        let mut source = Field::new(src_entity.id.clone(), source_name, SemanticType::String);
        source.metadata = Some(FieldMetadata {
            compliance_tags: source_tags,
            ..FieldMetadata::default()
        });
        let mut target = Field::new(tgt_entity.id.clone(), target_name, SemanticType::String);
        if !target_tags.is_empty() {
            target.metadata = Some(FieldMetadata {
                compliance_tags: target_tags,
                ..FieldMetadata::default()
            });
        }
        let em = EntityMapping::new(src_entity.id, tgt_entity.id, 0.9, "test");
        let mapping = FieldMapping::new(
            em.id,
            source.id.clone(),
            target.id.clone(),
            Transform::direct(),
            confidence,
            rationale,
        );
        Fixture {
            catalog: FieldCatalog::new(&[source, target]),
            mapping,
        }
    }

    #[test]
    fn empty_mapping_set_yields_empty_report() {
        let fx = fixture(
            "AUDIT_REF",
            vec![ComplianceTag::FfiecAudit],
            "Reference",
            vec![],
            0.9,
            "seed",
        );
        let report = scan(&fx.catalog, &[]);
        assert!(report.is_empty());
    }

    #[test]
    fn card_number_to_plain_target_is_an_error() {
        let fx = fixture(
            "CARD_NO",
            vec![ComplianceTag::PciCard],
            "CardNumber",
            vec![],
            0.9,
            "seed",
        );
        let report = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert!(report.has_errors());
        assert_eq!(report.issues[0].code, "CB-PCI-001");
    }

    #[test]
    fn tokenized_target_satisfies_pci_rule() {
        let fx = fixture(
            "CARD_NO",
            vec![ComplianceTag::PciCard],
            "CardNumberToken",
            vec![],
            0.9,
            "seed",
        );
        let report = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert!(!report.has_errors());
    }

    #[test]
    fn npi_without_privacy_note_warns_and_note_silences_it() {
        let fx = fixture(
            "SSN",
            vec![ComplianceTag::GlbaNpi],
            "TaxId",
            vec![],
            0.9,
            "exact name match",
        );
        let report = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert_eq!(report.issues[0].code, "CB-GLBA-001");
        assert_eq!(report.issues[0].severity, IssueSeverity::Warning);

        let mut noted = fixture(
            "SSN",
            vec![ComplianceTag::GlbaNpi],
            "TaxId",
            vec![],
            0.9,
            "masked per privacy policy",
        );
        let report = scan(&noted.catalog, std::slice::from_ref(&noted.mapping));
        assert!(report.is_empty());
        noted.mapping.append_rationale("still fine");
        let report = scan(&noted.catalog, std::slice::from_ref(&noted.mapping));
        assert!(report.is_empty());
    }

    #[test]
    fn low_confidence_sox_mapping_warns() {
        let fx = fixture(
            "GL_AMT",
            vec![ComplianceTag::SoxFinancial],
            "Amount",
            vec![],
            0.55,
            "seed",
        );
        let report = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert_eq!(report.issues[0].code, "CB-SOX-001");

        let confident = fixture(
            "GL_AMT",
            vec![ComplianceTag::SoxFinancial],
            "Amount",
            vec![],
            0.85,
            "seed",
        );
        assert!(scan(&confident.catalog, std::slice::from_ref(&confident.mapping)).is_empty());
    }

    #[test]
    fn aml_data_needs_audit_marked_target() {
        let fx = fixture(
            "SAR_FLAG",
            vec![ComplianceTag::BsaAml],
            "Notes",
            vec![],
            0.9,
            "seed",
        );
        let report = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert_eq!(report.issues[0].code, "CB-BSA-001");

        let tracked = fixture(
            "SAR_FLAG",
            vec![ComplianceTag::BsaAml],
            "SuspiciousActivityFlag",
            vec![ComplianceTag::FfiecAudit],
            0.9,
            "seed",
        );
        assert!(scan(&tracked.catalog, std::slice::from_ref(&tracked.mapping)).is_empty());
    }

    #[test]
    fn uncovered_required_audit_field_is_reported() {
        let fx = fixture(
            "TXN_AMT",
            vec![],
            "Amount",
            vec![],
            0.9,
            "seed",
        );
        let entity = Entity::new(SystemId::new("fis"), "TRANSACTION_HISTORY");
        let mut audit = Field::new(entity.id, "POSTING_REF", SemanticType::String);
        audit.required = true;
        audit.metadata = Some(FieldMetadata {
            compliance_tags: vec![ComplianceTag::FfiecAudit],
            ..FieldMetadata::default()
        });
        let mut fields: Vec<Field> = fx.catalog.iter().cloned().collect();
        fields.push(audit);
        let catalog = FieldCatalog::new(&fields);

        let report = scan(&catalog, std::slice::from_ref(&fx.mapping));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, "CB-AUD-001");
        assert_eq!(report.issues[0].severity, IssueSeverity::Info);
    }

    #[test]
    fn scanning_twice_is_idempotent() {
        let fx = fixture(
            "CARD_NO",
            vec![ComplianceTag::PciCard, ComplianceTag::GlbaNpi],
            "CardNumber",
            vec![],
            0.6,
            "seed",
        );
        let first = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        let second = scan(&fx.catalog, std::slice::from_ref(&fx.mapping));
        assert_eq!(first.issues.len(), second.issues.len());
        let codes: Vec<&str> = first.issues.iter().map(|i| i.code.as_str()).collect();
        let again: Vec<&str> = second.issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, again);
    }
}
