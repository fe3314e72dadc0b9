//! End-to-end pipeline runs over a small core-banking workspace.

use std::collections::BTreeMap;

use corebridge_match::CandidateMatcher;
use corebridge_model::{
    ComplianceTag, Entity, Field, FieldCatalog, FieldMetadata, MappingStatus, SemanticType,
    SystemId, SystemType,
};
use corebridge_pipeline::{PipelineRequest, Stage, run_pipeline};

struct Workspace {
    source_entities: Vec<Entity>,
    target_entities: Vec<Entity>,
    fields: Vec<Field>,
}

fn tagged_field(
    entity: &Entity,
    name: &str,
    semantic_type: SemanticType,
    tags: Vec<ComplianceTag>,
) -> Field {
    let mut field = Field::new(entity.id.clone(), name, semantic_type);
    field.metadata = Some(FieldMetadata {
        compliance_tags: tags,
        ..FieldMetadata::default()
    });
    field
}

fn banking_workspace() -> Workspace {
    let fiserv = SystemId::new("fiserv");
    let salesforce = SystemId::new("salesforce");

    let customer = Entity::new(fiserv.clone(), "CUSTOMER_MASTER");
    let card = Entity::new(fiserv, "CARD_MASTER");
    let contact = Entity::new(salesforce.clone(), "Contact");
    let payment_card = Entity::new(salesforce, "PaymentCard");

    let mut cust_no = Field::new(customer.id.clone(), "CUST_NO", SemanticType::Id);
    cust_no.is_key = true;
    let mut cust_name = Field::new(customer.id.clone(), "CUST_NAME", SemanticType::String);
    cust_name.required = true;
    let ssn = tagged_field(
        &customer,
        "SSN",
        SemanticType::String,
        vec![ComplianceTag::GlbaNpi],
    );
    let email = Field::new(customer.id.clone(), "EMAIL_ADDR", SemanticType::Email);

    let card_no = tagged_field(
        &card,
        "CARD_NO",
        SemanticType::String,
        vec![ComplianceTag::PciCard],
    );
    let mut card_type = Field::new(card.id.clone(), "CARD_TYPE", SemanticType::Picklist);
    card_type.picklist_values = Some(vec!["V".to_string(), "M".to_string(), "A".to_string()]);

    let name = Field::new(contact.id.clone(), "Name", SemanticType::String);
    let contact_email = Field::new(contact.id.clone(), "Email", SemanticType::Email);
    let tax_id = Field::new(contact.id.clone(), "TaxId", SemanticType::String);

    let card_number = Field::new(payment_card.id.clone(), "CardNumber", SemanticType::String);
    let card_kind = Field::new(payment_card.id.clone(), "CardType", SemanticType::String);

    Workspace {
        source_entities: vec![customer, card],
        target_entities: vec![contact, payment_card],
        fields: vec![
            cust_no,
            cust_name,
            ssn,
            email,
            card_no,
            card_type,
            name,
            contact_email,
            tax_id,
            card_number,
            card_kind,
        ],
    }
}

fn run(workspace: Workspace) -> (corebridge_pipeline::PipelineResult, FieldCatalog) {
    let catalog = FieldCatalog::new(&workspace.fields);
    let outcome = CandidateMatcher::new(&workspace.target_entities, &catalog)
        .propose(&workspace.source_entities);

    let request = PipelineRequest {
        source_system: SystemType::Fiserv,
        target_system: SystemType::Salesforce,
        source_entities: workspace.source_entities,
        target_entities: workspace.target_entities,
        fields: workspace.fields,
        entity_mappings: outcome.entity_mappings,
        field_mappings: outcome.field_mappings,
        provider: None,
        on_step: None,
    };
    (run_pipeline(request), catalog)
}

fn source_name<'a>(
    catalog: &'a FieldCatalog,
    mapping: &corebridge_model::FieldMapping,
) -> &'a str {
    catalog
        .get(&mapping.source_field_id)
        .map(|field| field.name.as_str())
        .unwrap_or("")
}

#[test]
fn full_run_validates_every_mapping_and_runs_all_stages() {
    let (result, _catalog) = run(banking_workspace());

    assert_eq!(result.stages_run, Stage::ALL.to_vec());
    assert!(!result.field_mappings.is_empty());
    for mapping in &result.field_mappings {
        assert_eq!(mapping.status, MappingStatus::Validated);
        let confidence = mapping.confidence();
        assert!((0.0..=1.0).contains(&confidence), "confidence {confidence}");
    }
}

#[test]
fn compliance_findings_cover_card_and_privacy_rules() {
    let (result, _catalog) = run(banking_workspace());

    let codes: Vec<&str> = result
        .compliance_report
        .issues
        .iter()
        .map(|issue| issue.code.as_str())
        .collect();
    assert!(codes.contains(&"CB-PCI-001"), "codes: {codes:?}");
    assert!(codes.contains(&"CB-GLBA-001"), "codes: {codes:?}");
    assert!(result.compliance_report.has_errors());
}

#[test]
fn privacy_rationale_note_is_appended_for_npi_fields() {
    let (result, catalog) = run(banking_workspace());

    let ssn_mapping = result
        .field_mappings
        .iter()
        .find(|mapping| source_name(&catalog, mapping) == "SSN")
        .expect("SSN should map to TaxId");
    assert!(ssn_mapping.rationale.to_lowercase().contains("privacy"));
}

#[test]
fn agent_penalties_are_logged_but_suppressed_by_the_merge() {
    let (result, catalog) = run(banking_workspace());

    // The banking agent penalizes the coded CARD_TYPE picklist, but the
    // keep-higher merge restores the matcher's original confidence.
    let penalty_step = result
        .steps
        .iter()
        .find(|step| step.agent == "banking" && step.action == "coded_picklist")
        .expect("coded picklist penalty should be logged");
    let before = penalty_step.confidence_before.unwrap();
    let after = penalty_step.confidence_after.unwrap();
    assert!(after < before);

    let card_type_mapping = result
        .field_mappings
        .iter()
        .find(|mapping| source_name(&catalog, mapping) == "CARD_TYPE")
        .expect("CARD_TYPE should map to CardType");
    assert!((card_type_mapping.confidence() - before).abs() < 1e-9);
}

#[test]
fn inapplicable_agents_and_missing_provider_leave_single_steps() {
    let (result, _catalog) = run(banking_workspace());

    let erp_steps: Vec<_> = result
        .steps
        .iter()
        .filter(|step| step.agent == "erp")
        .collect();
    assert_eq!(erp_steps.len(), 1);
    assert_eq!(erp_steps[0].action, "skipped");

    let llm_steps: Vec<_> = result
        .steps
        .iter()
        .filter(|step| step.agent == "llm")
        .collect();
    assert_eq!(llm_steps.len(), 1);
    assert_eq!(llm_steps[0].action, "skipped");
}

#[test]
fn unmapped_required_audit_field_is_reported_once_mappings_exist() {
    let mut workspace = banking_workspace();
    let catalog = FieldCatalog::new(&workspace.fields);
    let outcome = CandidateMatcher::new(&workspace.target_entities, &catalog)
        .propose(&workspace.source_entities);

    // The audit-tracked field arrives after matching, so no mapping
    // touches it on either side.
    let gl_entry = Entity::new(SystemId::new("fiserv"), "GL_ENTRY");
    let mut posting_ref = tagged_field(
        &gl_entry,
        "POSTING_REF",
        SemanticType::String,
        vec![ComplianceTag::FfiecAudit],
    );
    posting_ref.required = true;
    workspace.fields.push(posting_ref);
    workspace.source_entities.push(gl_entry);

    let request = PipelineRequest {
        source_system: SystemType::Fiserv,
        target_system: SystemType::Salesforce,
        source_entities: workspace.source_entities,
        target_entities: workspace.target_entities,
        fields: workspace.fields,
        entity_mappings: outcome.entity_mappings,
        field_mappings: outcome.field_mappings,
        provider: None,
        on_step: None,
    };
    let result = run_pipeline(request);

    let audit_issue = result
        .compliance_report
        .issues
        .iter()
        .find(|issue| issue.code == "CB-AUD-001");
    assert!(audit_issue.is_some());
}

#[test]
fn result_fields_carry_enriched_types() {
    let mut workspace = banking_workspace();
    let customer_id = workspace.source_entities[0].id.clone();
    workspace
        .fields
        .push(Field::new(customer_id, "WORK_EMAIL", SemanticType::Unknown));

    let (result, _catalog) = run(workspace);
    let enriched = result
        .fields
        .iter()
        .find(|field| field.name == "WORK_EMAIL")
        .expect("enriched field present in result");
    assert_eq!(enriched.semantic_type, SemanticType::Email);
}

#[test]
fn step_counts_match_between_callback_and_result() {
    let workspace = banking_workspace();
    let catalog = FieldCatalog::new(&workspace.fields);
    let outcome = CandidateMatcher::new(&workspace.target_entities, &catalog)
        .propose(&workspace.source_entities);

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let request = PipelineRequest {
        source_system: SystemType::Fiserv,
        target_system: SystemType::Salesforce,
        source_entities: workspace.source_entities,
        target_entities: workspace.target_entities,
        fields: workspace.fields,
        entity_mappings: outcome.entity_mappings,
        field_mappings: outcome.field_mappings,
        provider: None,
        on_step: Some(Box::new(|step: &corebridge_model::AgentStep| {
            *seen.entry(step.agent.clone()).or_default() += 1;
        })),
    };
    let result = run_pipeline(request);

    let total: usize = seen.values().sum();
    assert_eq!(total, result.steps.len());
    assert!(seen.contains_key("pipeline"));
    assert!(seen.contains_key("banking"));
}
