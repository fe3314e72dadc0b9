//! Core-banking heuristics.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use corebridge_match::{CanonicalFamily, canonical_target_family, core_record_family, token_set};
use corebridge_model::{
    Entity, Field, FieldMapping, StepSink, SystemFamily, TransformKind, TypeGroup,
};

use crate::agent::{AgentContext, DomainAgent, apply_delta, is_coded_picklist};

const SYNONYM_BOOST: f64 = 0.10;
const SCHEME_MATCH_BOOST: f64 = 0.08;
const SCHEME_MISMATCH_PENALTY: f64 = -0.20;
const RATE_CONFLICT_PENALTY: f64 = -0.25;
const CODED_PICKLIST_PENALTY: f64 = -0.15;
const SPECIALIZED_TARGET_BOOST: f64 = 0.07;
const GENERIC_TARGET_PENALTY: f64 = -0.10;

/// Exact-name pairs from core-banking export dictionaries, both sides
/// normalized to compact lowercase.
static BANKING_PAIRS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("cifno", "customernumber"),
        ("cifkey", "customernumber"),
        ("ddaacctno", "accountnumber"),
        ("shareacctno", "accountnumber"),
        ("abano", "routingnumber"),
        ("abartno", "routingnumber"),
        ("odlimit", "overdraftlimit"),
        ("intrt", "interestrate"),
        ("matdt", "maturitydate"),
        ("branchcd", "branchcode"),
        ("offcd", "officercode"),
        ("prodcd", "productcode"),
    ])
});

/// External identifier scheme suggested by a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentifierScheme {
    AbaRouting,
    Iban,
    SwiftBic,
}

impl IdentifierScheme {
    fn as_str(self) -> &'static str {
        match self {
            Self::AbaRouting => "ABA routing",
            Self::Iban => "IBAN",
            Self::SwiftBic => "SWIFT/BIC",
        }
    }
}

pub struct BankingAgent;

impl DomainAgent for BankingAgent {
    fn name(&self) -> &'static str {
        "banking"
    }

    fn applies_to(&self, ctx: &AgentContext<'_>) -> bool {
        ctx.source_system.family() == SystemFamily::Banking
            || ctx.target_system.family() == SystemFamily::Banking
    }

    fn refine(
        &self,
        ctx: &AgentContext<'_>,
        mut mappings: Vec<FieldMapping>,
        sink: &mut StepSink<'_>,
    ) -> Vec<FieldMapping> {
        let family_split = specialized_family_split(ctx);

        for mapping in &mut mappings {
            let Some((source, target)) = ctx.endpoints(mapping) else {
                continue;
            };

            if let Some(note) = synonym_match(source, target) {
                apply_delta(self.name(), "synonym_boost", mapping, SYNONYM_BOOST, &note, sink);
            }

            match (identifier_scheme(&source.name), identifier_scheme(&target.name)) {
                (Some(s), Some(t)) if s == t => {
                    let note = format!("Both sides carry {} identifiers", s.as_str());
                    apply_delta(
                        self.name(),
                        "scheme_boost",
                        mapping,
                        SCHEME_MATCH_BOOST,
                        &note,
                        sink,
                    );
                }
                (Some(s), Some(t)) => {
                    let note = format!(
                        "Identifier scheme conflict: {} mapped to {}",
                        s.as_str(),
                        t.as_str()
                    );
                    tracing::warn!(
                        source = %source.name,
                        target = %target.name,
                        "identifier scheme mismatch"
                    );
                    apply_delta(
                        self.name(),
                        "scheme_conflict",
                        mapping,
                        SCHEME_MISMATCH_PENALTY,
                        &note,
                        sink,
                    );
                }
                _ => {}
            }

            if let Some(note) = rate_conflict(source, target) {
                apply_delta(
                    self.name(),
                    "rate_conflict",
                    mapping,
                    RATE_CONFLICT_PENALTY,
                    &note,
                    sink,
                );
            }

            if is_coded_picklist(source) && target.semantic_type.group() == TypeGroup::StringLike {
                let note = format!(
                    "{} uses coded values; a value-level lookup is required before populating {}",
                    source.name, target.name
                );
                if mapping.transform.kind != TransformKind::Lookup {
                    mapping.transform = corebridge_model::Transform::new(
                        TransformKind::Lookup,
                        format!("Translate {} codes into {} values", source.name, target.name),
                    );
                }
                apply_delta(
                    self.name(),
                    "coded_picklist",
                    mapping,
                    CODED_PICKLIST_PENALTY,
                    &note,
                    sink,
                );
            }

            if let Some((specialized, generic)) = &family_split {
                if let Some(source_entity) = ctx.source_entity_of(mapping) {
                    if account_like_source(source_entity) {
                        if let Some(target_entity) = ctx.target_entity_of(mapping) {
                            if &target_entity.id == specialized {
                                apply_delta(
                                    self.name(),
                                    "family_preference",
                                    mapping,
                                    SPECIALIZED_TARGET_BOOST,
                                    "Specialized financial account entity preferred for banking records",
                                    sink,
                                );
                            } else if &target_entity.id == generic {
                                apply_delta(
                                    self.name(),
                                    "family_preference",
                                    mapping,
                                    GENERIC_TARGET_PENALTY,
                                    "Generic account entity chosen although a specialized financial account entity exists",
                                    sink,
                                );
                            }
                        }
                    }
                }
            }
        }

        mappings
    }
}

/// Ids of the specialized financial-account target entity and the
/// generic account entity, when the target schema offers both.
fn specialized_family_split(
    ctx: &AgentContext<'_>,
) -> Option<(corebridge_model::EntityId, corebridge_model::EntityId)> {
    if !ctx.source_system.is_specialized_banking_platform() {
        return None;
    }

    let mut specialized = None;
    let mut generic = None;
    for em in ctx.entity_mappings {
        let Some(entity) = ctx.entity(&em.target_entity_id) else {
            continue;
        };
        let normalized = corebridge_match::normalize_entity_name(&entity.name);
        if normalized == "account" {
            generic = Some(entity.id.clone());
        } else if canonical_target_family(&entity.name) == Some(CanonicalFamily::FinancialAccount) {
            specialized = Some(entity.id.clone());
        }
    }
    specialized.zip(generic)
}

fn account_like_source(entity: &Entity) -> bool {
    matches!(
        core_record_family(&entity.name),
        Some(CanonicalFamily::FinancialAccount | CanonicalFamily::Loan | CanonicalFamily::Card)
    )
}

fn synonym_match(source: &Field, target: &Field) -> Option<String> {
    let key = corebridge_match::tables::normalize_name(&source.name);
    let expected = BANKING_PAIRS.get(key.as_str())?;
    if corebridge_match::tables::normalize_name(&target.name) == *expected {
        Some(format!(
            "Core-banking dictionary pairs {} with {}",
            source.name, target.name
        ))
    } else {
        None
    }
}

fn identifier_scheme(name: &str) -> Option<IdentifierScheme> {
    let tokens = token_set(name);
    if tokens.contains("iban") {
        return Some(IdentifierScheme::Iban);
    }
    if tokens.contains("swift") || tokens.contains("bic") {
        return Some(IdentifierScheme::SwiftBic);
    }
    if tokens.contains("routing") || tokens.contains("aba") {
        return Some(IdentifierScheme::AbaRouting);
    }
    None
}

/// Loan pricing rates and deposit yields are different quantities even
/// though both names usually end in "rate".
fn rate_conflict(source: &Field, target: &Field) -> Option<String> {
    let src = token_set(&source.name);
    let tgt = token_set(&target.name);
    let src_is_rate = src.contains("rate") || src.contains("apr") || src.contains("apy");
    let tgt_is_rate = tgt.contains("rate") || tgt.contains("apr") || tgt.contains("apy");
    if !src_is_rate || !tgt_is_rate {
        return None;
    }

    let loan_terms = ["loan", "apr", "mortgage", "note"];
    let deposit_terms = ["apy", "deposit", "savings", "checking", "share", "yield"];
    let src_loan = loan_terms.iter().any(|t| src.contains(*t));
    let src_deposit = deposit_terms.iter().any(|t| src.contains(*t));
    let tgt_loan = loan_terms.iter().any(|t| tgt.contains(*t));
    let tgt_deposit = deposit_terms.iter().any(|t| tgt.contains(*t));

    if (src_loan && tgt_deposit) || (src_deposit && tgt_loan) {
        Some(format!(
            "Rate terminology conflict: {} prices a different product than {}",
            source.name, target.name
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebridge_model::{
        Entity, EntityMapping, FieldCatalog, MappingStatus, SemanticType, SystemId, SystemType,
    };

    fn build_ctx(
        fields: &[Field],
        entities: Vec<Entity>,
    ) -> (FieldCatalog, BTreeMap<corebridge_model::EntityId, Entity>) {
        let catalog = FieldCatalog::new(fields);
        let map = entities.into_iter().map(|e| (e.id.clone(), e)).collect();
        (catalog, map)
    }

    #[test]
    fn loan_rate_to_deposit_yield_is_penalized() {
        let src_entity = Entity::new(SystemId::new("fis"), "LOAN_MASTER");
        let tgt_entity = Entity::new(SystemId::new("sf"), "FinServ__FinancialAccount__c");
        let source = Field::new(src_entity.id.clone(), "LOAN_APR_RT", SemanticType::Decimal);
        let target = Field::new(tgt_entity.id.clone(), "DepositYieldRate", SemanticType::Decimal);
        let em = EntityMapping::new(src_entity.id.clone(), tgt_entity.id.clone(), 0.9, "test");
        let mapping = FieldMapping::new(
            em.id.clone(),
            source.id.clone(),
            target.id.clone(),
            corebridge_model::Transform::direct(),
            0.8,
            "seed",
        );

        let fields = vec![source, target];
        let ems = vec![em];
        let (catalog, entities) = build_ctx(&fields, vec![src_entity, tgt_entity]);
        let ctx = AgentContext {
            source_system: SystemType::Fis,
            target_system: SystemType::Salesforce,
            catalog: &catalog,
            entities: &entities,
            entity_mappings: &ems,
        };

        let mut sink = StepSink::new();
        let out = BankingAgent.execute(&ctx, vec![mapping], &mut sink);

        assert!(out[0].confidence() < 0.8 - 0.2);
        assert_eq!(out[0].status, MappingStatus::Adjusted);
        assert!(out[0].rationale.contains("terminology conflict"));
        assert!(sink.steps().iter().any(|s| s.action == "rate_conflict"));
        assert!(sink.steps().iter().any(|s| s.action == "summary"));
    }

    #[test]
    fn coded_picklist_switches_transform_to_lookup() {
        let src_entity = Entity::new(SystemId::new("fis"), "ACCOUNT_MASTER");
        let tgt_entity = Entity::new(SystemId::new("sf"), "FinServ__FinancialAccount__c");
        let mut source = Field::new(src_entity.id.clone(), "STATUS_CD", SemanticType::Picklist);
        source.picklist_values = Some(vec!["A".into(), "C".into(), "F".into()]);
        let target = Field::new(tgt_entity.id.clone(), "Status", SemanticType::String);
        let em = EntityMapping::new(src_entity.id.clone(), tgt_entity.id.clone(), 0.9, "test");
        let mapping = FieldMapping::new(
            em.id.clone(),
            source.id.clone(),
            target.id.clone(),
            corebridge_model::Transform::direct(),
            0.7,
            "seed",
        );

        let fields = vec![source, target];
        let ems = vec![em];
        let (catalog, entities) = build_ctx(&fields, vec![src_entity, tgt_entity]);
        let ctx = AgentContext {
            source_system: SystemType::Fiserv,
            target_system: SystemType::Salesforce,
            catalog: &catalog,
            entities: &entities,
            entity_mappings: &ems,
        };

        let mut sink = StepSink::new();
        let out = BankingAgent.execute(&ctx, vec![mapping], &mut sink);

        assert_eq!(out[0].transform.kind, TransformKind::Lookup);
        assert!(out[0].confidence() < 0.7);
        assert!(out[0].rationale.contains("value-level lookup"));
    }

    #[test]
    fn matching_routing_identifiers_are_boosted() {
        let src_entity = Entity::new(SystemId::new("jh"), "ACCOUNT_MASTER");
        let tgt_entity = Entity::new(SystemId::new("sf"), "FinServ__FinancialAccount__c");
        let source = Field::new(src_entity.id.clone(), "ABA_RTNG_NO", SemanticType::String);
        let target = Field::new(tgt_entity.id.clone(), "RoutingNumber", SemanticType::String);
        let em = EntityMapping::new(src_entity.id.clone(), tgt_entity.id.clone(), 0.9, "test");
        let mapping = FieldMapping::new(
            em.id.clone(),
            source.id.clone(),
            target.id.clone(),
            corebridge_model::Transform::direct(),
            0.6,
            "seed",
        );

        let fields = vec![source, target];
        let ems = vec![em];
        let (catalog, entities) = build_ctx(&fields, vec![src_entity, tgt_entity]);
        let ctx = AgentContext {
            source_system: SystemType::JackHenry,
            target_system: SystemType::Salesforce,
            catalog: &catalog,
            entities: &entities,
            entity_mappings: &ems,
        };

        let mut sink = StepSink::new();
        let out = BankingAgent.execute(&ctx, vec![mapping], &mut sink);
        assert!(out[0].confidence() > 0.6);
    }

    #[test]
    fn non_banking_run_is_gated_out() {
        let catalog = FieldCatalog::default();
        let entities = BTreeMap::new();
        let ctx = AgentContext {
            source_system: SystemType::Salesforce,
            target_system: SystemType::Sap,
            catalog: &catalog,
            entities: &entities,
            entity_mappings: &[],
        };
        let mut sink = StepSink::new();
        let out = BankingAgent.execute(&ctx, Vec::new(), &mut sink);
        assert!(out.is_empty());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.steps()[0].action, "skipped");
    }
}
