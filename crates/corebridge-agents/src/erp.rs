//! ERP platform heuristics.
//!
//! SAP exports name columns after the data dictionary (KUNNR, NAME1,
//! SMTP_ADDR) rather than after the business concept, so name similarity
//! alone underrates many correct pairs. The dictionary below restores
//! the business meaning of the common customer-master columns.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use corebridge_match::tables::normalize_name;
use corebridge_model::{FieldMapping, StepSink, SystemFamily, TransformKind, TypeGroup};

use crate::agent::{AgentContext, DomainAgent, apply_delta, is_coded_picklist};

const DICTIONARY_BOOST: f64 = 0.12;
const CLIENT_FIELD_PENALTY: f64 = -0.20;
const CODED_PICKLIST_PENALTY: f64 = -0.15;

/// SAP technical column names and the normalized target-field name each
/// one should land on.
static SAP_DICTIONARY: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("kunnr", "customernumber"),
        ("lifnr", "vendornumber"),
        ("name1", "name"),
        ("smtpaddr", "email"),
        ("telf1", "phone"),
        ("telf2", "mobilephone"),
        ("stras", "mailingstreet"),
        ("ort01", "mailingcity"),
        ("regio", "mailingstate"),
        ("pstlz", "mailingpostalcode"),
        ("land1", "country"),
        ("stcd1", "taxid"),
        ("erdat", "createddate"),
        ("aedat", "lastmodifieddate"),
        ("waers", "currency"),
        ("bukrs", "companycode"),
    ])
});

pub struct ErpAgent;

impl DomainAgent for ErpAgent {
    fn name(&self) -> &'static str {
        "erp"
    }

    fn applies_to(&self, ctx: &AgentContext<'_>) -> bool {
        ctx.source_system.family() == SystemFamily::Erp
            || ctx.target_system.family() == SystemFamily::Erp
    }

    fn refine(
        &self,
        ctx: &AgentContext<'_>,
        mut mappings: Vec<FieldMapping>,
        sink: &mut StepSink<'_>,
    ) -> Vec<FieldMapping> {
        for mapping in &mut mappings {
            let Some((source, target)) = ctx.endpoints(mapping) else {
                continue;
            };

            let source_key = normalize_name(&source.name);

            if source_key == "mandt" {
                let note = format!(
                    "MANDT is the SAP client number, environment metadata rather than business data; {} should not receive it",
                    target.name
                );
                tracing::warn!(target = %target.name, "client number mapped to business field");
                apply_delta(
                    self.name(),
                    "client_field",
                    mapping,
                    CLIENT_FIELD_PENALTY,
                    &note,
                    sink,
                );
                continue;
            }

            if let Some(expected) = SAP_DICTIONARY.get(source_key.as_str()) {
                if normalize_name(&target.name) == *expected {
                    let note = format!(
                        "SAP data dictionary resolves {} to {}",
                        source.name, target.name
                    );
                    apply_delta(
                        self.name(),
                        "dictionary_boost",
                        mapping,
                        DICTIONARY_BOOST,
                        &note,
                        sink,
                    );
                }
            }

            if is_coded_picklist(source) && target.semantic_type.group() == TypeGroup::StringLike {
                let note = format!(
                    "{} carries coded values; map them through a lookup before loading {}",
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
        }
        mappings
    }
}
