//! CRM platform heuristics.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use corebridge_match::tables::normalize_name;
use corebridge_model::{Field, FieldMapping, StepSink, SystemFamily, TransformKind, TypeGroup};

use crate::agent::{AgentContext, DomainAgent, apply_delta, is_coded_picklist};

const SYNONYM_BOOST: f64 = 0.10;
const EXTERNAL_ID_BOOST: f64 = 0.08;
const KEY_TO_EXTERNAL_ID_BOOST: f64 = 0.05;
const CODED_PICKLIST_PENALTY: f64 = -0.15;

/// Business-vocabulary pairs that CRM object models spell differently
/// than operational systems do, both sides normalized.
static CRM_PAIRS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("company", "accountname"),
        ("companyname", "accountname"),
        ("orgname", "accountname"),
        ("organization", "accountname"),
        ("person", "contactname"),
        ("individual", "contactname"),
        ("deal", "opportunityname"),
        ("dealname", "opportunityname"),
        ("prospect", "leadname"),
        ("mobile", "mobilephone"),
        ("cell", "mobilephone"),
        ("title", "jobtitle"),
        ("zip", "mailingpostalcode"),
        ("workphone", "phone"),
    ])
});

pub struct CrmAgent;

impl DomainAgent for CrmAgent {
    fn name(&self) -> &'static str {
        "crm"
    }

    fn applies_to(&self, ctx: &AgentContext<'_>) -> bool {
        ctx.source_system.family() == SystemFamily::Crm
            || ctx.target_system.family() == SystemFamily::Crm
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

            if let Some(note) = synonym_match(source, target) {
                apply_delta(self.name(), "synonym_boost", mapping, SYNONYM_BOOST, &note, sink);
            }

            if source.is_external_id && target.is_external_id {
                let note = format!(
                    "{} and {} are both declared external identifiers",
                    source.name, target.name
                );
                apply_delta(
                    self.name(),
                    "external_id",
                    mapping,
                    EXTERNAL_ID_BOOST,
                    &note,
                    sink,
                );
            } else if source.is_key && target.is_external_id {
                let note = format!(
                    "Source key {} lands on external id {} for upsert matching",
                    source.name, target.name
                );
                apply_delta(
                    self.name(),
                    "external_id",
                    mapping,
                    KEY_TO_EXTERNAL_ID_BOOST,
                    &note,
                    sink,
                );
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

fn synonym_match(source: &Field, target: &Field) -> Option<String> {
    let key = normalize_name(&source.name);
    let expected = CRM_PAIRS.get(key.as_str())?;
    if normalize_name(&target.name) == *expected {
        Some(format!(
            "CRM vocabulary pairs {} with {}",
            source.name, target.name
        ))
    } else {
        None
    }
}
