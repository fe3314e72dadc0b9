//! Domain agent trait and registry.
//!
//! Agents refine candidate field mappings with platform-family
//! heuristics. Each agent gates itself on the system families of the
//! run; a gated-out agent leaves the mappings untouched and reports a
//! single informational step so the trail stays complete.

use std::collections::BTreeMap;
use std::time::Instant;

use corebridge_model::{
    AgentStep, Entity, EntityId, EntityMapping, EntityMappingId, Field, FieldCatalog, FieldMapping,
    FieldMappingId, MappingStatus, StepSink, SystemType,
};

/// Read-only context shared by every agent in a run.
pub struct AgentContext<'a> {
    pub source_system: SystemType,
    pub target_system: SystemType,
    pub catalog: &'a FieldCatalog,
    pub entities: &'a BTreeMap<EntityId, Entity>,
    pub entity_mappings: &'a [EntityMapping],
}

impl<'a> AgentContext<'a> {
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&'a Entity> {
        self.entities.get(id)
    }

    #[must_use]
    pub fn entity_mapping(&self, id: &EntityMappingId) -> Option<&'a EntityMapping> {
        self.entity_mappings.iter().find(|em| &em.id == id)
    }

    /// Resolves both endpoints of a field mapping through the catalog.
    ///
    /// Returns `None` when either endpoint is unresolved; agents pass
    /// such mappings through untouched.
    #[must_use]
    pub fn endpoints(&self, mapping: &FieldMapping) -> Option<(&'a Field, &'a Field)> {
        let source = self.catalog.get(&mapping.source_field_id)?;
        let target = self.catalog.get(&mapping.target_field_id)?;
        Some((source, target))
    }

    /// Source-side entity of the entity mapping a field mapping belongs to.
    #[must_use]
    pub fn source_entity_of(&self, mapping: &FieldMapping) -> Option<&'a Entity> {
        let em = self.entity_mapping(&mapping.entity_mapping_id)?;
        self.entity(&em.source_entity_id)
    }

    /// Target-side entity of the entity mapping a field mapping belongs to.
    #[must_use]
    pub fn target_entity_of(&self, mapping: &FieldMapping) -> Option<&'a Entity> {
        let em = self.entity_mapping(&mapping.entity_mapping_id)?;
        self.entity(&em.target_entity_id)
    }
}

/// A heuristic refinement pass over proposed field mappings.
pub trait DomainAgent {
    /// Stable agent name used in steps and logs.
    fn name(&self) -> &'static str;

    /// Whether this agent has anything to say about the run.
    fn applies_to(&self, ctx: &AgentContext<'_>) -> bool;

    /// Refines the mappings, emitting one step per confidence change.
    fn refine(
        &self,
        ctx: &AgentContext<'_>,
        mappings: Vec<FieldMapping>,
        sink: &mut StepSink<'_>,
    ) -> Vec<FieldMapping>;

    /// Gates, runs, and summarizes one agent pass.
    ///
    /// A gated-out agent emits exactly one informational step and returns
    /// the input unchanged. An applicable agent always closes with one
    /// summary step carrying the adjustment count and elapsed time.
    fn execute(
        &self,
        ctx: &AgentContext<'_>,
        mappings: Vec<FieldMapping>,
        sink: &mut StepSink<'_>,
    ) -> Vec<FieldMapping> {
        if !self.applies_to(ctx) {
            tracing::debug!(agent = self.name(), "agent not applicable, skipping");
            sink.push(
                AgentStep::new(
                    self.name(),
                    "skipped",
                    format!(
                        "not applicable to {} \u{2192} {}, {} mappings unchanged",
                        ctx.source_system,
                        ctx.target_system,
                        mappings.len()
                    ),
                )
                .with_metadata("mappings", mappings.len().to_string()),
            );
            return mappings;
        }

        let started = Instant::now();
        let before: BTreeMap<FieldMappingId, f64> = mappings
            .iter()
            .map(|m| (m.id.clone(), m.confidence()))
            .collect();

        let refined = self.refine(ctx, mappings, sink);

        let adjusted = refined
            .iter()
            .filter(|m| {
                before
                    .get(&m.id)
                    .is_none_or(|prior| (prior - m.confidence()).abs() > f64::EPSILON)
            })
            .count();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            agent = self.name(),
            adjusted,
            total = refined.len(),
            elapsed_ms,
            "agent pass complete"
        );
        sink.push(
            AgentStep::new(
                self.name(),
                "summary",
                format!("adjusted {adjusted} of {} mappings", refined.len()),
            )
            .with_duration_ms(elapsed_ms)
            .with_metadata("adjusted", adjusted.to_string())
            .with_metadata("total", refined.len().to_string()),
        );
        refined
    }
}

/// Ordered collection of the built-in domain agents.
///
/// Order is fixed: banking heuristics run first, then CRM, then ERP.
pub struct AgentRegistry {
    agents: Vec<Box<dyn DomainAgent>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self {
            agents: vec![
                Box::new(crate::banking::BankingAgent),
                Box::new(crate::crm::CrmAgent),
                Box::new(crate::erp::ErpAgent),
            ],
        }
    }
}

impl AgentRegistry {
    #[must_use]
    pub fn agents(&self) -> &[Box<dyn DomainAgent>] {
        &self.agents
    }
}

/// Applies a confidence delta with a step and rationale note.
pub(crate) fn apply_delta(
    agent: &'static str,
    action: &str,
    mapping: &mut FieldMapping,
    delta: f64,
    note: &str,
    sink: &mut StepSink<'_>,
) {
    let before = mapping.confidence();
    mapping.adjust_confidence(delta);
    mapping.append_rationale(note);
    mapping.status = MappingStatus::Adjusted;
    sink.push(
        AgentStep::new(agent, action, note)
            .with_mapping(mapping.id.clone())
            .with_confidence(before, mapping.confidence()),
    );
}

/// Whether a field's enumerated values look like opaque codes rather
/// than human-readable labels.
pub(crate) fn is_coded_picklist(field: &Field) -> bool {
    let Some(values) = field.picklist_values.as_deref() else {
        return false;
    };
    !values.is_empty()
        && values.iter().all(|value| {
            let trimmed = value.trim();
            !trimmed.is_empty()
                && trimmed.len() <= 4
                && trimmed
                    .chars()
                    .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
        })
}
