//! The fixed-stage rescoring pipeline.
//!
//! Stages run in one fixed order: schema enrichment, compliance scan,
//! domain agents, completion-provider integration, rationale enrichment,
//! final validation. The pipeline always completes; external-service
//! failures degrade inside their stage and never abort the run.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use corebridge_agents::{AgentContext, AgentRegistry, CompletionProvider, ProposalIntegrator};
use corebridge_compliance::scan;
use corebridge_model::{
    AgentStep, ComplianceReport, Entity, EntityMapping, Field, FieldCatalog, FieldMapping,
    FieldMappingId, MappingStatus, StepSink, SystemType,
};

use crate::enrich::{enrich_rationales, enrich_schema};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SchemaEnrichment,
    ComplianceScan,
    DomainAgents,
    LlmIntegration,
    RationaleEnrichment,
    FinalValidation,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::SchemaEnrichment,
        Stage::ComplianceScan,
        Stage::DomainAgents,
        Stage::LlmIntegration,
        Stage::RationaleEnrichment,
        Stage::FinalValidation,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaEnrichment => "schema_enrichment",
            Self::ComplianceScan => "compliance_scan",
            Self::DomainAgents => "domain_agents",
            Self::LlmIntegration => "llm_integration",
            Self::RationaleEnrichment => "rationale_enrichment",
            Self::FinalValidation => "final_validation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse run phase, reported through steps and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Running(Stage),
    Complete,
    Failed,
}

/// Everything one rescoring run needs.
///
/// The caller owns schema and mapping data; the pipeline owns nothing
/// beyond the duration of the run. `on_step` receives every step as it
/// is emitted; the full step list is also returned in the result.
pub struct PipelineRequest<'a> {
    pub source_system: SystemType,
    pub target_system: SystemType,
    pub source_entities: Vec<Entity>,
    pub target_entities: Vec<Entity>,
    pub fields: Vec<Field>,
    pub entity_mappings: Vec<EntityMapping>,
    pub field_mappings: Vec<FieldMapping>,
    pub provider: Option<&'a dyn CompletionProvider>,
    pub on_step: Option<Box<dyn FnMut(&AgentStep) + 'a>>,
}

/// Outcome of one pipeline run.
///
/// `fields` is the input field list after schema enrichment, so callers
/// persisting a run see the resolved types rather than the uploaded ones.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub fields: Vec<Field>,
    pub field_mappings: Vec<FieldMapping>,
    pub steps: Vec<AgentStep>,
    pub total_improved: usize,
    pub compliance_report: ComplianceReport,
    pub stages_run: Vec<Stage>,
    pub duration_ms: u64,
}

/// Runs the full stage chain over a proposed mapping set.
#[must_use]
pub fn run_pipeline(request: PipelineRequest<'_>) -> PipelineResult {
    let started = Instant::now();
    let PipelineRequest {
        source_system,
        target_system,
        source_entities,
        target_entities,
        mut fields,
        entity_mappings,
        field_mappings,
        provider,
        on_step,
    } = request;

    let mut sink = match on_step {
        Some(callback) => StepSink::with_callback(callback),
        None => StepSink::new(),
    };
    let mut phase = PipelinePhase::Idle;
    let mut stages_run = Vec::with_capacity(Stage::ALL.len());
    let initial: BTreeMap<FieldMappingId, f64> = field_mappings
        .iter()
        .map(|m| (m.id.clone(), m.confidence()))
        .collect();

    let enter = |stage: Stage, phase: &mut PipelinePhase, stages_run: &mut Vec<Stage>| {
        *phase = PipelinePhase::Running(stage);
        stages_run.push(stage);
        tracing::info!(phase = ?*phase, "stage started");
    };

    // Schema enrichment runs before the catalog is built so every later
    // stage sees the resolved types.
    enter(Stage::SchemaEnrichment, &mut phase, &mut stages_run);
    let resolved = enrich_schema(&mut fields);
    sink.push(
        AgentStep::new(
            "pipeline",
            Stage::SchemaEnrichment.as_str(),
            format!("resolved {resolved} unknown field types"),
        )
        .with_metadata("resolved", resolved.to_string()),
    );

    let catalog = FieldCatalog::new(&fields);
    let entities: BTreeMap<_, _> = source_entities
        .iter()
        .chain(target_entities.iter())
        .map(|entity| (entity.id.clone(), entity.clone()))
        .collect();
    let ctx = AgentContext {
        source_system,
        target_system,
        catalog: &catalog,
        entities: &entities,
        entity_mappings: &entity_mappings,
    };

    enter(Stage::ComplianceScan, &mut phase, &mut stages_run);
    let compliance_report = scan(&catalog, &field_mappings);
    sink.push(
        AgentStep::new(
            "pipeline",
            Stage::ComplianceScan.as_str(),
            format!(
                "{} issues ({} errors)",
                compliance_report.issues.len(),
                compliance_report.error_count()
            ),
        )
        .with_metadata("issues", compliance_report.issues.len().to_string())
        .with_metadata("errors", compliance_report.error_count().to_string()),
    );

    enter(Stage::DomainAgents, &mut phase, &mut stages_run);
    let registry = AgentRegistry::default();
    let mut working = field_mappings;
    for agent in registry.agents() {
        let refined = agent.execute(&ctx, working.clone(), &mut sink);
        working = merge_keep_higher(working, refined);
    }

    enter(Stage::LlmIntegration, &mut phase, &mut stages_run);
    working = ProposalIntegrator::new(provider).integrate(&ctx, working, &mut sink);

    enter(Stage::RationaleEnrichment, &mut phase, &mut stages_run);
    let enriched = enrich_rationales(&catalog, &mut working);
    sink.push(
        AgentStep::new(
            "pipeline",
            Stage::RationaleEnrichment.as_str(),
            format!("enriched {enriched} rationales"),
        )
        .with_metadata("enriched", enriched.to_string()),
    );

    enter(Stage::FinalValidation, &mut phase, &mut stages_run);
    let mut total_improved = 0;
    for mapping in &mut working {
        mapping.status = MappingStatus::Validated;
        if initial
            .get(&mapping.id)
            .is_none_or(|prior| mapping.confidence() > *prior)
        {
            total_improved += 1;
        }
    }
    sink.push(
        AgentStep::new(
            "pipeline",
            Stage::FinalValidation.as_str(),
            format!("{total_improved} of {} mappings improved", working.len()),
        )
        .with_metadata("improved", total_improved.to_string()),
    );

    phase = PipelinePhase::Complete;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        ?phase,
        mappings = working.len(),
        total_improved,
        duration_ms,
        "pipeline complete"
    );

    PipelineResult {
        fields,
        field_mappings: working,
        steps: sink.into_steps(),
        total_improved,
        compliance_report,
        stages_run,
        duration_ms,
    }
}

/// Keep-higher-confidence merge by mapping id.
///
/// When an agent's pass lowered a mapping that a prior pass had rated
/// higher, the higher-rated version wins in the working set; the agent's
/// penalty remains visible in its steps.
fn merge_keep_higher(current: Vec<FieldMapping>, refined: Vec<FieldMapping>) -> Vec<FieldMapping> {
    let mut prior: BTreeMap<FieldMappingId, FieldMapping> = current
        .into_iter()
        .map(|mapping| (mapping.id.clone(), mapping))
        .collect();

    let mut merged = Vec::with_capacity(refined.len());
    for mapping in refined {
        match prior.remove(&mapping.id) {
            Some(existing) if existing.confidence() > mapping.confidence() => {
                merged.push(existing);
            }
            _ => merged.push(mapping),
        }
    }
    merged.extend(prior.into_values());
    merged
}
