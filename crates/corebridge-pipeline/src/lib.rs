//! Multi-stage rescoring pipeline for schema migration mappings.
//!
//! Orchestrates schema enrichment, compliance scanning, domain agents,
//! optional language-model integration, rationale enrichment, and final
//! validation over a candidate mapping set. The standalone schema
//! inferencer and compliance scan are re-exported so callers with no
//! need for the full chain can reach them from one crate.

pub mod enrich;
pub mod pipeline;

pub use pipeline::{
    PipelinePhase, PipelineRequest, PipelineResult, Stage, run_pipeline,
};

pub use corebridge_compliance::scan;
pub use corebridge_infer::{InferRequest, InferredSchema, infer_schema};
