//! Command implementations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use corebridge_infer::{InferRequest, InferredSchema, infer_schema};
use corebridge_match::CandidateMatcher;
use corebridge_model::{AgentStep, FieldCatalog, SystemId};
use corebridge_pipeline::{PipelineRequest, run_pipeline, scan};

use crate::cli::{InferArgs, MapArgs, ScanArgs};
use crate::types::{MapRun, MappingFile, WorkspaceFile};

/// Loads a workspace, proposes mappings, and runs the pipeline.
pub fn run_map(args: &MapArgs) -> anyhow::Result<MapRun> {
    let text = fs::read_to_string(&args.workspace)
        .with_context(|| format!("reading {}", args.workspace.display()))?;
    let workspace: WorkspaceFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.workspace.display()))?;

    let (source_entities, mut fields) = workspace.source.build();
    let (target_entities, target_fields) = workspace.target.build();
    fields.extend(target_fields);
    tracing::info!(
        source = %workspace.source.system,
        target = %workspace.target.system,
        entities = source_entities.len() + target_entities.len(),
        fields = fields.len(),
        "workspace loaded"
    );

    let catalog = FieldCatalog::new(&fields);
    let outcome = CandidateMatcher::new(&target_entities, &catalog).propose(&source_entities);

    let progress = if args.no_progress {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    };
    let step_bar = progress.clone();

    let request = PipelineRequest {
        source_system: workspace.source.system,
        target_system: workspace.target.system,
        source_entities,
        target_entities,
        fields,
        entity_mappings: outcome.entity_mappings.clone(),
        field_mappings: outcome.field_mappings,
        provider: None,
        on_step: step_bar.map(|bar| {
            Box::new(move |step: &AgentStep| {
                bar.set_message(format!("{}: {}", step.agent, step.action));
            }) as Box<dyn FnMut(&AgentStep)>
        }),
    };
    let result = run_pipeline(request);
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    // The pipeline's enrichment stage resolves unknown types, so the
    // persisted field list comes from the result, not the input catalog.
    let file = MappingFile {
        source_system: workspace.source.system,
        target_system: workspace.target.system,
        fields: result.fields,
        entity_mappings: outcome.entity_mappings,
        field_mappings: result.field_mappings,
        compliance_report: result.compliance_report,
        total_improved: result.total_improved,
        stages_run: MappingFile::stage_names(&result.stages_run),
        duration_ms: result.duration_ms,
        steps: if args.include_steps {
            result.steps
        } else {
            Vec::new()
        },
    };

    let output_path = output_path(&args.workspace, args.output.as_deref(), "mappings.json");
    write_json(&output_path, &file)?;
    Ok(MapRun { output_path, file })
}

/// Infers a schema from an uploaded file and writes it as JSON.
pub fn run_infer(args: &InferArgs) -> anyhow::Result<(PathBuf, InferredSchema)> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let filename = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let system: corebridge_model::SystemType = args.system.into();

    let schema = infer_schema(&InferRequest {
        content,
        filename,
        owner_system_id: SystemId::new(system.as_str()),
    })?;
    tracing::info!(
        entities = schema.entities.len(),
        fields = schema.fields.len(),
        relationships = schema.relationships.len(),
        "schema inferred"
    );

    let output_path = output_path(&args.input, args.output.as_deref(), "schema.json");
    write_json(&output_path, &schema)?;
    Ok((output_path, schema))
}

/// Re-runs the compliance rules over a previously written mapping file.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<MappingFile> {
    let text = fs::read_to_string(&args.mappings)
        .with_context(|| format!("reading {}", args.mappings.display()))?;
    let mut file: MappingFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.mappings.display()))?;

    let catalog = FieldCatalog::new(&file.fields);
    file.compliance_report = scan(&catalog, &file.field_mappings);

    if let Some(path) = &args.output {
        write_json(path, &file.compliance_report)?;
    }
    Ok(file)
}

/// `<input>.<suffix>` next to the input unless an explicit path is given.
fn output_path(input: &Path, explicit: Option<&Path>, suffix: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let mut name = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            name.push('.');
            name.push_str(suffix);
            input.with_file_name(name)
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_appends_suffix() {
        let path = output_path(Path::new("/tmp/core.json"), None, "mappings.json");
        assert_eq!(path, PathBuf::from("/tmp/core.mappings.json"));

        let explicit = output_path(
            Path::new("/tmp/core.json"),
            Some(Path::new("/tmp/out.json")),
            "mappings.json",
        );
        assert_eq!(explicit, PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn workspace_file_round_trips_minimal_input() {
        let json = r#"{
            "source": {
                "system": "fiserv",
                "entities": [
                    {"name": "CUSTOMER_MASTER", "fields": [
                        {"name": "CUST_NO", "is_key": true},
                        {"name": "SSN", "compliance_tags": ["GLBA_NPI"]}
                    ]}
                ]
            },
            "target": {
                "system": "salesforce",
                "entities": [{"name": "Contact", "fields": [{"name": "Name"}]}]
            }
        }"#;
        let workspace: WorkspaceFile = serde_json::from_str(json).unwrap();
        let (entities, fields) = workspace.source.build();
        assert_eq!(entities.len(), 1);
        assert_eq!(fields.len(), 2);
        assert!(fields[0].is_key);
        assert!(!fields[1].compliance_tags().is_empty());
        // Unspecified types default to unknown and are resolved later.
        assert_eq!(
            fields[0].semantic_type,
            corebridge_model::SemanticType::Unknown
        );
    }
}
