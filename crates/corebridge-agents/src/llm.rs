//! Completion-provider integration.
//!
//! The pipeline asks an optional language-model provider for a second
//! opinion on the proposed field mappings. Transport lives behind the
//! [`CompletionProvider`] trait; this module owns prompt construction
//! (with regulated names redacted), response parsing, and the rule that
//! a proposal may only raise confidence on an existing mapping. Every
//! failure mode degrades to a no-op so a flaky or absent provider never
//! blocks a run.

use serde::Deserialize;

use corebridge_model::{AgentStep, FieldMapping, MappingStatus, StepSink};

use crate::agent::AgentContext;
use crate::redaction::{describe_entity, presentable_name, redacted_count};

/// Proposals below this confidence are discarded unread.
pub const MIN_PROPOSAL_CONFIDENCE: f64 = 0.55;
/// Existing mappings at or above this confidence are sent as hints.
pub const HINT_CONFIDENCE: f64 = 0.85;
/// At most this many hints are included in the prompt.
pub const MAX_HINTS: usize = 5;

const AGENT: &str = "llm";

const SYSTEM_PROMPT: &str = "You are a data-migration analyst reviewing proposed field mappings \
between a legacy enterprise system and its replacement. Respond with a JSON array only. Each \
element must be an object with keys \"sourceField\", \"targetField\", \"confidence\" (0.0 to \
1.0), and \"reasoning\". Propose only mappings you are confident about and never invent field \
names that are not listed.";

/// A single message in a completion exchange.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A provider response.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub provider: String,
    pub tokens_used: Option<u32>,
}

/// Transport seam for language-model completions.
///
/// `Ok(None)` means the provider declined to answer (rate limit, empty
/// choice list); the integrator treats it the same as an error, minus
/// the warning.
pub trait CompletionProvider {
    fn send_messages(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> anyhow::Result<Option<Completion>>;
}

/// A field-pair proposal parsed from the provider response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingProposal {
    pub source_field: String,
    pub target_field: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Applies provider proposals to an existing mapping set.
pub struct ProposalIntegrator<'p> {
    provider: Option<&'p dyn CompletionProvider>,
}

impl<'p> ProposalIntegrator<'p> {
    #[must_use]
    pub fn new(provider: Option<&'p dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Runs one integration pass; the input is returned unchanged on
    /// every failure path.
    #[must_use]
    pub fn integrate(
        &self,
        ctx: &AgentContext<'_>,
        mut mappings: Vec<FieldMapping>,
        sink: &mut StepSink<'_>,
    ) -> Vec<FieldMapping> {
        let Some(provider) = self.provider else {
            sink.push(AgentStep::new(
                AGENT,
                "skipped",
                "no completion provider configured",
            ));
            return mappings;
        };

        let prompt = build_prompt(ctx, &mappings);
        sink.push(
            AgentStep::new(AGENT, "requested", "sent redacted schema digest to provider")
                .with_metadata("entity_pairs", ctx.entity_mappings.len().to_string())
                .with_metadata(
                    "redacted_fields",
                    redacted_count(ctx.catalog.iter()).to_string(),
                ),
        );

        let completion = match provider.send_messages(SYSTEM_PROMPT, &[ChatMessage::user(prompt)])
        {
            Ok(Some(completion)) => completion,
            Ok(None) => {
                sink.push(AgentStep::new(AGENT, "no_response", "provider returned no content"));
                return mappings;
            }
            Err(err) => {
                tracing::warn!(error = %err, "completion request failed, keeping mappings as-is");
                sink.push(AgentStep::new(
                    AGENT,
                    "failed",
                    format!("provider error: {err}"),
                ));
                return mappings;
            }
        };

        let Some(proposals) = parse_proposals(&completion.content) else {
            tracing::warn!(
                provider = %completion.provider,
                "unparseable completion, keeping mappings as-is"
            );
            sink.push(AgentStep::new(
                AGENT,
                "failed",
                "response contained no parseable proposal array",
            ));
            return mappings;
        };

        let mut applied = 0usize;
        let mut ignored = 0usize;
        for proposal in proposals {
            if proposal.confidence < MIN_PROPOSAL_CONFIDENCE {
                ignored += 1;
                continue;
            }
            if apply_proposal(ctx, &proposal, &mut mappings, sink) {
                applied += 1;
            } else {
                ignored += 1;
            }
        }

        tracing::info!(
            provider = %completion.provider,
            applied,
            ignored,
            "integrated completion proposals"
        );
        let mut summary = AgentStep::new(
            AGENT,
            "integrated",
            format!("applied {applied} proposals, ignored {ignored}"),
        )
        .with_metadata("provider", completion.provider)
        .with_metadata("applied", applied.to_string())
        .with_metadata("ignored", ignored.to_string());
        if let Some(tokens) = completion.tokens_used {
            summary = summary.with_metadata("tokens_used", tokens.to_string());
        }
        sink.push(summary);

        mappings
    }
}

/// User-message digest: redacted schema per entity pair plus the
/// strongest existing mappings as hints.
fn build_prompt(ctx: &AgentContext<'_>, mappings: &[FieldMapping]) -> String {
    let mut prompt = String::new();
    for em in ctx.entity_mappings {
        let (Some(source), Some(target)) =
            (ctx.entity(&em.source_entity_id), ctx.entity(&em.target_entity_id))
        else {
            continue;
        };
        prompt.push_str("Source ");
        prompt.push_str(&describe_entity(source, &ctx.catalog.entity_fields(&source.id)));
        prompt.push('\n');
        prompt.push_str("Target ");
        prompt.push_str(&describe_entity(target, &ctx.catalog.entity_fields(&target.id)));
        prompt.push('\n');
    }

    let hints: Vec<String> = mappings
        .iter()
        .filter(|m| m.confidence() >= HINT_CONFIDENCE)
        .take(MAX_HINTS)
        .filter_map(|m| {
            let (source, target) = ctx.endpoints(m)?;
            Some(format!(
                "{} maps to {} ({:.0}%)",
                presentable_name(source),
                presentable_name(target),
                m.confidence() * 100.0
            ))
        })
        .collect();
    if !hints.is_empty() {
        prompt.push_str("Established mappings:\n");
        for hint in hints {
            prompt.push_str(&hint);
            prompt.push('\n');
        }
    }
    prompt
}

fn parse_proposals(content: &str) -> Option<Vec<MappingProposal>> {
    let array = extract_json_array(content)?;
    serde_json::from_str(array).ok()
}

/// Extracts the first complete top-level JSON array from free text.
///
/// Providers wrap the payload in prose or markdown fences; a bracket
/// scan that respects string literals is enough to recover it.
#[must_use]
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Applies one proposal to the mapping it names, when it raises
/// confidence. The mapping is keyed by source field; the proposed
/// target only has to resolve within the pair's target entity, so a
/// second opinion naming a sibling target field still counts toward
/// the existing mapping. Proposals naming unknown fields are ignored.
fn apply_proposal(
    ctx: &AgentContext<'_>,
    proposal: &MappingProposal,
    mappings: &mut [FieldMapping],
    sink: &mut StepSink<'_>,
) -> bool {
    let source_name = proposal.source_field.trim();
    let target_name = proposal.target_field.trim();
    for mapping in mappings.iter_mut() {
        let Some((source, target)) = ctx.endpoints(mapping) else {
            continue;
        };
        if !source.name.eq_ignore_ascii_case(source_name) {
            continue;
        }
        let Some(target_entity) = ctx.target_entity_of(mapping) else {
            continue;
        };
        let target_known = ctx
            .catalog
            .entity_fields(&target_entity.id)
            .iter()
            .any(|field| field.name.eq_ignore_ascii_case(target_name));
        if !target_known {
            continue;
        }
        if proposal.confidence <= mapping.confidence() {
            return false;
        }

        let before = mapping.confidence();
        mapping.set_confidence(proposal.confidence);
        mapping.status = MappingStatus::Adjusted;
        let note = if proposal.reasoning.is_empty() {
            "Confirmed by language-model review".to_string()
        } else {
            format!("Language-model review: {}", proposal.reasoning)
        };
        mapping.append_rationale(&note);
        sink.push(
            AgentStep::new(
                AGENT,
                "proposal_applied",
                format!(
                    "{} \u{2192} {} raised by provider proposal",
                    source.name, target.name
                ),
            )
            .with_mapping(mapping.id.clone())
            .with_confidence(before, mapping.confidence()),
        );
        return true;
    }
    false
}
