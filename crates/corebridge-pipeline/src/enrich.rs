//! Schema and rationale enrichment stages.

use corebridge_match::token_set;
use corebridge_model::{ComplianceTag, Field, FieldCatalog, FieldMapping, SemanticType, TransformKind};

/// Resolves `unknown` field types from name vocabulary.
///
/// Returns the number of fields whose type changed. Fields with a
/// declared type are never touched.
pub fn enrich_schema(fields: &mut [Field]) -> usize {
    let mut resolved = 0;
    for field in fields.iter_mut() {
        if field.semantic_type != SemanticType::Unknown {
            continue;
        }
        if let Some(inferred) = type_from_name(&field.name) {
            tracing::debug!(field = %field.name, %inferred, "resolved unknown type from name");
            field.semantic_type = inferred;
            resolved += 1;
        }
    }
    resolved
}

/// Semantic type suggested by a field name alone.
fn type_from_name(name: &str) -> Option<SemanticType> {
    let tokens = token_set(name);
    let has = |t: &str| tokens.contains(t);

    if has("email") {
        return Some(SemanticType::Email);
    }
    if has("phone") || has("fax") || has("mobile") {
        return Some(SemanticType::Phone);
    }
    if has("timestamp") || tokens.iter().any(|t| t.ends_with("datetime")) {
        return Some(SemanticType::Datetime);
    }
    if has("date") || tokens.iter().any(|t| t.ends_with("date")) {
        return Some(SemanticType::Date);
    }
    if has("amount") || has("balance") || has("rate") || has("price") || has("principal") {
        return Some(SemanticType::Decimal);
    }
    if has("count") || has("quantity") {
        return Some(SemanticType::Integer);
    }
    if has("flag") || has("indicator") {
        return Some(SemanticType::Boolean);
    }
    if tokens.len() == 1 && has("id") {
        return Some(SemanticType::Id);
    }
    None
}

/// Appends privacy-handling and transform notes to mapping rationales.
///
/// Returns the number of mappings whose rationale grew. Notes are only
/// added once; re-running the stage changes nothing.
pub fn enrich_rationales(catalog: &FieldCatalog, mappings: &mut [FieldMapping]) -> usize {
    let mut enriched = 0;
    for mapping in mappings.iter_mut() {
        let mut grew = false;

        if let Some(source) = catalog.get(&mapping.source_field_id) {
            if source.has_tag(ComplianceTag::GlbaNpi) && !has_privacy_note(&mapping.rationale) {
                mapping.append_rationale(
                    "Mask nonpublic personal information per privacy policy during load",
                );
                grew = true;
            }
        }

        if mapping.transform.kind != TransformKind::Direct
            && !mapping.rationale.contains(&mapping.transform.description)
        {
            let note = mapping.transform.description.clone();
            mapping.append_rationale(&note);
            grew = true;
        }

        if grew {
            enriched += 1;
        }
    }
    enriched
}

fn has_privacy_note(rationale: &str) -> bool {
    let lowered = rationale.to_lowercase();
    ["privacy", "npi", "mask"]
        .iter()
        .any(|marker| lowered.contains(marker))
}
