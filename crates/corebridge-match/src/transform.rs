//! Heuristic transform inference for accepted field pairs.

use corebridge_model::{Field, SemanticType, Transform, TransformKind, TypeGroup};

use crate::tables::normalize_name;

const NAME_FRAGMENTS: [&str; 5] = ["first", "last", "middle", "initial", "given"];

/// Infers the transform descriptor for a source → target field pair.
///
/// Order matters: fragment concatenation beats date formatting beats
/// picklist lookup beats trimming; everything else is a direct copy.
#[must_use]
pub fn infer_transform(source: &Field, target: &Field) -> Transform {
    if is_name_fragment(&source.name) && is_whole_name_target(&target.name) {
        return Transform::new(
            TransformKind::Concat,
            format!(
                "Concatenate {} with sibling name fragments into {}",
                source.name, target.name
            ),
        );
    }

    if matches!(
        target.semantic_type,
        SemanticType::Date | SemanticType::Datetime
    ) {
        return Transform::new(
            TransformKind::DateFormat,
            format!("Format {} as ISO-8601 for {}", source.name, target.name),
        );
    }

    if target.semantic_type == SemanticType::Picklist {
        return Transform::new(
            TransformKind::Lookup,
            format!(
                "Translate {} values through the {} picklist",
                source.name, target.name
            ),
        );
    }

    if source.semantic_type == target.semantic_type
        && source.semantic_type.group() == TypeGroup::StringLike
    {
        return Transform::new(
            TransformKind::Trim,
            format!("Trim whitespace from {}", source.name),
        );
    }

    Transform::direct()
}

fn is_name_fragment(name: &str) -> bool {
    let normalized = normalize_name(name);
    normalized.contains("name") && NAME_FRAGMENTS.iter().any(|frag| normalized.contains(frag))
}

fn is_whole_name_target(name: &str) -> bool {
    let normalized = normalize_name(name);
    normalized == "name" || normalized == "fullname"
}
