//! Semantic-type inference over extracted record collections.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use corebridge_model::{
    Entity, Field, FieldId, Relationship, SemanticType, SystemId,
};

use crate::error::{InferError, Result};
use crate::records::{RecordSet, extract_record_sets};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+(]?[0-9][0-9 ().\-]{5,18}[0-9]$").expect("phone pattern"));
static PHONE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ ().\-]").expect("phone separator pattern"));
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d*\.\d+$|^[+-]?\d+\.\d*$").expect("decimal pattern"));
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));

/// Minimum record count before a low-cardinality column is called a picklist.
const PICKLIST_MIN_RECORDS: usize = 8;
/// Maximum distinct values for a picklist column.
const PICKLIST_MAX_DISTINCT: usize = 8;

/// Request for standalone schema inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferRequest {
    /// Raw uploaded text content.
    pub content: String,
    /// Filename hint used for format detection and collection naming.
    pub filename: String,
    /// System that owns the inferred entities.
    pub owner_system_id: SystemId,
}

/// Result of schema inference: one entity per detected record collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferredSchema {
    pub entities: Vec<Entity>,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
}

/// Derives a schema from semi-structured uploaded content.
///
/// An explicit schema-shaped payload (JSON object with `entities` and
/// `fields` arrays) is accepted verbatim; otherwise one synthetic entity
/// is created per detected record collection with one field per distinct
/// key observed across all records.
///
/// # Errors
///
/// Fails when the format is unsupported or no field columns can be
/// derived. Callers must surface this as a rejected upload.
pub fn infer_schema(request: &InferRequest) -> Result<InferredSchema> {
    if let Some(explicit) = try_explicit_schema(&request.content) {
        return Ok(explicit);
    }

    let record_sets = extract_record_sets(&request.content, &request.filename)?;

    let mut schema = InferredSchema::default();
    for set in &record_sets {
        let (entity, fields) = infer_collection(&request.owner_system_id, set)?;
        tracing::debug!(
            entity = %entity.name,
            fields = fields.len(),
            records = set.records.len(),
            "inferred record collection"
        );
        schema.entities.push(entity);
        schema.fields.extend(fields);
    }

    schema.relationships = derive_relationships(&schema.entities, &schema.fields);
    Ok(schema)
}

/// Accepts a payload that already carries an explicit schema shape.
fn try_explicit_schema(content: &str) -> Option<InferredSchema> {
    let trimmed = content.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    let object = value.as_object()?;
    if !object.contains_key("entities") || !object.contains_key("fields") {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn infer_collection(owner: &SystemId, set: &RecordSet) -> Result<(Entity, Vec<Field>)> {
    // Distinct keys in first-observed order across all records.
    let mut keys: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for record in &set.records {
        for key in record.keys() {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
    }
    if keys.is_empty() {
        return Err(InferError::NoColumns {
            collection: set.name.clone(),
        });
    }

    let entity = Entity::new(owner.clone(), set.name.clone());
    let record_count = set.records.len();

    let mut fields = Vec::with_capacity(keys.len());
    for key in keys {
        let values: Vec<&str> = set
            .records
            .iter()
            .filter_map(|record| record.get(&key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .collect();

        let semantic_type = infer_type(&values, record_count);
        let mut field = Field::new(entity.id.clone(), key.clone(), semantic_type);
        field.required = record_count > 0 && values.len() == record_count;
        field.is_key = is_key_name(&key);
        if semantic_type == SemanticType::Picklist {
            let distinct: BTreeSet<String> =
                values.iter().map(|value| (*value).to_string()).collect();
            field.picklist_values = Some(distinct.into_iter().collect());
        }
        fields.push(field);
    }

    Ok((entity, fields))
}

/// Type-inference ladder, first match wins.
///
/// Evaluated over the non-empty stringified values of a field across all
/// records; a field with no non-empty values falls through to string.
fn infer_type(values: &[&str], record_count: usize) -> SemanticType {
    if values.is_empty() {
        return SemanticType::String;
    }
    if values.iter().any(|value| value.contains('@')) {
        return SemanticType::Email;
    }
    if values.iter().any(|value| looks_like_phone(value)) {
        return SemanticType::Phone;
    }
    if values.iter().all(|value| is_boolean_token(value)) {
        return SemanticType::Boolean;
    }
    if values.iter().all(|value| INTEGER_RE.is_match(value)) {
        return SemanticType::Integer;
    }
    if values.iter().all(|value| DECIMAL_RE.is_match(value)) {
        return SemanticType::Decimal;
    }
    if values.iter().all(|value| DATE_RE.is_match(value)) {
        return SemanticType::Date;
    }
    if values.iter().all(|value| parses_as_timestamp(value)) {
        return SemanticType::Datetime;
    }
    let distinct: BTreeSet<&str> = values.iter().copied().collect();
    if distinct.len() <= PICKLIST_MAX_DISTINCT && record_count >= PICKLIST_MIN_RECORDS {
        return SemanticType::Picklist;
    }
    SemanticType::String
}

/// Plausible phone number: 7-15 digits with at least one grouping
/// separator or an international prefix. Bare digit runs stay eligible
/// for integer inference, and decimal amounts never qualify.
fn looks_like_phone(value: &str) -> bool {
    if value.contains('.') || !PHONE_RE.is_match(value) {
        return false;
    }
    if !value.starts_with('+') && !PHONE_SEPARATOR_RE.is_match(value) {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

fn is_boolean_token(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "0" | "1"
    )
}

fn parses_as_timestamp(value: &str) -> bool {
    if chrono::DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y"];
    FORMATS
        .iter()
        .any(|format| chrono::NaiveDateTime::parse_from_str(value, format).is_ok())
        || chrono::NaiveDate::parse_from_str(value, "%m/%d/%Y").is_ok()
}

fn is_key_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "id" || lower.ends_with("id")
}

/// Derives reference links for `<entity>id`-shaped non-key columns whose
/// prefix names another inferred collection.
fn derive_relationships(entities: &[Entity], fields: &[Field]) -> Vec<Relationship> {
    let by_name: BTreeMap<String, &Entity> = entities
        .iter()
        .map(|entity| (entity.name.to_ascii_lowercase(), entity))
        .collect();

    let mut relationships = Vec::new();
    let mut linked: BTreeSet<FieldId> = BTreeSet::new();
    for field in fields {
        let lower = field.name.to_ascii_lowercase();
        let Some(prefix) = lower
            .strip_suffix("_id")
            .or_else(|| lower.strip_suffix("id"))
        else {
            continue;
        };
        let prefix = prefix.trim_end_matches(['_', '-']);
        if prefix.is_empty() {
            continue;
        }
        let target = by_name
            .get(prefix)
            .or_else(|| by_name.get(&format!("{prefix}s")));
        if let Some(target) = target {
            if target.id == field.entity_id || !linked.insert(field.id.clone()) {
                continue;
            }
            relationships.push(Relationship {
                from_field_id: field.id.clone(),
                to_entity_id: target.id.clone(),
                description: Some(format!("{} references {}", field.name, target.name)),
            });
        }
    }
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, filename: &str) -> InferRequest {
        InferRequest {
            content: content.to_string(),
            filename: filename.to_string(),
            owner_system_id: SystemId::new("upload-1"),
        }
    }

    #[test]
    fn infers_tabular_columns() {
        let schema = infer_schema(&request(
            "AccountId,AccountName,Balance\n1,Checking,100.50\n2,Savings,2250.00\n",
            "accounts.csv",
        ))
        .unwrap();

        assert_eq!(schema.entities.len(), 1);
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["AccountId", "AccountName", "Balance"]);

        let balance = &schema.fields[2];
        assert_eq!(balance.semantic_type, SemanticType::Decimal);
        assert!(schema.fields[0].is_key);
    }

    #[test]
    fn infers_email_from_at_sign() {
        let content = r#"[{"email": "a@example.com"}, {"email": "b@example.com"}]"#;
        let schema = infer_schema(&request(content, "contacts.json")).unwrap();
        assert_eq!(schema.fields[0].semantic_type, SemanticType::Email);
    }

    #[test]
    fn ladder_orders_email_before_string() {
        assert_eq!(infer_type(&["x@y.z", "plain"], 2), SemanticType::Email);
        assert_eq!(
            infer_type(&["(555) 123-4567", "n/a"], 2),
            SemanticType::Phone
        );
        assert_eq!(infer_type(&["yes", "no", "1"], 3), SemanticType::Boolean);
        assert_eq!(infer_type(&["12", "-4"], 2), SemanticType::Integer);
        assert_eq!(infer_type(&["1.5", "2.25"], 2), SemanticType::Decimal);
        assert_eq!(infer_type(&["2024-01-15"], 1), SemanticType::Date);
        assert_eq!(
            infer_type(&["2024-01-15T10:30:00"], 1),
            SemanticType::Datetime
        );
        assert_eq!(infer_type(&[], 0), SemanticType::String);
    }

    #[test]
    fn phone_shapes_cover_common_groupings() {
        assert!(looks_like_phone("(555) 123-4567"));
        assert!(looks_like_phone("555-123-4567"));
        assert!(looks_like_phone("+31 20 123 4567"));
        // Bare digit runs stay eligible for integer inference.
        assert!(!looks_like_phone("5551234567"));
        assert!(!looks_like_phone("123.45"));
        assert!(!looks_like_phone("(555) 12"));
    }

    #[test]
    fn picklist_needs_enough_records() {
        let values = vec!["OPEN"; 8];
        assert_eq!(infer_type(&values, 8), SemanticType::Picklist);
        assert_eq!(infer_type(&values[..4], 4), SemanticType::String);
    }

    #[test]
    fn required_tracks_presence_in_every_record() {
        let content = r#"[{"a": "x", "b": "y"}, {"a": "z", "b": ""}]"#;
        let schema = infer_schema(&request(content, "rows.json")).unwrap();
        let a = schema.fields.iter().find(|f| f.name == "a").unwrap();
        let b = schema.fields.iter().find(|f| f.name == "b").unwrap();
        assert!(a.required);
        assert!(!b.required);
    }

    #[test]
    fn derives_relationship_to_sibling_collection() {
        let content = r#"{
            "customers": [{"id": "c1", "name": "Ann"}],
            "accounts": [{"id": "a1", "customer_id": "c1"}]
        }"#;
        let schema = infer_schema(&request(content, "dump.json")).unwrap();
        assert_eq!(schema.relationships.len(), 1);
        let rel = &schema.relationships[0];
        let customers = schema
            .entities
            .iter()
            .find(|e| e.name == "customers")
            .unwrap();
        assert_eq!(rel.to_entity_id, customers.id);
    }

    #[test]
    fn accepts_explicit_schema_payload() {
        let entity = Entity::new(SystemId::new("sys"), "Account");
        let field = Field::new(entity.id.clone(), "Name", SemanticType::String);
        let payload = serde_json::to_string(&InferredSchema {
            entities: vec![entity],
            fields: vec![field],
            relationships: vec![],
        })
        .unwrap();

        let schema = infer_schema(&request(&payload, "schema.json")).unwrap();
        assert_eq!(schema.entities.len(), 1);
        assert_eq!(schema.entities[0].name, "Account");
    }

    #[test]
    fn rejects_unsupported_upload() {
        let err = infer_schema(&request(r#"{"just": "metadata"}"#, "meta.json")).unwrap_err();
        assert!(matches!(err, InferError::UnsupportedFormat { .. }));
    }
}
