//! Format detection and record-collection extraction.
//!
//! Supported upload shapes:
//! - delimited text (comma, semicolon, tab, or pipe separated, with header)
//! - JSON array of records
//! - JSON object containing named record collections
//! - nested JSON document with embedded named collections

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{InferError, Result};

/// A named collection of flat records extracted from an upload.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub name: String,
    /// Per-record key → stringified value. Empty string means missing.
    pub records: Vec<BTreeMap<String, String>>,
}

/// Extracts record collections from raw upload content.
///
/// Fails with [`InferError::UnsupportedFormat`] when the content is
/// neither JSON nor delimited text with a usable header row.
pub fn extract_record_sets(content: &str, filename: &str) -> Result<Vec<RecordSet>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(InferError::EmptyContent);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)?;
        let sets = extract_json_collections(&value, collection_name_hint(filename));
        if sets.is_empty() {
            return Err(InferError::UnsupportedFormat {
                filename: filename.to_string(),
            });
        }
        return Ok(sets);
    }

    extract_delimited(trimmed, filename)
}

/// Derives a collection name from a filename: stem without extension,
/// falling back to "records".
pub fn collection_name_hint(filename: &str) -> String {
    let stem = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .split('.')
        .next()
        .unwrap_or("")
        .trim();
    if stem.is_empty() {
        "records".to_string()
    } else {
        stem.to_string()
    }
}

fn extract_delimited(content: &str, filename: &str) -> Result<Vec<RecordSet>> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();
    if headers.is_empty() {
        return Err(InferError::UnsupportedFormat {
            filename: filename.to_string(),
        });
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = record.get(idx).unwrap_or("").trim().to_string();
            row.insert(header.clone(), value);
        }
        records.push(row);
    }

    Ok(vec![RecordSet {
        name: collection_name_hint(filename),
        records,
    }])
}

/// Picks the delimiter with the most occurrences in the header line.
/// Comma wins ties by order.
fn sniff_delimiter(header_line: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Walks a JSON value collecting every named array of objects.
///
/// A top-level array becomes a single collection named from the filename
/// hint; nested arrays keep the key they were found under. Scans one
/// level at a time so a collection is never double-counted through its
/// own records.
fn extract_json_collections(value: &Value, top_name: String) -> Vec<RecordSet> {
    let mut sets = Vec::new();
    match value {
        Value::Array(items) => {
            if let Some(records) = records_from_array(items) {
                sets.push(RecordSet {
                    name: top_name,
                    records,
                });
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                collect_named_collections(key, child, &mut sets);
            }
        }
        _ => {}
    }
    sets
}

fn collect_named_collections(key: &str, value: &Value, sets: &mut Vec<RecordSet>) {
    match value {
        Value::Array(items) => {
            if let Some(records) = records_from_array(items) {
                sets.push(RecordSet {
                    name: key.to_string(),
                    records,
                });
            }
        }
        Value::Object(map) => {
            for (child_key, child) in map {
                collect_named_collections(child_key, child, sets);
            }
        }
        _ => {}
    }
}

fn records_from_array(items: &[Value]) -> Option<Vec<BTreeMap<String, String>>> {
    if items.is_empty() || !items.iter().all(Value::is_object) {
        return None;
    }
    let records = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(key, value)| (key.clone(), stringify(value)))
                .collect()
        })
        .collect();
    Some(records)
}

/// Stringifies a scalar; nested structures serialize to compact JSON so
/// their content still participates in type inference as opaque text.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_pipe_delimiter() {
        assert_eq!(sniff_delimiter("a|b|c"), b'|');
        assert_eq!(sniff_delimiter("a,b,c"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
    }

    #[test]
    fn extracts_delimited_rows() {
        let sets = extract_record_sets("AccountId,Balance\n1,10.5\n2,20.0\n", "accounts.csv")
            .expect("delimited upload");
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "accounts");
        assert_eq!(sets[0].records.len(), 2);
        assert_eq!(sets[0].records[0]["Balance"], "10.5");
    }

    #[test]
    fn extracts_json_array() {
        let sets = extract_record_sets(r#"[{"id": 1, "name": "A"}]"#, "customers.json").unwrap();
        assert_eq!(sets[0].name, "customers");
        assert_eq!(sets[0].records[0]["id"], "1");
    }

    #[test]
    fn extracts_named_collections_from_nested_document() {
        let content = r#"{
            "export": {
                "customers": [{"id": 1}],
                "accounts": [{"id": 2, "balance": 5.0}]
            }
        }"#;
        let mut sets = extract_record_sets(content, "dump.json").unwrap();
        sets.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "accounts");
        assert_eq!(sets[1].name, "customers");
    }

    #[test]
    fn rejects_json_without_collections() {
        let err = extract_record_sets(r#"{"version": 2, "ok": true}"#, "meta.json").unwrap_err();
        assert!(matches!(err, InferError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rejects_empty_content() {
        let err = extract_record_sets("   ", "empty.csv").unwrap_err();
        assert!(matches!(err, InferError::EmptyContent));
    }
}
