//! Name similarity primitives.
//!
//! Entity pairing uses synonym-expanded token overlap; field pairing
//! blends that with Jaro-Winkler so near-miss spellings still score.

use std::collections::BTreeSet;

use rapidfuzz::distance::jaro_winkler;

use crate::tables::expand_synonym;

/// Splits a name into lowercase canonical tokens.
///
/// Camel-case boundaries and non-alphanumeric separators both delimit
/// tokens; each token is expanded through the synonym table before use.
#[must_use]
pub fn token_set(raw: &str) -> BTreeSet<String> {
    let mut spaced = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if prev_lower && ch.is_ascii_uppercase() {
                spaced.push(' ');
            }
            prev_lower = ch.is_ascii_lowercase();
            spaced.push(ch.to_ascii_lowercase());
        } else {
            spaced.push(' ');
            prev_lower = false;
        }
    }

    spaced
        .split_whitespace()
        .map(|token| expand_synonym(token).to_string())
        .collect()
}

/// Set-intersection over union ratio of the two token sets (0.0 - 1.0).
#[must_use]
pub fn token_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Token-overlap similarity between two display strings.
#[must_use]
pub fn text_overlap(a: &str, b: &str) -> f64 {
    token_overlap(&token_set(a), &token_set(b))
}

/// Compact lowercase form for edit-distance comparison.
fn compact(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Field-name similarity: the stronger of Jaro-Winkler over compacted
/// names and synonym-expanded token overlap.
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let fuzzy = jaro_winkler::similarity(compact(a).chars(), compact(b).chars());
    fuzzy.max(text_overlap(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_camel_case_and_separators() {
        let tokens = token_set("CustAcctBalance_USD");
        assert!(tokens.contains("customer"));
        assert!(tokens.contains("account"));
        assert!(tokens.contains("balance"));
        assert!(tokens.contains("usd"));
    }

    #[test]
    fn overlap_is_symmetric_and_bounded() {
        let score = text_overlap("CUST_NAME", "Customer Name");
        assert!(score > 0.5, "synonym expansion should align tokens: {score}");
        assert_eq!(
            text_overlap("CUST_NAME", "Customer Name"),
            text_overlap("Customer Name", "CUST_NAME")
        );
        assert_eq!(text_overlap("", "anything"), 0.0);
    }

    #[test]
    fn name_similarity_catches_near_miss_spellings() {
        assert!(name_similarity("AccountNumber", "AcountNumber") > 0.9);
        assert!(name_similarity("Balance", "MaturityDate") < 0.6);
    }

    #[test]
    fn identical_names_score_one() {
        assert!((name_similarity("OPEN_DT", "open dt") - 1.0).abs() < 1e-9);
    }
}
