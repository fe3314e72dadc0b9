//! Static rule tables for candidate matching.
//!
//! Synonym, core-record, and preferred-field tables are immutable lookup
//! structures constructed once at startup so deployments can extend them
//! in one place instead of scattering literals through the scorer.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Canonical target-entity families recognized across CRM/ERP platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalFamily {
    Customer,
    FinancialAccount,
    Loan,
    Card,
    Transaction,
}

impl CanonicalFamily {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::FinancialAccount => "financial_account",
            Self::Loan => "loan",
            Self::Card => "card",
            Self::Transaction => "transaction",
        }
    }
}

/// Abbreviation → canonical token expansions applied before token-overlap
/// scoring. Keys and values are lowercase single tokens.
static SYNONYMS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("acct", "account"),
        ("acc", "account"),
        ("addr", "address"),
        ("amt", "amount"),
        ("bal", "balance"),
        ("chk", "checking"),
        ("cif", "customer"),
        ("co", "company"),
        ("cust", "customer"),
        ("dda", "deposit"),
        ("desc", "description"),
        ("dob", "birthdate"),
        ("dt", "date"),
        ("eff", "effective"),
        ("int", "interest"),
        ("mtg", "mortgage"),
        ("nbr", "number"),
        ("no", "number"),
        ("num", "number"),
        ("org", "organization"),
        ("orig", "original"),
        ("ph", "phone"),
        ("pmt", "payment"),
        ("prin", "principal"),
        ("rt", "rate"),
        ("sav", "savings"),
        ("ssn", "taxid"),
        ("tel", "phone"),
        ("tin", "taxid"),
        ("tran", "transaction"),
        ("trans", "transaction"),
        ("txn", "transaction"),
    ])
});

/// Core-record table: canonical source entity names recognized on
/// core-banking exports, keyed by their normalized name.
static CORE_RECORDS: LazyLock<BTreeMap<&'static str, CanonicalFamily>> = LazyLock::new(|| {
    BTreeMap::from([
        ("customer", CanonicalFamily::Customer),
        ("customer master", CanonicalFamily::Customer),
        ("cif", CanonicalFamily::Customer),
        ("cif master", CanonicalFamily::Customer),
        ("client", CanonicalFamily::Customer),
        ("member", CanonicalFamily::Customer),
        ("kna1", CanonicalFamily::Customer),
        ("account", CanonicalFamily::FinancialAccount),
        ("account master", CanonicalFamily::FinancialAccount),
        ("deposit", CanonicalFamily::FinancialAccount),
        ("deposit account", CanonicalFamily::FinancialAccount),
        ("dda", CanonicalFamily::FinancialAccount),
        ("share", CanonicalFamily::FinancialAccount),
        ("loan", CanonicalFamily::Loan),
        ("loan master", CanonicalFamily::Loan),
        ("note", CanonicalFamily::Loan),
        ("mortgage", CanonicalFamily::Loan),
        ("card", CanonicalFamily::Card),
        ("card master", CanonicalFamily::Card),
        ("plastic", CanonicalFamily::Card),
        ("transaction", CanonicalFamily::Transaction),
        ("transaction history", CanonicalFamily::Transaction),
        ("posting", CanonicalFamily::Transaction),
        ("history", CanonicalFamily::Transaction),
    ])
});

/// Recognized canonical target entity names per family, normalized.
static TARGET_FAMILIES: LazyLock<BTreeMap<&'static str, CanonicalFamily>> = LazyLock::new(|| {
    BTreeMap::from([
        ("account", CanonicalFamily::Customer),
        ("contact", CanonicalFamily::Customer),
        ("customer", CanonicalFamily::Customer),
        ("business partner", CanonicalFamily::Customer),
        ("person account", CanonicalFamily::Customer),
        ("financial account", CanonicalFamily::FinancialAccount),
        ("deposit account", CanonicalFamily::FinancialAccount),
        ("bank account", CanonicalFamily::FinancialAccount),
        ("loan", CanonicalFamily::Loan),
        ("loan account", CanonicalFamily::Loan),
        ("mortgage", CanonicalFamily::Loan),
        ("card", CanonicalFamily::Card),
        ("payment card", CanonicalFamily::Card),
        ("financial account transaction", CanonicalFamily::Transaction),
        ("financial transaction", CanonicalFamily::Transaction),
        ("transaction", CanonicalFamily::Transaction),
        ("payment", CanonicalFamily::Transaction),
    ])
});

/// Preferred source-field → target-field name pairs per family, both
/// sides normalized with [`normalize_name`].
static PREFERRED_FIELDS: LazyLock<
    BTreeMap<CanonicalFamily, BTreeMap<&'static str, &'static str>>,
> = LazyLock::new(|| {
    BTreeMap::from([
        (
            CanonicalFamily::Customer,
            BTreeMap::from([
                ("custname", "name"),
                ("firstname", "firstname"),
                ("lastname", "lastname"),
                ("taxid", "taxid"),
                ("ssn", "taxid"),
                ("dob", "birthdate"),
                ("birthdt", "birthdate"),
                ("email", "email"),
                ("emailaddr", "email"),
                ("phone", "phone"),
                ("homephone", "phone"),
                ("addr1", "mailingstreet"),
                ("city", "mailingcity"),
                ("state", "mailingstate"),
                ("zip", "mailingpostalcode"),
            ]),
        ),
        (
            CanonicalFamily::FinancialAccount,
            BTreeMap::from([
                ("acctno", "accountnumber"),
                ("accountnumber", "accountnumber"),
                ("accttype", "accounttype"),
                ("curbal", "balance"),
                ("bal", "balance"),
                ("availbal", "availablebalance"),
                ("opendt", "opendate"),
                ("intrate", "interestrate"),
                ("status", "status"),
            ]),
        ),
        (
            CanonicalFamily::Loan,
            BTreeMap::from([
                ("loanno", "loannumber"),
                ("prinbal", "principalbalance"),
                ("intrate", "interestrate"),
                ("origamt", "originalamount"),
                ("maturitydt", "maturitydate"),
                ("nextpmtdt", "nextpaymentdate"),
            ]),
        ),
        (
            CanonicalFamily::Card,
            BTreeMap::from([
                ("cardno", "cardnumbertoken"),
                ("expdt", "expirationdate"),
                ("cardtype", "cardtype"),
                ("cardstatus", "status"),
            ]),
        ),
        (
            CanonicalFamily::Transaction,
            BTreeMap::from([
                ("txnamt", "amount"),
                ("txndt", "transactiondate"),
                ("txncd", "transactiontype"),
                ("postdt", "postdate"),
                ("memo", "description"),
            ]),
        ),
    ])
});

/// Expands an abbreviation to its canonical token; unknown tokens pass
/// through unchanged.
#[must_use]
pub fn expand_synonym(token: &str) -> &str {
    SYNONYMS.get(token).copied().unwrap_or(token)
}

/// Looks up whether a source entity name is a recognized core record.
#[must_use]
pub fn core_record_family(name: &str) -> Option<CanonicalFamily> {
    CORE_RECORDS.get(normalize_entity_name(name).as_str()).copied()
}

/// Looks up whether a target entity name belongs to a canonical family.
#[must_use]
pub fn canonical_target_family(name: &str) -> Option<CanonicalFamily> {
    TARGET_FAMILIES
        .get(normalize_entity_name(name).as_str())
        .copied()
}

/// Preferred target-field name for a core-record source field, if any.
#[must_use]
pub fn preferred_target_field(family: CanonicalFamily, source_field: &str) -> Option<&'static str> {
    PREFERRED_FIELDS
        .get(&family)
        .and_then(|map| map.get(normalize_name(source_field).as_str()))
        .copied()
}

/// Normalizes an entity name: platform namespaces stripped, camel-case
/// and separator boundaries collapsed to single spaces, lowercased.
#[must_use]
pub fn normalize_entity_name(name: &str) -> String {
    let mut stripped = name.trim();
    for prefix in ["FinServ__", "finserv__"] {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            stripped = rest;
        }
    }
    for suffix in ["__c", "__C"] {
        if let Some(rest) = stripped.strip_suffix(suffix) {
            stripped = rest;
        }
    }
    let mut spaced = String::with_capacity(stripped.len() + 4);
    let mut prev_lower = false;
    for ch in stripped.chars() {
        if ch.is_ascii_alphanumeric() {
            if prev_lower && ch.is_ascii_uppercase() {
                spaced.push(' ');
            }
            prev_lower = ch.is_ascii_lowercase();
            spaced.push(ch.to_ascii_lowercase());
        } else {
            if !spaced.ends_with(' ') {
                spaced.push(' ');
            }
            prev_lower = false;
        }
    }
    spaced.trim().to_string()
}

/// Normalizes a field name to a compact lowercase form with separators
/// removed, for preferred-pair lookup.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_expand_abbreviations() {
        assert_eq!(expand_synonym("acct"), "account");
        assert_eq!(expand_synonym("txn"), "transaction");
        assert_eq!(expand_synonym("balance"), "balance");
    }

    #[test]
    fn core_records_match_normalized_names() {
        assert_eq!(
            core_record_family("CUSTOMER_MASTER"),
            Some(CanonicalFamily::Customer)
        );
        assert_eq!(core_record_family("DDA"), Some(CanonicalFamily::FinancialAccount));
        assert_eq!(core_record_family("GL_ENTRY"), None);
    }

    #[test]
    fn target_families_strip_platform_namespaces() {
        assert_eq!(
            canonical_target_family("FinServ__FinancialAccount__c"),
            Some(CanonicalFamily::FinancialAccount)
        );
        assert_eq!(
            canonical_target_family("Contact"),
            Some(CanonicalFamily::Customer)
        );
        assert_eq!(canonical_target_family("CustomObject__c"), None);
    }

    #[test]
    fn preferred_fields_resolve_through_normalization() {
        assert_eq!(
            preferred_target_field(CanonicalFamily::FinancialAccount, "ACCT_NO"),
            Some("accountnumber")
        );
        assert_eq!(
            preferred_target_field(CanonicalFamily::Customer, "UNRELATED"),
            None
        );
    }
}
