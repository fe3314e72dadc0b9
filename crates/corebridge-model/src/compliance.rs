//! Regulatory classifications and the compliance report.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{FieldId, FieldMappingId};

/// Regulatory classification attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceTag {
    /// Gramm-Leach-Bliley nonpublic personal information.
    GlbaNpi,
    /// FFIEC examination audit-trail relevance.
    FfiecAudit,
    /// Sarbanes-Oxley financial-controls relevance.
    SoxFinancial,
    /// PCI DSS cardholder data.
    PciCard,
    /// Bank Secrecy Act / anti-money-laundering relevance.
    BsaAml,
}

impl ComplianceTag {
    /// Tags whose regulations require audit-trail preservation.
    #[must_use]
    pub fn is_audit_relevant(&self) -> bool {
        matches!(self, Self::FfiecAudit | Self::SoxFinancial | Self::BsaAml)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlbaNpi => "GLBA_NPI",
            Self::FfiecAudit => "FFIEC_AUDIT",
            Self::SoxFinancial => "SOX_FINANCIAL",
            Self::PciCard => "PCI_CARD",
            Self::BsaAml => "BSA_AML",
        }
    }
}

impl fmt::Display for ComplianceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceTag {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "GLBA_NPI" => Ok(Self::GlbaNpi),
            "FFIEC_AUDIT" => Ok(Self::FfiecAudit),
            "SOX_FINANCIAL" => Ok(Self::SoxFinancial),
            "PCI_CARD" => Ok(Self::PciCard),
            "BSA_AML" => Ok(Self::BsaAml),
            _ => Err(ModelError::UnknownComplianceTag(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

/// A single finding from the compliance rule engine.
///
/// Findings are data, never errors: an error-severity issue still flows
/// back to the caller inside a successful report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceIssue {
    /// Stable rule code (e.g. "CB-PCI-001").
    pub code: String,
    pub severity: IssueSeverity,
    pub message: String,
    /// Tag that triggered the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ComplianceTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mapping_id: Option<FieldMappingId>,
}

/// Read-only summary over a field-mapping set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub issues: Vec<ComplianceIssue>,
}

/// Aggregate counts for display and export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub privacy_issues: usize,
    pub payment_card_issues: usize,
    pub audit_issues: usize,
}

impl ComplianceReport {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    #[must_use]
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Info)
            .count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> ComplianceSummary {
        let tag_count = |pred: fn(ComplianceTag) -> bool| {
            self.issues
                .iter()
                .filter(|issue| issue.tag.is_some_and(pred))
                .count()
        };
        ComplianceSummary {
            errors: self.error_count(),
            warnings: self.warning_count(),
            infos: self.info_count(),
            privacy_issues: tag_count(|tag| tag == ComplianceTag::GlbaNpi),
            payment_card_issues: tag_count(|tag| tag == ComplianceTag::PciCard),
            audit_issues: tag_count(|tag| tag.is_audit_relevant()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(code: &str, severity: IssueSeverity, tag: ComplianceTag) -> ComplianceIssue {
        ComplianceIssue {
            code: code.to_string(),
            severity,
            message: String::new(),
            tag: Some(tag),
            source_field_id: None,
            target_field_id: None,
            field_mapping_id: None,
        }
    }

    #[test]
    fn tag_serializes_in_wire_format() {
        let json = serde_json::to_string(&ComplianceTag::GlbaNpi).unwrap();
        assert_eq!(json, "\"GLBA_NPI\"");
        let back: ComplianceTag = serde_json::from_str("\"PCI_CARD\"").unwrap();
        assert_eq!(back, ComplianceTag::PciCard);
    }

    #[test]
    fn report_counts_by_severity_and_category() {
        let report = ComplianceReport {
            issues: vec![
                issue("CB-PCI-001", IssueSeverity::Error, ComplianceTag::PciCard),
                issue("CB-GLBA-001", IssueSeverity::Warning, ComplianceTag::GlbaNpi),
                issue("CB-AUD-001", IssueSeverity::Info, ComplianceTag::FfiecAudit),
                issue("CB-BSA-001", IssueSeverity::Warning, ComplianceTag::BsaAml),
            ],
        };
        let summary = report.summary();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.infos, 1);
        assert_eq!(summary.privacy_issues, 1);
        assert_eq!(summary.payment_card_issues, 1);
        assert_eq!(summary.audit_issues, 2);
        assert!(report.has_errors());
    }
}
