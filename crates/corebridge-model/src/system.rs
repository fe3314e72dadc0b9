//! Source and target system classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Recognized enterprise platforms.
///
/// The matcher and the domain agents key their heuristics off the
/// [`SystemFamily`] a platform belongs to; `Custom` covers uploads and
/// connectors with no platform-specific behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    Fis,
    Fiserv,
    JackHenry,
    Temenos,
    Salesforce,
    Dynamics,
    Sap,
    NetSuite,
    Custom,
}

/// Broad platform family used for agent gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemFamily {
    Banking,
    Crm,
    Erp,
    Other,
}

impl SystemType {
    #[must_use]
    pub fn family(&self) -> SystemFamily {
        match self {
            Self::Fis | Self::Fiserv | Self::JackHenry | Self::Temenos => SystemFamily::Banking,
            Self::Salesforce | Self::Dynamics => SystemFamily::Crm,
            Self::Sap | Self::NetSuite => SystemFamily::Erp,
            Self::Custom => SystemFamily::Other,
        }
    }

    /// True for core-banking platforms with a specialized data dictionary.
    ///
    /// These sources trigger the target-family preference heuristic when
    /// the target schema offers both a generic and a specialized entity
    /// family for the same concept.
    #[must_use]
    pub fn is_specialized_banking_platform(&self) -> bool {
        self.family() == SystemFamily::Banking
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fis => "fis",
            Self::Fiserv => "fiserv",
            Self::JackHenry => "jack_henry",
            Self::Temenos => "temenos",
            Self::Salesforce => "salesforce",
            Self::Dynamics => "dynamics",
            Self::Sap => "sap",
            Self::NetSuite => "net_suite",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemType {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "fis" => Ok(Self::Fis),
            "fiserv" => Ok(Self::Fiserv),
            "jack_henry" | "jackhenry" => Ok(Self::JackHenry),
            "temenos" => Ok(Self::Temenos),
            "salesforce" => Ok(Self::Salesforce),
            "dynamics" => Ok(Self::Dynamics),
            "sap" => Ok(Self::Sap),
            "net_suite" | "netsuite" => Ok(Self::NetSuite),
            "custom" => Ok(Self::Custom),
            _ => Err(ModelError::UnknownSystemType(value.to_string())),
        }
    }
}

impl fmt::Display for SystemFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Banking => "banking",
            Self::Crm => "crm",
            Self::Erp => "erp",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}
