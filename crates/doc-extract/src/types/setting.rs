//! Per-request extraction settings

use serde::{Deserialize, Serialize};

/// Processing mode selecting between local parsing and remote-service parsing
///
/// Deserializes from any string through [`EtlType::from_name`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum EtlType {
    /// Always parse locally
    #[default]
    Default,
    /// Prefer the Unstructured partition service when running in automatic mode
    Unstructured,
}

impl EtlType {
    /// Parse a mode name. Anything other than "Unstructured" (case-insensitive) is `Default`.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("unstructured") {
            Self::Unstructured
        } else {
            Self::Default
        }
    }
}

impl From<String> for EtlType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Settings for a single extraction request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSetting {
    /// Storage key of the file to extract (absent when a local path is supplied)
    #[serde(default)]
    pub filepath: Option<String>,
    /// Processing mode
    #[serde(default, rename = "etlType")]
    pub etl_type: EtlType,
}

impl ExtractSetting {
    /// Settings naming a storage key
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            filepath: Some(key.into()),
            etl_type: EtlType::Default,
        }
    }

    /// Set the processing mode
    pub fn with_etl_type(mut self, etl_type: EtlType) -> Self {
        self.etl_type = etl_type;
        self
    }
}
