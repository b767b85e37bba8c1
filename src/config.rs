//! Knobs for what goes into a changeset snapshot
use crate::errors::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Name reported for a data record whose model is absent.
    pub not_available_marker: String,
    pub include_removed_sections: bool,
    pub include_data_records: bool,
    pub include_changeset_details: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        DebugConfig {
            not_available_marker: "N/A".to_string(),
            include_removed_sections: true,
            include_data_records: true,
            include_changeset_details: true,
        }
    }
}

impl DebugConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
