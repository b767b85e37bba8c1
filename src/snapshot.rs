//! Records handed to the debugging tool, one snapshot per applied changeset
use crate::changeset_details::SectionChangesetInfo;
use crate::errors::Result;
use crate::types::ChangeType;
use indexmap::IndexMap;
use serde::Serialize;

/// Parent reported for a section without one.
pub const ROOT_PARENT: &str = "";

/// A section of the new tree, or one that disappeared from the old tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub identifier: String,
    pub name: String,
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dirty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_reused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_trigger_state_update: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl SectionRecord {
    pub fn visited(identifier: &str, name: &str, parent: &str, is_dirty: bool) -> Self {
        SectionRecord {
            identifier: identifier.to_string(),
            name: name.to_string(),
            parent: parent.to_string(),
            is_dirty: Some(is_dirty),
            is_reused: Some(!is_dirty),
            did_trigger_state_update: Some(false),
            removed: false,
        }
    }

    pub fn removed(identifier: &str, name: &str, parent: Option<&str>) -> Self {
        SectionRecord {
            identifier: identifier.to_string(),
            name: name.to_string(),
            parent: parent.unwrap_or(ROOT_PARENT).to_string(),
            is_dirty: None,
            is_reused: None,
            did_trigger_state_update: None,
            removed: true,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.unwrap_or(false)
    }
}

/// What happened to one data model that was live at some point during the update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRecord {
    pub identifier: String,
    pub name: String,
    pub parent: Option<String>,
    pub unchanged: bool,
    pub inserted: bool,
    pub removed: bool,
    pub updated: bool,
}

impl DataRecord {
    /// `operation` is the last change applied to the model, `None` when untouched.
    pub fn new(name: String, parent: Option<String>, operation: Option<ChangeType>) -> Self {
        let tagged = |check: fn(ChangeType) -> bool| operation.is_some_and(check);
        DataRecord {
            identifier: name.clone(),
            name,
            parent,
            unchanged: operation.is_none(),
            inserted: tagged(ChangeType::is_insert),
            removed: tagged(ChangeType::is_delete),
            updated: tagged(ChangeType::is_update),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TreeRecord {
    Section(SectionRecord),
    Data(DataRecord),
}

impl TreeRecord {
    pub fn identifier(&self) -> &str {
        match self {
            TreeRecord::Section(record) => &record.identifier,
            TreeRecord::Data(record) => &record.identifier,
        }
    }

    pub fn as_section(&self) -> Option<&SectionRecord> {
        match self {
            TreeRecord::Section(record) => Some(record),
            TreeRecord::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataRecord> {
        match self {
            TreeRecord::Data(record) => Some(record),
            TreeRecord::Section(_) => None,
        }
    }
}

/// The structured record delivered to the listener for one update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesetSnapshot {
    pub name: String,
    pub is_async: bool,
    pub surface_id: String,
    pub id: String,
    pub tree: Vec<TreeRecord>,
    pub changeset_data: IndexMap<String, SectionChangesetInfo>,
}

impl ChangesetSnapshot {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn section_records(&self) -> impl Iterator<Item = &SectionRecord> {
        self.tree.iter().filter_map(TreeRecord::as_section)
    }

    pub fn data_records(&self) -> impl Iterator<Item = &DataRecord> {
        self.tree.iter().filter_map(TreeRecord::as_data)
    }
}
