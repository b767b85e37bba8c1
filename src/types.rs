//! Read-only view of the host's section trees and the changes applied to them
use crate::errors::{ChangesetDebugError, Result};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque data model held by a diffing section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataItem(pub serde_json::Value);

impl DataItem {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        DataItem(value.into())
    }

    /// Display name of the model: the raw text for strings, compact JSON otherwise.
    pub fn name(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Capability of the section kinds that build their children by diffing a data list.
pub trait DiffItemProvider {
    /// Items the section diffs over, in order. `None` marks an absent model.
    fn provide_diff_items(&self) -> Result<Vec<Option<DataItem>>>;
}

/// A section diffing an arbitrary list of models.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataDiffSection {
    #[serde(default)]
    pub data: Option<Vec<DataItem>>,
}

impl DiffItemProvider for DataDiffSection {
    fn provide_diff_items(&self) -> Result<Vec<Option<DataItem>>> {
        self.data
            .as_ref()
            .map(|data| data.iter().cloned().map(Some).collect())
            .ok_or(ChangesetDebugError::MissingDiffData {
                kind: "DataDiffSection",
                field: "data",
            })
    }
}

/// A section wrapping exactly one component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SingleComponentSection {
    #[serde(default)]
    pub component: Option<DataItem>,
}

impl DiffItemProvider for SingleComponentSection {
    fn provide_diff_items(&self) -> Result<Vec<Option<DataItem>>> {
        Ok(vec![self.component.clone()])
    }
}

/// The section kinds the debugger knows how to look into.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SectionKind {
    #[default]
    Group,
    DataDiff(DataDiffSection),
    SingleComponent(SingleComponentSection),
}

impl SectionKind {
    pub fn diff_provider(&self) -> Option<&dyn DiffItemProvider> {
        match self {
            SectionKind::Group => None,
            SectionKind::DataDiff(section) => Some(section),
            SectionKind::SingleComponent(section) => Some(section),
        }
    }
}

/// One node of a section tree snapshot. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub global_key: String,
    pub simple_name: String,
    #[serde(default)]
    pub kind: SectionKind,
    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    pub fn new(global_key: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Section {
            global_key: global_key.into(),
            simple_name: simple_name.into(),
            kind: SectionKind::Group,
            children: Vec::new(),
        }
    }

    pub fn data_diff(
        global_key: impl Into<String>,
        simple_name: impl Into<String>,
        data: Vec<DataItem>,
    ) -> Self {
        Section {
            kind: SectionKind::DataDiff(DataDiffSection { data: Some(data) }),
            ..Section::new(global_key, simple_name)
        }
    }

    pub fn single_component(
        global_key: impl Into<String>,
        simple_name: impl Into<String>,
        component: Option<DataItem>,
    ) -> Self {
        Section {
            kind: SectionKind::SingleComponent(SingleComponentSection { component }),
            ..Section::new(global_key, simple_name)
        }
    }

    pub fn with_children(mut self, children: Vec<Section>) -> Self {
        self.children = children;
        self
    }

    pub fn is_diff_section(&self) -> bool {
        self.kind.diff_provider().is_some()
    }
}

/// Kind of list edit reported by the host's diffing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Insert,
    InsertRange,
    Update,
    UpdateRange,
    Delete,
    DeleteRange,
    Move,
}

static CHANGE_TYPES: phf::Map<&'static str, ChangeType> = phf_map! {
    "INSERT" => ChangeType::Insert,
    "INSERT_RANGE" => ChangeType::InsertRange,
    "UPDATE" => ChangeType::Update,
    "UPDATE_RANGE" => ChangeType::UpdateRange,
    "DELETE" => ChangeType::Delete,
    "DELETE_RANGE" => ChangeType::DeleteRange,
    "MOVE" => ChangeType::Move,
};

impl ChangeType {
    pub fn name(self) -> &'static str {
        match self {
            ChangeType::Insert => "INSERT",
            ChangeType::InsertRange => "INSERT_RANGE",
            ChangeType::Update => "UPDATE",
            ChangeType::UpdateRange => "UPDATE_RANGE",
            ChangeType::Delete => "DELETE",
            ChangeType::DeleteRange => "DELETE_RANGE",
            ChangeType::Move => "MOVE",
        }
    }

    pub fn is_insert(self) -> bool {
        matches!(self, ChangeType::Insert | ChangeType::InsertRange)
    }

    pub fn is_delete(self) -> bool {
        matches!(self, ChangeType::Delete | ChangeType::DeleteRange)
    }

    pub fn is_update(self) -> bool {
        matches!(self, ChangeType::Update | ChangeType::UpdateRange)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChangeType {
    type Err = ChangesetDebugError;

    fn from_str(s: &str) -> Result<Self> {
        CHANGE_TYPES
            .get(s)
            .copied()
            .ok_or_else(|| ChangesetDebugError::UnknownChangeType(s.to_string()))
    }
}

/// Render info attached to a change, carrying the owning section of the rendered item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderInfo {
    pub name: String,
    #[serde(default)]
    pub section_global_key: Option<String>,
}

impl RenderInfo {
    pub fn new(name: impl Into<String>, section_global_key: impl Into<String>) -> Self {
        RenderInfo {
            name: name.into(),
            section_global_key: Some(section_global_key.into()),
        }
    }
}

/// A single list edit. `index` addresses the list as left by all previous changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub index: i32,
    #[serde(default)]
    pub to_index: Option<usize>,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub render_infos: Vec<RenderInfo>,
    #[serde(default)]
    pub prev_data: Option<Vec<DataItem>>,
    #[serde(default)]
    pub next_data: Option<Vec<DataItem>>,
}

fn default_count() -> usize {
    1
}

impl Change {
    fn bare(change_type: ChangeType, index: i32, count: usize) -> Self {
        Change {
            change_type,
            index,
            to_index: None,
            count,
            render_infos: Vec::new(),
            prev_data: None,
            next_data: None,
        }
    }

    pub fn insert(index: i32, item: DataItem, render_info: RenderInfo) -> Self {
        Change {
            render_infos: vec![render_info],
            next_data: Some(vec![item]),
            ..Change::bare(ChangeType::Insert, index, 1)
        }
    }

    pub fn insert_range(index: i32, items: Vec<(DataItem, RenderInfo)>) -> Self {
        let count = items.len();
        let (next_data, render_infos) = items.into_iter().unzip();
        Change {
            render_infos,
            next_data: Some(next_data),
            ..Change::bare(ChangeType::InsertRange, index, count)
        }
    }

    pub fn delete(index: i32) -> Self {
        Change::bare(ChangeType::Delete, index, 1)
    }

    pub fn delete_range(index: i32, count: usize) -> Self {
        Change::bare(ChangeType::DeleteRange, index, count)
    }

    pub fn update(index: i32) -> Self {
        Change::bare(ChangeType::Update, index, 1)
    }

    pub fn update_range(index: i32, count: usize) -> Self {
        Change::bare(ChangeType::UpdateRange, index, count)
    }

    pub fn moved(index: i32, to_index: usize) -> Self {
        Change {
            to_index: Some(to_index),
            ..Change::bare(ChangeType::Move, index, 1)
        }
    }

    pub fn with_prev_data(mut self, data: Vec<DataItem>) -> Self {
        self.prev_data = Some(data);
        self
    }

    pub fn with_next_data(mut self, data: Vec<DataItem>) -> Self {
        self.next_data = Some(data);
        self
    }

    pub fn with_render_infos(mut self, render_infos: Vec<RenderInfo>) -> Self {
        self.render_infos = render_infos;
        self
    }

    /// Logical index the change addresses; negative indices address the head.
    pub fn logical_index(&self) -> usize {
        usize::try_from(self.index).unwrap_or(0)
    }

    /// Number of items a range change actually carries, as models or render infos.
    pub fn supplied_items(&self) -> usize {
        let models = self.next_data.as_ref().map_or(0, Vec::len);
        models.max(self.render_infos.len())
    }

    pub fn next_item(&self, offset: usize) -> Option<&DataItem> {
        self.next_data.as_ref().and_then(|data| data.get(offset))
    }

    /// Section owning the item rendered at `offset` of this change, if the host recorded one.
    pub fn owner_at(&self, offset: usize) -> Option<&str> {
        self.render_infos
            .get(offset)
            .and_then(|info| info.section_global_key.as_deref())
    }
}

/// All changes produced for one update, in application order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangesInfo {
    changes: Vec<Change>,
}

impl ChangesInfo {
    pub fn new(changes: Vec<Change>) -> Self {
        ChangesInfo { changes }
    }

    pub fn all_changes(&self) -> &[Change] {
        &self.changes
    }
}

/// Why the host applied a new changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Attribution {
    #[default]
    None,
    SetRoot,
    SetRootAsync,
    UpdateState,
    UpdateStateAsync,
}

static ATTRIBUTIONS: phf::Map<&'static str, Attribution> = phf_map! {
    "none" => Attribution::None,
    "setRoot" => Attribution::SetRoot,
    "setRootAsync" => Attribution::SetRootAsync,
    "updateState" => Attribution::UpdateState,
    "updateStateAsync" => Attribution::UpdateStateAsync,
};

impl Attribution {
    pub fn code(self) -> i32 {
        match self {
            Attribution::None => -1,
            Attribution::SetRoot => 0,
            Attribution::SetRootAsync => 1,
            Attribution::UpdateState => 2,
            Attribution::UpdateStateAsync => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Attribution::None),
            0 => Some(Attribution::SetRoot),
            1 => Some(Attribution::SetRootAsync),
            2 => Some(Attribution::UpdateState),
            3 => Some(Attribution::UpdateStateAsync),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Attribution::None => "none",
            Attribution::SetRoot => "setRoot",
            Attribution::SetRootAsync => "setRootAsync",
            Attribution::UpdateState => "updateState",
            Attribution::UpdateStateAsync => "updateStateAsync",
        }
    }

    pub fn is_async(self) -> bool {
        matches!(self, Attribution::SetRootAsync | Attribution::UpdateStateAsync)
    }
}

impl From<Attribution> for i32 {
    fn from(attribution: Attribution) -> Self {
        attribution.code()
    }
}

impl TryFrom<i32> for Attribution {
    type Error = ChangesetDebugError;

    fn try_from(code: i32) -> Result<Self> {
        Attribution::from_code(code)
            .ok_or_else(|| ChangesetDebugError::UnknownAttribution(code.to_string()))
    }
}

impl FromStr for Attribution {
    type Err = ChangesetDebugError;

    fn from_str(s: &str) -> Result<Self> {
        ATTRIBUTIONS
            .get(s)
            .copied()
            .ok_or_else(|| ChangesetDebugError::UnknownAttribution(s.to_string()))
    }
}

/// Everything the host reports about one completed update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(default)]
    pub root: Option<Section>,
    #[serde(default)]
    pub old_root: Option<Section>,
    #[serde(default)]
    pub changes: ChangesInfo,
    pub surface_id: String,
    #[serde(default)]
    pub attribution: Attribution,
    #[serde(default)]
    pub extra: String,
}

impl UpdateEvent {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Human readable cause, e.g. `"updateStateAsync scroll"`.
    pub fn cause(&self) -> String {
        format!("{} {}", self.attribution.name(), self.extra)
    }
}
