//! Per-section changeset summaries shown next to the tree
use crate::types::{Change, ChangeType, ChangesInfo, DataItem};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSummary {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub index: i32,
    #[serde(rename = "toIndex", skip_serializing_if = "Option::is_none")]
    pub to_index: Option<usize>,
    pub count: usize,
    pub render_infos: Vec<String>,
    pub prev_data: Vec<String>,
    pub next_data: Vec<String>,
}

impl From<&Change> for ChangeSummary {
    fn from(change: &Change) -> Self {
        ChangeSummary {
            change_type: change.change_type,
            index: change.index,
            to_index: change.to_index,
            count: change.count,
            render_infos: change.render_infos.iter().map(|info| info.name.clone()).collect(),
            prev_data: data_names(change.prev_data.as_deref()),
            next_data: data_names(change.next_data.as_deref()),
        }
    }
}

fn data_names(data: Option<&[DataItem]>) -> Vec<String> {
    data.unwrap_or_default().iter().map(DataItem::name).collect()
}

/// Changes of one section, keyed `"0"`, `"1"`, ... in application order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SectionChangesetInfo {
    pub changesets: IndexMap<String, ChangeSummary>,
}

impl SectionChangesetInfo {
    fn push(&mut self, summary: ChangeSummary) {
        let key = self.changesets.len().to_string();
        self.changesets.insert(key, summary);
    }

    pub fn len(&self) -> usize {
        self.changesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changesets.is_empty()
    }
}

/// Groups every change under the section that owns it.
///
/// The owner is the section recorded on the change's first render info; changes
/// without one belong to `root_key`. With neither, the change is dropped.
pub fn extract_changeset_details(
    changes: &ChangesInfo,
    root_key: Option<&str>,
) -> IndexMap<String, SectionChangesetInfo> {
    let mut details: IndexMap<String, SectionChangesetInfo> = IndexMap::new();

    for change in changes.all_changes() {
        let Some(owner) = change.owner_at(0).or(root_key) else {
            debug!(
                "ChangesetDetails: dropping {} at {} without an owning section",
                change.change_type, change.index
            );
            continue;
        };
        details
            .entry(owner.to_string())
            .or_default()
            .push(ChangeSummary::from(change));
    }

    details
}
