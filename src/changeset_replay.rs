//! Replays a changeset against the data models of the previous tree.
//!
//! Change indices address the list as left by every earlier change, counting only
//! models that have not been deleted. Deleted models stay in the working list so
//! they can be reported, which is why every change first maps its logical index to
//! a physical position with [`resolve_position`].
use crate::errors::ChangesetDebugError;
use crate::snapshot::DataRecord;
use crate::types::{Change, ChangeType, ChangesInfo, DataItem, Section};
use log::{debug, trace, warn};

/// One data model in the working list, with the last change applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSlot {
    pub model: Option<DataItem>,
    pub section_key: Option<String>,
    pub operation: Option<ChangeType>,
}

impl DataSlot {
    pub fn unchanged(model: Option<DataItem>, section_key: impl Into<String>) -> Self {
        DataSlot {
            model,
            section_key: Some(section_key.into()),
            operation: None,
        }
    }

    fn changed(model: Option<DataItem>, section_key: Option<&str>, operation: ChangeType) -> Self {
        DataSlot {
            model,
            section_key: section_key.map(String::from),
            operation: Some(operation),
        }
    }

    /// Live models are the ones later change indices count.
    pub fn is_live(&self) -> bool {
        !self.operation.is_some_and(ChangeType::is_delete)
    }

    pub fn to_record(&self, not_available: &str) -> DataRecord {
        let name = self
            .model
            .as_ref()
            .map_or_else(|| not_available.to_string(), DataItem::name);
        DataRecord::new(name, self.section_key.clone(), self.operation)
    }
}

/// Data models of every diffing section of `previous_root`, in pre-order.
///
/// Diffing sections own their items; their children are not searched.
pub fn collect_previous_data(previous_root: Option<&Section>) -> Vec<DataSlot> {
    let mut slots = Vec::new();
    if let Some(root) = previous_root {
        collect_recursive(root, &mut slots);
    }
    slots
}

fn collect_recursive(section: &Section, slots: &mut Vec<DataSlot>) {
    if let Some(provider) = section.kind.diff_provider() {
        match provider.provide_diff_items() {
            Ok(items) => slots.extend(
                items
                    .into_iter()
                    .map(|model| DataSlot::unchanged(model, section.global_key.as_str())),
            ),
            Err(err) => warn!(
                "ChangesetReplay: no data for section '{}': {}",
                section.global_key, err
            ),
        }
        return;
    }

    for child in &section.children {
        collect_recursive(child, slots);
    }
}

/// Physical position of the `index`-th live slot.
///
/// Returns `slots.len()` when fewer live slots exist, which makes an index equal to
/// the live count the append position.
pub fn resolve_position(slots: &[DataSlot], index: usize) -> usize {
    let mut live = 0;
    for (position, slot) in slots.iter().enumerate() {
        if slot.is_live() {
            if live == index {
                return position;
            }
            live += 1;
        }
    }
    slots.len()
}

/// Working list of a replay in progress.
#[derive(Debug, Default)]
pub struct ChangesetReplay {
    slots: Vec<DataSlot>,
    defects: Vec<ChangesetDebugError>,
}

/// Result of a full replay: one record per slot plus the inconsistencies met on the way.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub records: Vec<DataRecord>,
    pub defects: Vec<ChangesetDebugError>,
}

impl ChangesetReplay {
    pub fn new(slots: Vec<DataSlot>) -> Self {
        ChangesetReplay {
            slots,
            defects: Vec::new(),
        }
    }

    pub fn from_previous_tree(previous_root: Option<&Section>) -> Self {
        ChangesetReplay::new(collect_previous_data(previous_root))
    }

    pub fn slots(&self) -> &[DataSlot] {
        &self.slots
    }

    pub fn defects(&self) -> &[ChangesetDebugError] {
        &self.defects
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_live()).count()
    }

    pub fn apply_all(&mut self, changes: &ChangesInfo) {
        for change in changes.all_changes() {
            self.apply(change);
        }
    }

    pub fn apply(&mut self, change: &Change) {
        let index = change.logical_index();
        trace!(
            "ChangesetReplay: {} index={} count={} over {} slots",
            change.change_type,
            index,
            change.count,
            self.slots.len()
        );

        match change.change_type {
            ChangeType::Insert => {
                let position = resolve_position(&self.slots, index);
                let slot = DataSlot::changed(
                    change.next_item(0).cloned(),
                    change.owner_at(0),
                    ChangeType::Insert,
                );
                self.slots.insert(position, slot);
            }
            ChangeType::InsertRange => {
                let position = resolve_position(&self.slots, index);
                let supplied = change.supplied_items();
                if change.count > supplied {
                    self.report(ChangesetDebugError::RangeExceedsSuppliedItems {
                        change: ChangeType::InsertRange,
                        count: change.count,
                        supplied,
                    });
                }
                for item in 0..change.count.min(supplied) {
                    let slot = DataSlot::changed(
                        change.next_item(item).cloned(),
                        change.owner_at(item),
                        ChangeType::InsertRange,
                    );
                    self.slots.insert(position + item, slot);
                }
            }
            ChangeType::Delete | ChangeType::Update => {
                let position = resolve_position(&self.slots, index);
                self.tag(position, change.change_type, index);
            }
            ChangeType::DeleteRange => {
                let position = resolve_position(&self.slots, index);
                for offset in 0..change.count {
                    if !self.tag(position + offset, ChangeType::DeleteRange, index + offset) {
                        break;
                    }
                }
            }
            ChangeType::UpdateRange => {
                for update_index in index..index.saturating_add(change.count) {
                    let position = resolve_position(&self.slots, update_index);
                    if !self.tag(position, ChangeType::UpdateRange, update_index) {
                        break;
                    }
                }
            }
            ChangeType::Move => {
                trace!("ChangesetReplay: MOVE leaves the data list untouched");
            }
        }
    }

    fn tag(&mut self, position: usize, operation: ChangeType, index: usize) -> bool {
        let len = self.slots.len();
        match self.slots.get_mut(position) {
            Some(slot) => {
                slot.operation = Some(operation);
                true
            }
            None => {
                self.report(ChangesetDebugError::PositionOutOfBounds {
                    change: operation,
                    index,
                    position,
                    len,
                });
                false
            }
        }
    }

    fn report(&mut self, defect: ChangesetDebugError) {
        warn!("ChangesetReplay: {}", defect);
        self.defects.push(defect);
    }

    pub fn finish(self, not_available: &str) -> ReplayOutcome {
        let records = self
            .slots
            .iter()
            .map(|slot| slot.to_record(not_available))
            .collect();
        ReplayOutcome {
            records,
            defects: self.defects,
        }
    }
}

/// Applies `changes` in order to `previous` and reports every slot.
pub fn replay_changes(
    previous: Vec<DataSlot>,
    changes: &ChangesInfo,
    not_available: &str,
) -> ReplayOutcome {
    let mut replay = ChangesetReplay::new(previous);
    replay.apply_all(changes);
    let outcome = replay.finish(not_available);
    debug!(
        "ChangesetReplay: {} data records, {} defects",
        outcome.records.len(),
        outcome.defects.len()
    );
    outcome
}
