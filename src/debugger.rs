//! The changeset debugger: turns each applied changeset into a snapshot for the listener
use crate::changeset_details::extract_changeset_details;
use crate::changeset_replay::{collect_previous_data, replay_changes};
use crate::config::DebugConfig;
use crate::errors::{ChangesetDebugError, Result};
use crate::section_tree::{DirtyCheck, SectionTreeWalker, StructuralDirtyCheck};
use crate::snapshot::{ChangesetSnapshot, TreeRecord};
use crate::types::UpdateEvent;
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide changeset counter (lock-free, atomic)
static CHANGESET_ID_COUNTER: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(0));

static INSTALLED: OnceCell<ChangesetDebug> = OnceCell::new();

/// Unique id of the next snapshot for `surface_id`, e.g. `"12-feed"`. Counting starts at 1.
pub fn next_changeset_id(surface_id: &str) -> String {
    let id = CHANGESET_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
    format!("{}-{}", id, surface_id)
}

/// Receives one snapshot per applied changeset, on the thread that applied it.
pub trait ChangesetListener: Send + Sync {
    fn on_changeset_applied(&self, snapshot: ChangesetSnapshot);
}

impl<F> ChangesetListener for F
where
    F: Fn(ChangesetSnapshot) + Send + Sync,
{
    fn on_changeset_applied(&self, snapshot: ChangesetSnapshot) {
        self(snapshot)
    }
}

pub struct ChangesetDebug {
    listener: Box<dyn ChangesetListener>,
    dirty_check: Box<dyn DirtyCheck>,
    config: DebugConfig,
}

impl ChangesetDebug {
    pub fn new(listener: impl ChangesetListener + 'static) -> Self {
        ChangesetDebug {
            listener: Box::new(listener),
            dirty_check: Box::new(StructuralDirtyCheck),
            config: DebugConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DebugConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_dirty_check(mut self, dirty_check: impl DirtyCheck + 'static) -> Self {
        self.dirty_check = Box::new(dirty_check);
        self
    }

    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    /// Installs the process-wide debugger with default settings.
    ///
    /// Installation happens once; later calls fail with
    /// [`ChangesetDebugError::ListenerAlreadyInstalled`] and keep the first listener.
    pub fn install(listener: impl ChangesetListener + 'static) -> Result<&'static ChangesetDebug> {
        ChangesetDebug::install_debugger(ChangesetDebug::new(listener))
    }

    pub fn install_debugger(debugger: ChangesetDebug) -> Result<&'static ChangesetDebug> {
        INSTALLED
            .set(debugger)
            .map_err(|_| ChangesetDebugError::ListenerAlreadyInstalled)?;
        debug!("ChangesetDebug: listener installed");
        INSTALLED
            .get()
            .ok_or(ChangesetDebugError::ListenerAlreadyInstalled)
    }

    pub fn installed() -> Option<&'static ChangesetDebug> {
        INSTALLED.get()
    }

    /// Section records, then data records, plus the per-section changeset details.
    pub fn build_snapshot(&self, event: &UpdateEvent) -> ChangesetSnapshot {
        let root = event.root.as_ref();
        let old_root = event.old_root.as_ref();

        let changeset_data = if self.config.include_changeset_details {
            extract_changeset_details(&event.changes, root.map(|r| r.global_key.as_str()))
        } else {
            IndexMap::new()
        };

        let sections = SectionTreeWalker::new(old_root, &*self.dirty_check)
            .walk(root, self.config.include_removed_sections);
        let mut tree: Vec<TreeRecord> = sections.into_iter().map(TreeRecord::Section).collect();

        if self.config.include_data_records {
            let outcome = replay_changes(
                collect_previous_data(old_root),
                &event.changes,
                &self.config.not_available_marker,
            );
            tree.extend(outcome.records.into_iter().map(TreeRecord::Data));
        }

        let id = next_changeset_id(&event.surface_id);
        debug!(
            "ChangesetDebug: snapshot {} with {} records, {} changed sections",
            id,
            tree.len(),
            changeset_data.len()
        );

        ChangesetSnapshot {
            name: event.cause(),
            is_async: event.attribution.is_async(),
            surface_id: event.surface_id.clone(),
            id,
            tree,
            changeset_data,
        }
    }

    /// Entry point for the host, called after each applied changeset.
    pub fn on_changeset_applied(&self, event: &UpdateEvent) {
        let snapshot = self.build_snapshot(event);
        self.listener.on_changeset_applied(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribution, Change, ChangesInfo, DataItem, RenderInfo, Section};
    use std::sync::{Arc, Mutex};

    fn counter(id: &str) -> usize {
        id.split('-').next().unwrap().parse().unwrap()
    }

    fn event() -> UpdateEvent {
        let old_root = Section::new("root", "Root").with_children(vec![
            Section::new("root,header", "Header"),
            Section::data_diff("root,list", "DataDiffSection", vec![
                DataItem::new("A"),
                DataItem::new("B"),
            ]),
        ]);
        let root = Section::new("root", "Root").with_children(vec![Section::data_diff(
            "root,list",
            "DataDiffSection",
            vec![DataItem::new("B"), DataItem::new("C")],
        )]);
        UpdateEvent {
            root: Some(root),
            old_root: Some(old_root),
            changes: ChangesInfo::new(vec![
                Change::delete(0),
                Change::insert(1, DataItem::new("C"), RenderInfo::new("Row", "root,list")),
            ]),
            surface_id: "feed".to_string(),
            attribution: Attribution::UpdateStateAsync,
            extra: "scroll".to_string(),
        }
    }

    #[test]
    fn ids_increase_monotonically() {
        let first = next_changeset_id("a");
        let second = next_changeset_id("b");
        assert!(counter(&second) > counter(&first));
        assert!(second.ends_with("-b"));
    }

    #[test]
    fn snapshot_contains_sections_then_data() {
        let debugger = ChangesetDebug::new(|_: ChangesetSnapshot| {});
        let snapshot = debugger.build_snapshot(&event());

        assert_eq!(snapshot.name, "updateStateAsync scroll");
        assert!(snapshot.is_async);
        assert_eq!(snapshot.surface_id, "feed");
        assert!(snapshot.id.ends_with("-feed"));

        let identifiers: Vec<&str> = snapshot.tree.iter().map(TreeRecord::identifier).collect();
        assert_eq!(
            identifiers,
            vec!["root", "root,list", "root,header", "A", "B", "C"]
        );
        assert!(snapshot.tree[..3].iter().all(|r| r.as_section().is_some()));

        let data: Vec<(bool, bool, bool)> = snapshot
            .data_records()
            .map(|r| (r.unchanged, r.inserted, r.removed))
            .collect();
        assert_eq!(
            data,
            vec![(false, false, true), (true, false, false), (false, true, false)]
        );
        assert_eq!(snapshot.changeset_data["root"].len(), 1);
        assert_eq!(snapshot.changeset_data["root,list"].len(), 1);
    }

    #[test]
    fn config_trims_the_snapshot() {
        let config = DebugConfig {
            include_removed_sections: false,
            include_data_records: false,
            include_changeset_details: false,
            ..DebugConfig::default()
        };
        let debugger = ChangesetDebug::new(|_: ChangesetSnapshot| {}).with_config(config);
        let snapshot = debugger.build_snapshot(&event());

        assert_eq!(snapshot.tree.len(), 2);
        assert!(snapshot.section_records().all(|r| !r.removed));
        assert!(snapshot.changeset_data.is_empty());
    }

    #[test]
    fn custom_dirty_check_is_used() {
        let debugger = ChangesetDebug::new(|_: ChangesetSnapshot| {})
            .with_dirty_check(|_: &Section, _: &Section| true);
        let snapshot = debugger.build_snapshot(&event());

        let root = snapshot.section_records().next().unwrap();
        assert_eq!(root.is_dirty, Some(true));
    }

    #[test]
    fn listener_receives_the_snapshot() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let debugger = ChangesetDebug::new(move |snapshot: ChangesetSnapshot| {
            sink.lock().unwrap().push(snapshot);
        });

        debugger.on_changeset_applied(&event());
        debugger.on_changeset_applied(&UpdateEvent {
            surface_id: "empty".to_string(),
            ..UpdateEvent::default()
        });

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert!(counter(&received[1].id) > counter(&received[0].id));
        assert!(received[1].tree.is_empty());
        assert_eq!(received[1].name, "none ");
        assert!(!received[1].is_async);
    }
}
