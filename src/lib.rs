//! Changeset introspection for section trees.
//!
//! After the host applies a changeset it hands the old and new section trees plus the
//! list changes to [`ChangesetDebug`]. The debugger walks both trees to find reused,
//! dirty and removed sections, replays the changes over the previous data models and
//! passes the resulting [`ChangesetSnapshot`] to its [`ChangesetListener`].
mod changeset_details;
mod changeset_replay;
mod config;
mod debugger;
mod errors;
mod section_tree;
mod snapshot;
mod types;

pub use changeset_details::{extract_changeset_details, ChangeSummary, SectionChangesetInfo};
pub use changeset_replay::{
    collect_previous_data, replay_changes, resolve_position, ChangesetReplay, DataSlot,
    ReplayOutcome,
};
pub use config::DebugConfig;
pub use debugger::{next_changeset_id, ChangesetDebug, ChangesetListener};
pub use errors::{ChangesetDebugError, Result};
pub use section_tree::{
    walk_sections, DirtyCheck, IndexedSection, SectionIndex, SectionTreeWalker,
    StructuralDirtyCheck,
};
pub use snapshot::{ChangesetSnapshot, DataRecord, SectionRecord, TreeRecord, ROOT_PARENT};
pub use types::{
    Attribution, Change, ChangeType, ChangesInfo, DataDiffSection, DataItem, DiffItemProvider,
    RenderInfo, Section, SectionKind, SingleComponentSection, UpdateEvent,
};
