//! Section tree walk: reuse/dirty status for every new section plus the sections that went away
use crate::snapshot::{SectionRecord, ROOT_PARENT};
use crate::types::Section;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashSet;

/// Host predicate deciding whether a section changed between two snapshots.
pub trait DirtyCheck: Send + Sync {
    fn is_section_dirty(&self, old: &Section, new: &Section) -> bool;
}

impl<F> DirtyCheck for F
where
    F: Fn(&Section, &Section) -> bool + Send + Sync,
{
    fn is_section_dirty(&self, old: &Section, new: &Section) -> bool {
        self(old, new)
    }
}

/// Dirty when the section's own name or payload differs. Children are compared separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDirtyCheck;

impl DirtyCheck for StructuralDirtyCheck {
    fn is_section_dirty(&self, old: &Section, new: &Section) -> bool {
        old.simple_name != new.simple_name || old.kind != new.kind
    }
}

/// A section of an indexed tree together with its parent's key.
#[derive(Debug, Clone, Copy)]
pub struct IndexedSection<'a> {
    pub section: &'a Section,
    pub parent_key: Option<&'a str>,
}

/// Global key -> section lookup for one snapshot, in pre-order.
#[derive(Debug, Default)]
pub struct SectionIndex<'a> {
    by_key: IndexMap<&'a str, IndexedSection<'a>>,
}

impl<'a> SectionIndex<'a> {
    pub fn build(root: Option<&'a Section>) -> Self {
        let mut index = SectionIndex::default();
        if let Some(root) = root {
            index.insert_recursive(root, None);
        }
        index
    }

    fn insert_recursive(&mut self, section: &'a Section, parent_key: Option<&'a str>) {
        let previous = self.by_key.insert(
            section.global_key.as_str(),
            IndexedSection { section, parent_key },
        );
        if previous.is_some() {
            debug!(
                "SectionIndex: duplicate global key '{}', keeping the later section",
                section.global_key
            );
        }

        for child in &section.children {
            self.insert_recursive(child, Some(section.global_key.as_str()));
        }
    }

    pub fn get(&self, global_key: &str) -> Option<&IndexedSection<'a>> {
        self.by_key.get(global_key)
    }

    pub fn contains(&self, global_key: &str) -> bool {
        self.by_key.contains_key(global_key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &IndexedSection<'a>)> {
        self.by_key.iter().map(|(key, entry)| (*key, entry))
    }
}

pub struct SectionTreeWalker<'a> {
    old_index: SectionIndex<'a>,
    dirty_check: &'a dyn DirtyCheck,
    visited: HashSet<&'a str>,
    records: Vec<SectionRecord>,
}

impl<'a> SectionTreeWalker<'a> {
    pub fn new(old_root: Option<&'a Section>, dirty_check: &'a dyn DirtyCheck) -> Self {
        SectionTreeWalker {
            old_index: SectionIndex::build(old_root),
            dirty_check,
            visited: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Pre-order records of `new_root`, followed by one record per old section missing from it.
    pub fn walk(mut self, new_root: Option<&'a Section>, include_removed: bool) -> Vec<SectionRecord> {
        if let Some(root) = new_root {
            self.visit(root, ROOT_PARENT);
        }
        let visited_count = self.records.len();

        if include_removed {
            self.add_removed_sections();
        }

        debug!(
            "SectionTreeWalker: {} sections visited, {} removed",
            visited_count,
            self.records.len() - visited_count
        );
        self.records
    }

    fn visit(&mut self, section: &'a Section, parent_key: &str) {
        let key = section.global_key.as_str();
        let is_dirty = match self.old_index.get(key) {
            Some(old) => self.dirty_check.is_section_dirty(old.section, section),
            None => true,
        };
        trace!("SectionTreeWalker: '{}' dirty={}", key, is_dirty);

        self.visited.insert(key);
        self.records.push(SectionRecord::visited(
            key,
            &section.simple_name,
            parent_key,
            is_dirty,
        ));

        for child in &section.children {
            self.visit(child, key);
        }
    }

    fn add_removed_sections(&mut self) {
        let removed: Vec<SectionRecord> = self
            .old_index
            .iter()
            .filter(|(key, _)| !self.visited.contains(key))
            .map(|(key, old)| SectionRecord::removed(key, &old.section.simple_name, old.parent_key))
            .collect();
        self.records.extend(removed);
    }
}

/// Walks `new_root` against `old_root`; see [`SectionTreeWalker::walk`].
pub fn walk_sections(
    new_root: Option<&Section>,
    old_root: Option<&Section>,
    dirty_check: &dyn DirtyCheck,
) -> Vec<SectionRecord> {
    SectionTreeWalker::new(old_root, dirty_check).walk(new_root, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataItem;

    fn tree(children: Vec<Section>) -> Section {
        Section::new("1", "Root").with_children(children)
    }

    fn keys(records: &[SectionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.identifier.as_str()).collect()
    }

    #[test]
    fn removed_child_is_reported_after_new_tree() {
        let old = tree(vec![Section::new("2", "Header"), Section::new("3", "Footer")]);
        let new = tree(vec![Section::new("3", "Footer")]);

        let records = walk_sections(Some(&new), Some(&old), &StructuralDirtyCheck);

        assert_eq!(keys(&records), vec!["1", "3", "2"]);
        let removed = &records[2];
        assert!(removed.removed);
        assert_eq!(removed.name, "Header");
        assert_eq!(removed.parent, "1");
        assert!(records[..2].iter().all(|r| !r.removed));
    }

    #[test]
    fn pre_order_with_parents() {
        let new = tree(vec![
            Section::new("2", "Header").with_children(vec![Section::new("2.1", "Title")]),
            Section::new("3", "Footer"),
        ]);

        let records = walk_sections(Some(&new), None, &StructuralDirtyCheck);

        assert_eq!(keys(&records), vec!["1", "2", "2.1", "3"]);
        let parents: Vec<&str> = records.iter().map(|r| r.parent.as_str()).collect();
        assert_eq!(parents, vec![ROOT_PARENT, "1", "2", "1"]);
    }

    #[test]
    fn sections_without_old_counterpart_are_dirty() {
        let old = tree(vec![]);
        let new = tree(vec![Section::new("2", "Header")]);

        let records = walk_sections(Some(&new), Some(&old), &StructuralDirtyCheck);

        assert_eq!(records[0].is_dirty, Some(false));
        assert_eq!(records[0].is_reused, Some(true));
        assert_eq!(records[1].is_dirty, Some(true));
        assert_eq!(records[1].is_reused, Some(false));
    }

    #[test]
    fn dirty_check_is_consulted_for_matching_keys() {
        let old = tree(vec![Section::data_diff("2", "List", vec![DataItem::new("a")])]);
        let new = tree(vec![Section::data_diff("2", "List", vec![DataItem::new("b")])]);

        let records = walk_sections(Some(&new), Some(&old), &StructuralDirtyCheck);
        assert!(records[1].is_dirty());

        let never_dirty = |_: &Section, _: &Section| false;
        let records = walk_sections(Some(&new), Some(&old), &never_dirty);
        assert!(!records[1].is_dirty());
    }

    #[test]
    fn moved_section_is_not_removed() {
        let old = tree(vec![
            Section::new("2", "Group").with_children(vec![Section::new("4", "Row")]),
            Section::new("3", "Group"),
        ]);
        let new = tree(vec![
            Section::new("2", "Group"),
            Section::new("3", "Group").with_children(vec![Section::new("4", "Row")]),
        ]);

        let records = walk_sections(Some(&new), Some(&old), &StructuralDirtyCheck);

        assert!(records.iter().all(|r| !r.removed));
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn removed_subtree_keeps_traversal_order() {
        let old = tree(vec![Section::new("2", "Group").with_children(vec![
            Section::new("5", "Row"),
            Section::new("6", "Row"),
        ])]);
        let new = tree(vec![]);

        let records = walk_sections(Some(&new), Some(&old), &StructuralDirtyCheck);

        assert_eq!(keys(&records), vec!["1", "2", "5", "6"]);
        assert_eq!(records[2].parent, "2");
    }

    #[test]
    fn absent_roots_contribute_nothing() {
        let old = tree(vec![Section::new("2", "Header")]);

        assert!(walk_sections(None, None, &StructuralDirtyCheck).is_empty());

        let records = walk_sections(None, Some(&old), &StructuralDirtyCheck);
        assert_eq!(keys(&records), vec!["1", "2"]);
        assert!(records.iter().all(|r| r.removed));
        assert_eq!(records[0].parent, ROOT_PARENT);
    }

    #[test]
    fn index_lookup() {
        let root = tree(vec![Section::new("2", "Header")]);
        let index = SectionIndex::build(Some(&root));

        assert_eq!(index.len(), 2);
        assert!(index.contains("2"));
        assert_eq!(index.get("2").and_then(|s| s.parent_key), Some("1"));
        assert!(index.get("1").and_then(|s| s.parent_key).is_none());
    }
}
