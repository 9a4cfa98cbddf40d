//! Ordered, id-keyed set of drop records visible to one view.

use std::collections::HashMap;
use std::sync::Arc;

use dropzone_core::{DropId, DropRecord};

/// Drop records keyed by id, kept in service arrival order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CatalogSnapshot {
    by_id: HashMap<DropId, Arc<DropRecord>>,
    order: Vec<DropId>,
}

impl CatalogSnapshot {
    /// Build a snapshot from service records. Later duplicates of an id are ignored.
    #[must_use]
    pub fn from_records(records: Vec<DropRecord>) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            if !snapshot.push(record.clone()) {
                tracing::debug!(drop_id = %record.id(), "ignoring duplicate drop in collection");
            }
        }
        snapshot
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a record with this id is present.
    #[must_use]
    pub fn contains(&self, id: &DropId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Read a record by id.
    #[must_use]
    pub fn get(&self, id: &DropId) -> Option<&DropRecord> {
        self.by_id.get(id).map(AsRef::as_ref)
    }

    /// Position of a record in arrival order.
    #[must_use]
    pub fn position(&self, id: &DropId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Ids in arrival order.
    #[must_use]
    pub fn ids(&self) -> &[DropId] {
        &self.order
    }

    /// Records in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &DropRecord> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).map(AsRef::as_ref))
    }

    /// Owned copies of the records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<DropRecord> {
        self.iter().cloned().collect()
    }

    /// Append a record when its id is absent. Returns `false` for duplicates.
    pub(crate) fn push(&mut self, record: DropRecord) -> bool {
        let len = self.order.len();
        self.insert_at(len, record)
    }

    /// Insert a record at `index` (clamped) when its id is absent.
    pub(crate) fn insert_at(&mut self, index: usize, record: DropRecord) -> bool {
        if self.by_id.contains_key(record.id()) {
            return false;
        }
        let index = index.min(self.order.len());
        self.order.insert(index, record.id().clone());
        self.by_id.insert(record.id().clone(), Arc::new(record));
        true
    }

    /// Remove a record, returning its former position.
    pub(crate) fn remove(&mut self, id: &DropId) -> Option<usize> {
        self.by_id.remove(id)?;
        let position = self.position(id);
        self.order.retain(|candidate| candidate != id);
        position
    }

    /// Replace the bookmark flag of a record. Returns whether the record is present.
    pub(crate) fn set_bookmark(&mut self, id: &DropId, bookmarked: bool) -> bool {
        let Some(current) = self.by_id.get(id) else {
            return false;
        };
        if current.is_bookmarked() != bookmarked {
            let next = current.with_bookmark(bookmarked);
            self.by_id.insert(id.clone(), Arc::new(next));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropzone_test_support::fixtures::DropFixture;

    fn snapshot(ids: &[&str]) -> CatalogSnapshot {
        CatalogSnapshot::from_records(
            ids.iter()
                .map(|id| DropFixture::released(id).build())
                .collect(),
        )
    }

    #[test]
    fn keeps_arrival_order_and_skips_duplicates() {
        let snapshot = snapshot(&["3", "1", "3", "2"]);
        let ids: Vec<&str> = snapshot.ids().iter().map(DropId::as_str).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn remove_reports_position_and_insert_restores_it() {
        let mut snapshot = snapshot(&["a", "b", "c"]);
        let before = snapshot.clone();
        let record = snapshot.get(&DropId::from("b")).cloned().expect("b present");

        assert_eq!(snapshot.remove(&DropId::from("b")), Some(1));
        assert!(!snapshot.contains(&DropId::from("b")));
        assert!(snapshot.insert_at(1, record));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn set_bookmark_replaces_only_the_flag() {
        let mut snapshot = snapshot(&["a"]);
        let id = DropId::from("a");
        assert!(snapshot.set_bookmark(&id, true));
        assert!(snapshot.get(&id).is_some_and(DropRecord::is_bookmarked));
        assert!(!snapshot.set_bookmark(&DropId::from("missing"), true));
    }

    #[test]
    fn insert_at_clamps_and_rejects_duplicates() {
        let mut snapshot = snapshot(&["a"]);
        assert!(snapshot.insert_at(10, DropFixture::released("b").build()));
        assert!(!snapshot.insert_at(0, DropFixture::released("a").build()));
        assert_eq!(snapshot.ids().last().map(DropId::as_str), Some("b"));
    }
}
