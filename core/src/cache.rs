//! Ordered collection cache.
//!
//! The cache is readable by anyone holding the dashboard, but only the
//! coordinator and the mutation commands it drives can change it.

use crate::record::{RecordId, UserRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCache {
    records: Vec<UserRecord>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn replace_all(&mut self, records: Vec<UserRecord>) {
        self.records = records;
    }

    pub(crate) fn push(&mut self, record: UserRecord) {
        self.records.push(record);
    }

    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<&mut UserRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn remove(&mut self, id: RecordId) -> Option<(usize, UserRecord)> {
        let index = self.position(id)?;
        Some((index, self.records.remove(index)))
    }

    /// Ids of the records directly before and after `id`.
    pub(crate) fn neighbours(&self, id: RecordId) -> (Option<RecordId>, Option<RecordId>) {
        let Some(index) = self.position(id) else {
            return (None, None);
        };
        let prev = index.checked_sub(1).map(|i| self.records[i].id);
        let next = self.records.get(index + 1).map(|r| r.id);
        (prev, next)
    }

    /// Insert at `index`, or at the end if the cache has shrunk since.
    pub(crate) fn insert(&mut self, index: usize, record: UserRecord) {
        let index = index.min(self.records.len());
        self.records.insert(index, record);
    }

    /// Put a removed record back next to whichever old neighbour is still
    /// cached, falling back to its raw index.
    pub(crate) fn reinsert(&mut self, anchor: &Anchor, record: UserRecord) {
        if let Some(index) = anchor.next.and_then(|id| self.position(id)) {
            self.records.insert(index, record);
        } else if let Some(index) = anchor.prev.and_then(|id| self.position(id)) {
            self.records.insert(index + 1, record);
        } else {
            self.insert(anchor.index, record);
        }
    }
}

/// Where a removed record used to sit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub index: usize,
    pub prev: Option<RecordId>,
    pub next: Option<RecordId>,
}

impl From<Vec<UserRecord>> for UserCache {
    fn from(records: Vec<UserRecord>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Company;

    fn record(id: u64) -> UserRecord {
        UserRecord {
            id: RecordId::Committed(id),
            name: format!("User {id}"),
            email: format!("user{id}@x.io"),
            phone: String::new(),
            company: Company::named("C"),
            address: None,
            username: None,
            website: None,
        }
    }

    fn ids(cache: &UserCache) -> Vec<RecordId> {
        cache.records().iter().map(|r| r.id).collect()
    }

    fn remove_anchored(cache: &mut UserCache, id: u64) -> (Anchor, UserRecord) {
        let (prev, next) = cache.neighbours(RecordId::Committed(id));
        let (index, record) = cache.remove(RecordId::Committed(id)).unwrap();
        (Anchor { index, prev, next }, record)
    }

    #[test]
    fn neighbours_at_the_edges() {
        let cache = UserCache::from(vec![record(1), record(2), record(3)]);
        assert_eq!(cache.neighbours(RecordId::Committed(1)), (None, Some(RecordId::Committed(2))));
        assert_eq!(
            cache.neighbours(RecordId::Committed(3)),
            (Some(RecordId::Committed(2)), None)
        );
        assert_eq!(cache.neighbours(RecordId::Committed(9)), (None, None));
    }

    #[test]
    fn reinsert_follows_surviving_neighbour() {
        let before = UserCache::from(vec![record(1), record(2), record(3), record(4)]);

        // Removed 2 then 3; restored in both orders.
        for restore_second_first in [false, true] {
            let mut cache = before.clone();
            let (anchor2, rec2) = remove_anchored(&mut cache, 2);
            let (anchor3, rec3) = remove_anchored(&mut cache, 3);
            if restore_second_first {
                cache.reinsert(&anchor3, rec3);
                cache.reinsert(&anchor2, rec2);
            } else {
                cache.reinsert(&anchor2, rec2);
                cache.reinsert(&anchor3, rec3);
            }
            assert_eq!(ids(&cache), ids(&before));
        }
    }

    #[test]
    fn reinsert_falls_back_to_index_without_neighbours() {
        let mut cache = UserCache::from(vec![record(1)]);
        let (anchor, rec) = remove_anchored(&mut cache, 1);
        cache.reinsert(&anchor, rec);
        assert_eq!(ids(&cache), vec![RecordId::Committed(1)]);
    }
}
