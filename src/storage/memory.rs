use std::sync::{Mutex, MutexGuard};

use crate::model::Resource;

use super::{Storage, StorageError, StorageResult};

/// In-memory storage backed by an ordered `Vec`.
///
/// Deleting shifts the positions of later resources but never renumbers
/// their ids, and `next_id` is never rewound, so ids are not reused. Data is
/// lost on restart.
#[derive(Debug)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    resources: Vec<Resource>,
    next_id: i64,
}

impl MemoryStorage {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::with_names(std::iter::empty::<&str>())
    }

    /// Create a collection pre-populated with `names`, assigned ids `1..`.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resources: Vec<Resource> = names
            .into_iter()
            .zip(1..)
            .map(|(name, id)| Resource { id, name: name.into() })
            .collect();
        let next_id = resources.len() as i64 + 1;
        Self { inner: Mutex::new(Inner { resources, next_id }) }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn list(&self) -> StorageResult<Vec<Resource>> {
        Ok(self.lock()?.resources.clone())
    }

    fn add(&self, name: &str) -> StorageResult<Resource> {
        let mut inner = self.lock()?;
        let resource = Resource { id: inner.next_id, name: name.to_owned() };
        inner.next_id += 1;
        inner.resources.push(resource.clone());
        Ok(resource)
    }

    fn update(&self, id: i64, name: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let resource = inner
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StorageError::NotFound(id))?;
        resource.name = name.to_owned();
        Ok(())
    }

    fn delete(&self, id: i64) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let pos = inner
            .resources
            .iter()
            .position(|r| r.id == id)
            .ok_or(StorageError::NotFound(id))?;
        inner.resources.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_collection_continues_numbering() {
        let store = MemoryStorage::with_names(["Resource 1", "Resource 2"]);
        let created = store.add("Resource 3").unwrap();
        assert_eq!(created.id, 3);
    }

    #[test]
    fn delete_shifts_positions_but_keeps_ids() {
        let store = MemoryStorage::with_names(["a", "b", "c"]);
        store.delete(1).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(store.add("d").unwrap().id, 4);
    }
}
