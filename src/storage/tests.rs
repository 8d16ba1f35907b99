//! Behavioral suite shared by every [`Storage`] backend.

use super::{MemoryStorage, SqliteStorage, Storage, StorageError};

fn run_storage_tests(make: impl Fn() -> Box<dyn Storage>) {
    test_empty_list(&*make());
    test_add_assigns_unique_ids_in_order(&*make());
    test_update_replaces_name_only(&*make());
    test_update_missing_id(&*make());
    test_delete_removes_only_target(&*make());
    test_delete_missing_id(&*make());
    test_ids_not_reused_after_delete(&*make());
    test_empty_name_accepted(&*make());
}

#[test]
fn memory_backend() {
    run_storage_tests(|| Box::new(MemoryStorage::new()));
}

#[test]
fn sqlite_backend() {
    run_storage_tests(|| Box::new(SqliteStorage::open_in_memory().unwrap()));
}

fn names(store: &dyn Storage) -> Vec<(i64, String)> {
    store.list().unwrap().into_iter().map(|r| (r.id, r.name)).collect()
}

fn test_empty_list(store: &dyn Storage) {
    assert!(store.list().unwrap().is_empty());
}

fn test_add_assigns_unique_ids_in_order(store: &dyn Storage) {
    let a = store.add("alpha").unwrap();
    let b = store.add("beta").unwrap();
    let c = store.add("alpha").unwrap();

    assert_eq!(a.id, 1);
    assert!(a.id < b.id && b.id < c.id);
    assert_eq!(
        names(store),
        vec![(a.id, "alpha".to_owned()), (b.id, "beta".to_owned()), (c.id, "alpha".to_owned())]
    );
}

fn test_update_replaces_name_only(store: &dyn Storage) {
    let a = store.add("Widget").unwrap();
    let b = store.add("Other").unwrap();

    store.update(a.id, "Gadget").unwrap();

    assert_eq!(names(store), vec![(a.id, "Gadget".to_owned()), (b.id, "Other".to_owned())]);
}

fn test_update_missing_id(store: &dyn Storage) {
    store.add("Widget").unwrap();
    assert!(matches!(store.update(99, "x"), Err(StorageError::NotFound(99))));
    assert_eq!(names(store), vec![(1, "Widget".to_owned())]);
}

fn test_delete_removes_only_target(store: &dyn Storage) {
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();
    let c = store.add("c").unwrap();

    store.delete(b.id).unwrap();

    assert_eq!(names(store), vec![(a.id, "a".to_owned()), (c.id, "c".to_owned())]);
}

fn test_delete_missing_id(store: &dyn Storage) {
    let a = store.add("a").unwrap();
    store.delete(a.id).unwrap();
    assert!(matches!(store.delete(a.id), Err(StorageError::NotFound(id)) if id == a.id));
}

fn test_ids_not_reused_after_delete(store: &dyn Storage) {
    store.add("a").unwrap();
    let b = store.add("b").unwrap();
    store.delete(b.id).unwrap();

    let c = store.add("c").unwrap();
    assert!(c.id > b.id);
}

fn test_empty_name_accepted(store: &dyn Storage) {
    let r = store.add("").unwrap();
    assert_eq!(r.name, "");
}
