//! JSON persistence of the InMemory backend.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use purrcafe::{
    FixedClock, MeowIdGenerator, Session, Store, StoreConfig, User,
    backend::{Table, database::InMemory},
};

use crate::helpers::create_user;

fn open(backend: InMemory) -> Store {
    Store::open_with(
        Box::new(backend),
        StoreConfig::default(),
        Arc::new(MeowIdGenerator::new(Arc::new(FixedClock::default()))),
    )
    .unwrap()
}

fn in_memory(store: &Store) -> &InMemory {
    store
        .backend()
        .as_any()
        .downcast_ref::<InMemory>()
        .unwrap()
}

#[test]
fn test_store_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("purrcafe.json");

    let (tom_id, session_id) = {
        let store = open(InMemory::new());
        let tom = create_user(&store, "tom");
        let session = Session::create(&store, &tom, None).unwrap();
        in_memory(&store).save_to_file(&path).unwrap();
        (tom.id(), session.id())
    };
    assert!(path.exists());

    let store = open(InMemory::load_from_file(&path).unwrap());
    let mut tom = User::get(&store, tom_id).unwrap();
    assert_eq!(tom.name().unwrap(), "tom");
    let mut session = Session::get(&store, session_id).unwrap();
    assert_eq!(session.owner_id().unwrap(), tom_id);
    assert_eq!(session.expiration_time().unwrap(), None);

    // Reserved rows are not seeded twice.
    assert_eq!(in_memory(&store).row_count(Table::Users), 2);
    assert_eq!(in_memory(&store).row_count(Table::Sessions), 2);
}

#[test]
fn test_load_non_existent_file() {
    let dir = TempDir::new().unwrap();
    let backend = InMemory::load_from_file(dir.path().join("missing.json")).unwrap();
    assert_eq!(backend.row_count(Table::Users), 0);
}

#[test]
fn test_load_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("invalid.json");
    fs::write(&path, "{ not json").unwrap();

    let err = InMemory::load_from_file(&path).unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_load_rejects_unknown_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.json");
    fs::write(&path, r#"{ "_v": 9, "tables": {} }"#).unwrap();

    assert!(InMemory::load_from_file(&path).is_err());
}
