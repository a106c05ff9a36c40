//! SQLite-specific behavior: file databases and transaction visibility.

use std::sync::Arc;

use tempfile::TempDir;

use purrcafe::{
    FixedClock, MeowIdGenerator, Session, Store, StoreConfig, User,
    backend::{BackendImpl, Filter, Projection, Statement, Table, Value, database::Sqlite},
};

use crate::helpers::create_user;

fn open(backend: Sqlite) -> Store {
    Store::open_with(
        Box::new(backend),
        StoreConfig::default(),
        Arc::new(MeowIdGenerator::new(Arc::new(FixedClock::default()))),
    )
    .unwrap()
}

#[test]
fn test_file_database_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("purrcafe.db");

    let tom_id = {
        let store = open(Sqlite::open_sqlite(&path).unwrap());
        let tom = create_user(&store, "tom");
        Session::create(&store, &tom, None).unwrap();
        tom.id()
    };

    let store = open(Sqlite::open_sqlite(&path).unwrap());
    let mut tom = User::get(&store, tom_id).unwrap();
    assert_eq!(tom.email().unwrap(), "tom@purr.cafe");
    assert_eq!(tom.sessions().unwrap().len(), 1);
    // Guest plus tom; seeding did not run twice.
    assert_eq!(User::get_all(&store).unwrap().len(), 2);
}

#[test]
fn test_reads_see_uncommitted_writes_of_open_transaction() {
    let backend = Sqlite::in_memory().unwrap();
    let row = [
        ("id", Value::Integer(5)),
        ("name", Value::from("tom")),
        ("email", Value::from("")),
        ("password_hash", Value::from("0".repeat(128))),
        ("creation_time", Value::Integer(0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    backend
        .execute(&Statement::Insert {
            table: Table::Users,
            row,
        })
        .unwrap();

    let select = Statement::Select {
        table: Table::Users,
        projection: Projection::Columns(vec!["name"]),
        filter: Filter::All,
    };
    assert_eq!(backend.execute(&select).unwrap().rows.len(), 1);
    backend.rollback().unwrap();
    assert!(backend.execute(&select).unwrap().rows.is_empty());
}
