use std::sync::Arc;

use purrcafe::{
    FixedClock, MeowIdGenerator, Store, StoreConfig, User, backend::database::InMemory,
    hash::password_hash,
};

/// Store on a fresh InMemory backend.
///
/// The generator runs on an auto-advancing test clock so tight loops never
/// hit the per-second identifier cap.
pub fn setup_store() -> Store {
    Store::open_with(
        Box::new(InMemory::new()),
        StoreConfig::default(),
        Arc::new(MeowIdGenerator::new(Arc::new(FixedClock::default()))),
    )
    .expect("Failed to open store")
}

/// Store with `count` users named `cat0`, `cat1`, ...
pub fn setup_store_with_users(count: usize) -> (Store, Vec<User>) {
    let store = setup_store();
    let users = (0..count)
        .map(|i| {
            User::create(&store, &format!("cat{i}"), "", &password_hash("meow"))
                .expect("Failed to create user")
        })
        .collect();
    (store, users)
}
