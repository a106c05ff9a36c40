use std::sync::Arc;

use purrcafe::{
    FixedClock, MeowIdGenerator, Store, StoreConfig, User, backend::BackendImpl,
    backend::database::InMemory, hash::password_hash,
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via the TEST_BACKEND env var.

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// # Panics
/// Panics if TEST_BACKEND=sqlite but the `sqlite` feature is not enabled.
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test
/// ```
pub fn test_backend() -> Box<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use purrcafe::backend::database::Sqlite;
                Box::new(Sqlite::in_memory().expect("Failed to create SQLite backend"))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Err(_) => Box::new(InMemory::new()),
        Ok(other) => panic!("Unknown TEST_BACKEND: {other}"),
    }
}

/// Clock shared by a test store, starting 2024-01-01T00:00:00Z.
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::default())
}

/// Store on the selected backend with the default configuration.
pub fn test_store() -> Store {
    test_store_with(StoreConfig::default(), test_clock())
}

/// Store on the selected backend with an explicit configuration and clock.
pub fn test_store_with(config: StoreConfig, clock: Arc<FixedClock>) -> Store {
    Store::open_with(
        test_backend(),
        config,
        Arc::new(MeowIdGenerator::new(clock)),
    )
    .expect("Failed to open store")
}

/// Configuration that seeds the admin account with password "admin".
pub fn admin_config() -> StoreConfig {
    StoreConfig::default().with_admin_password_hash(password_hash("admin"))
}

/// Creates a regular user whose password is their name.
pub fn create_user(store: &Store, name: &str) -> User {
    User::create(
        store,
        name,
        &format!("{name}@purr.cafe"),
        &password_hash(name),
    )
    .expect("Failed to create user")
}
