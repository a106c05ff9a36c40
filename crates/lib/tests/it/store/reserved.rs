//! Reserved rows seeded by the store.

use purrcafe::{Identity, Session, User, constants::ADMIN_ID, hash::password_hash};

use crate::helpers::{admin_config, test_clock, test_store, test_store_with};

#[test]
fn test_guest_rows_exist_after_open() {
    let store = test_store();
    let mut guest = User::guest(&store).unwrap();
    assert_eq!(guest.identity(), Identity::Guest);
    assert_eq!(guest.name().unwrap(), "guest");

    let mut session = Session::guest(&store).unwrap();
    assert_eq!(session.id().to_string(), "00000000-000-00000");
    assert_eq!(session.owner_id().unwrap(), guest.id());
    assert_eq!(session.expiration_time().unwrap(), None);
}

#[test]
fn test_admin_is_only_seeded_when_configured() {
    let store = test_store();
    assert!(User::get(&store, ADMIN_ID).unwrap_err().is_not_found());

    let store = test_store_with(admin_config(), test_clock());
    let mut admin = User::get(&store, ADMIN_ID).unwrap();
    assert_eq!(admin.identity(), Identity::Admin);
    assert_eq!(admin.name().unwrap(), "admin");
}

#[test]
fn test_admin_can_log_in() {
    let store = test_store_with(admin_config(), test_clock());
    let mut session = User::login(&store, "admin", &password_hash("admin")).unwrap();
    assert_eq!(session.owner_id().unwrap(), ADMIN_ID);
}

#[test]
fn test_reserved_users_reject_mutation() {
    let store = test_store_with(admin_config(), test_clock());
    let mut admin = User::get(&store, ADMIN_ID).unwrap();
    assert!(admin.set_name("root").unwrap_err().is_permission_denied());
    assert!(
        admin
            .set_password_hash(&password_hash("new"))
            .unwrap_err()
            .is_permission_denied()
    );
    assert!(admin.delete().unwrap_err().is_permission_denied());

    let guest = User::guest(&store).unwrap();
    assert!(guest.delete().unwrap_err().is_permission_denied());
    assert!(
        Session::guest(&store)
            .unwrap()
            .delete()
            .unwrap_err()
            .is_permission_denied()
    );
}
