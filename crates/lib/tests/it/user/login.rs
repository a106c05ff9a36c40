//! Password checks and session issuance.

use std::time::Duration;

use chrono::TimeDelta;
use purrcafe::{StoreConfig, User, hash::password_hash};

use crate::helpers::{create_user, test_clock, test_store, test_store_with};

#[test]
fn test_login_issues_week_long_session() {
    let store = test_store();
    let tom = create_user(&store, "tom");

    let mut session = User::login(&store, "tom", &password_hash("tom")).unwrap();
    assert_eq!(session.owner_id().unwrap(), tom.id());
    let lifetime = session.expiration_time().unwrap().unwrap() - session.creation_time().unwrap();
    assert!(lifetime >= TimeDelta::days(7));
    assert!(lifetime < TimeDelta::days(7) + TimeDelta::seconds(2));
}

#[test]
fn test_wrong_password_is_credential_mismatch() {
    let store = test_store();
    let mut tom = create_user(&store, "tom");
    let err = tom.authorize(&password_hash("jerry"), None).unwrap_err();
    assert!(err.is_credential_mismatch());
    assert!(tom.sessions().unwrap().is_empty());

    let err = User::login(&store, "nobody", &password_hash("x")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_authorize_uses_current_stored_hash() {
    let store = test_store();
    let mut tom = create_user(&store, "tom");
    let mut other = User::get(&store, tom.id()).unwrap();
    other.set_password_hash(&password_hash("changed")).unwrap();

    // The view cached the old hash, but authorization checks the stored one.
    assert_eq!(tom.password_hash().unwrap(), password_hash("tom"));
    let err = tom.authorize(&password_hash("tom"), None).unwrap_err();
    assert!(err.is_credential_mismatch());
    tom.authorize(&password_hash("changed"), None).unwrap();
}

#[test]
fn test_explicit_lifetime_and_config_default() {
    let config = StoreConfig {
        login_session_lifetime_secs: 60,
        ..StoreConfig::default()
    };
    let clock = test_clock();
    let store = test_store_with(config, clock.clone());
    let mut tom = create_user(&store, "tom");

    let mut short = tom.authorize(&password_hash("tom"), None).unwrap();
    let mut long = tom
        .authorize(&password_hash("tom"), Some(Duration::from_secs(3600)))
        .unwrap();

    clock.advance_secs(120);
    assert!(short.is_expired().unwrap());
    assert!(!long.is_expired().unwrap());
    assert_eq!(tom.sessions().unwrap().len(), 2);
}

#[test]
fn test_guest_cannot_authorize() {
    let store = test_store();
    let mut guest = User::guest(&store).unwrap();
    let err = guest.authorize(&"0".repeat(128), None).unwrap_err();
    assert!(err.is_permission_denied());
}
