//! Sessions and their expiry.

use std::time::Duration;

use chrono::TimeDelta;
use purrcafe::{MeowId, Session, StoreConfig};

use crate::helpers::{create_user, test_clock, test_store, test_store_with};

#[test]
fn test_session_without_lifetime_never_expires() {
    let clock = test_clock();
    let store = test_store_with(StoreConfig::default(), clock.clone());
    let tom = create_user(&store, "tom");

    let mut session = Session::create(&store, &tom, None).unwrap();
    assert_eq!(session.expiration_time().unwrap(), None);
    clock.advance_secs(100 * 365 * 24 * 60 * 60);
    assert!(!session.is_expired().unwrap());
}

#[test]
fn test_default_session_lifetime_is_thirty_days() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut session = Session::create_default(&store, &tom).unwrap();
    let lifetime = session.expiration_time().unwrap().unwrap() - session.creation_time().unwrap();
    assert!(lifetime >= TimeDelta::days(30));
}

#[test]
fn test_expiry_is_declarative() {
    let clock = test_clock();
    let store = test_store_with(StoreConfig::default(), clock.clone());
    let tom = create_user(&store, "tom");
    let id = Session::create(&store, &tom, Some(Duration::from_secs(10)))
        .unwrap()
        .id();

    clock.advance_secs(3600);
    let mut session = Session::get(&store, id).unwrap();
    assert!(session.is_expired().unwrap());
    // Nothing purges expired sessions.
    assert_eq!(tom.sessions().unwrap().len(), 1);
}

#[test]
fn test_owner_resolves_to_user() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut session = Session::create(&store, &tom, None).unwrap();
    let mut owner = session.owner().unwrap();
    assert_eq!(owner.id(), tom.id());
    assert_eq!(owner.name().unwrap(), "tom");
}

#[test]
fn test_token_round_trips_through_text() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let token = Session::create(&store, &tom, None).unwrap().id().to_string();

    let id: MeowId = token.parse().unwrap();
    let mut session = Session::get(&store, id).unwrap();
    assert_eq!(session.owner_id().unwrap(), tom.id());
}

#[test]
fn test_set_expiration_and_delete() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut session = Session::create(&store, &tom, None).unwrap();

    let at = store.now() - TimeDelta::seconds(1);
    session.set_expiration_time(Some(at)).unwrap();
    assert_eq!(session.expiration_time().unwrap(), Some(at));
    assert!(session.is_expired().unwrap());

    let id = session.id();
    session.delete().unwrap();
    assert!(Session::get(&store, id).unwrap_err().is_not_found());
    assert!(tom.sessions().unwrap().is_empty());
}

#[test]
fn test_guest_session_is_immutable() {
    let store = test_store();
    let mut guest = Session::guest(&store).unwrap();
    let err = guest.set_expiration_time(None).unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(err.module(), "store");
}
