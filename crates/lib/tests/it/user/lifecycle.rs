//! Creating, updating and deleting users.

use purrcafe::{File, FileUpload, Session, User, hash::password_hash};

use crate::helpers::{create_user, test_store};

#[test]
fn test_create_and_get() {
    let store = test_store();
    let tom = create_user(&store, "tom");

    let mut fetched = User::get(&store, tom.id()).unwrap();
    assert_eq!(fetched.name().unwrap(), "tom");
    assert_eq!(fetched.email().unwrap(), "tom@purr.cafe");
    assert_eq!(fetched.password_hash().unwrap(), password_hash("tom"));
    assert_eq!(
        fetched.creation_time().unwrap().timestamp(),
        i64::from(tom.id().timestamp())
    );
}

#[test]
fn test_validation() {
    let store = test_store();
    let err = User::create(&store, &"a".repeat(33), "", &password_hash("x")).unwrap_err();
    assert!(err.is_length_error());
    assert_eq!(err.module(), "user");

    let err = User::create(&store, "tom", "", "short").unwrap_err();
    assert!(err.is_hash_length_error());

    create_user(&store, "tom");
    let err = User::create(&store, "tom", "", &password_hash("x")).unwrap_err();
    assert!(err.is_conflict());

    // Nothing was written by the failed attempts.
    assert_eq!(User::get_all(&store).unwrap().len(), 2);
}

#[test]
fn test_find_by_name() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    assert_eq!(User::find(&store, "tom").unwrap().id(), tom.id());
    assert!(User::find(&store, "jerry").unwrap_err().is_not_found());
}

#[test]
fn test_setters_invalidate_instead_of_caching() {
    let store = test_store();
    let mut tom = create_user(&store, "tom");
    let mut stale = User::get(&store, tom.id()).unwrap();

    tom.set_name("thomas").unwrap();
    tom.set_email("thomas@purr.cafe").unwrap();
    tom.set_password_hash(&password_hash("new")).unwrap();
    assert_eq!(tom.name().unwrap(), "thomas");
    assert_eq!(tom.email().unwrap(), "thomas@purr.cafe");

    // Other views keep what they loaded until re-fetched.
    assert_eq!(stale.name().unwrap(), "tom");
    let mut fresh = User::get(&store, tom.id()).unwrap();
    assert_eq!(fresh.name().unwrap(), "thomas");
    assert_eq!(fresh.password_hash().unwrap(), password_hash("new"));

    assert!(tom.set_name(&"x".repeat(40)).unwrap_err().is_length_error());
    assert!(tom.set_password_hash("0").unwrap_err().is_hash_length_error());
}

#[test]
fn test_delete_cascades_to_sessions_and_files() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let jerry = create_user(&store, "jerry");

    let sessions: Vec<_> = (0..3)
        .map(|_| Session::create_default(&store, &tom).unwrap().id())
        .collect();
    let files: Vec<_> = (0..2)
        .map(|i| {
            File::create(&store, &tom, FileUpload::hashed(vec![i; 8]))
                .unwrap()
                .id()
        })
        .collect();
    let jerrys_file = File::create(&store, &jerry, FileUpload::hashed(vec![9]))
        .unwrap()
        .id();

    let tom_id = tom.id();
    tom.delete().unwrap();

    assert!(User::get(&store, tom_id).unwrap_err().is_not_found());
    for id in sessions {
        assert!(Session::get(&store, id).unwrap_err().is_not_found());
    }
    for id in files {
        assert!(File::get(&store, id).unwrap_err().is_not_found());
    }
    assert!(File::get(&store, jerrys_file).is_ok());
    assert_eq!(jerry.files().unwrap().len(), 1);
}

#[test]
fn test_delete_of_deleted_user_is_not_found() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let copy = tom.clone();
    tom.delete().unwrap();
    assert!(copy.delete().unwrap_err().is_not_found());
}
