//! Download counting, quota-driven deletion and delete permissions.

use purrcafe::{File, FileUpload, User, constants::ADMIN_ID};

use crate::helpers::{admin_config, create_user, test_clock, test_store, test_store_with};

#[test]
fn test_single_use_file_disappears_after_first_read() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(
        &store,
        &tom,
        FileUpload::hashed(b"one time".to_vec()).with_max_access_count(1),
    )
    .unwrap();

    let content = file.read().unwrap();
    assert_eq!(content.data, b"one time");
    assert_eq!(content.remaining_downloads, Some(0));

    let err = File::get(&store, file.id()).unwrap_err();
    assert!(err.is_not_found());
    assert!(file.read().unwrap_err().is_not_found());
    assert!(tom.files().unwrap().is_empty());
}

#[test]
fn test_quota_counts_downloads_only() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(
        &store,
        &tom,
        FileUpload::hashed(b"meow".to_vec()).with_max_access_count(3),
    )
    .unwrap();

    for expected in 1..=5 {
        assert_eq!(file.meta().unwrap().meta_access_count, expected);
    }
    assert_eq!(file.read().unwrap().remaining_downloads, Some(2));
    assert_eq!(file.read().unwrap().remaining_downloads, Some(1));

    let meta = file.meta().unwrap();
    assert_eq!(meta.access_count, 2);
    assert_eq!(meta.max_access_count, Some(3));

    assert_eq!(file.read().unwrap().remaining_downloads, Some(0));
    assert!(file.meta().unwrap_err().is_not_found());
}

#[test]
fn test_unlimited_file_counts_every_download() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(&store, &tom, FileUpload::hashed(vec![5])).unwrap();
    for _ in 0..10 {
        let content = file.read().unwrap();
        assert_eq!(content.remaining_downloads, None);
    }
    assert_eq!(file.access_count().unwrap(), 10);
}

#[test]
fn test_read_returns_content_fields() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(
        &store,
        &tom,
        FileUpload::hashed(b"<svg/>".to_vec())
            .with_filename("cat.svg")
            .with_mime_type("image/svg+xml"),
    )
    .unwrap();
    let content = file.read().unwrap();
    assert_eq!(content.filename.as_deref(), Some("cat.svg"));
    assert_eq!(content.mime_type, "image/svg+xml");
    assert_eq!(content.data_hash, purrcafe::hash::data_hash(b"<svg/>"));
}

#[test]
fn test_delete_permissions() {
    let store = test_store_with(admin_config(), test_clock());
    let guest = User::guest(&store).unwrap();
    let tom = create_user(&store, "tom");
    let jerry = create_user(&store, "jerry");
    let admin = User::get(&store, ADMIN_ID).unwrap();

    let guest_upload = File::create(&store, &guest, FileUpload::hashed(vec![1])).unwrap();
    let err = guest_upload.clone().delete().unwrap_err();
    assert!(err.is_permission_denied());
    let err = guest_upload.clone().delete_by(&guest).unwrap_err();
    assert!(err.is_permission_denied());

    let toms = File::create(&store, &tom, FileUpload::hashed(vec![2])).unwrap();
    let err = toms.clone().delete_by(&jerry).unwrap_err();
    assert!(err.is_permission_denied());

    toms.delete_by(&tom).unwrap();
    guest_upload.delete_by(&admin).unwrap();
    assert!(File::get_all(&store).unwrap().is_empty());
}

#[test]
fn test_admin_may_delete_any_upload() {
    let store = test_store_with(admin_config(), test_clock());
    let tom = create_user(&store, "tom");
    let admin = User::get(&store, ADMIN_ID).unwrap();
    let id = File::create(&store, &tom, FileUpload::hashed(vec![3]))
        .unwrap()
        .id();

    File::get(&store, id).unwrap().delete_by(&admin).unwrap();
    assert!(File::get(&store, id).unwrap_err().is_not_found());
}
