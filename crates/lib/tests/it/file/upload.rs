//! Upload validation, quotas and metadata.

use purrcafe::{
    File, FileUpload, Lifetime, StoreConfig, User, constants::ADMIN_ID, hash::data_hash,
};

use crate::helpers::{admin_config, create_user, test_clock, test_store, test_store_with};

#[test]
fn test_upload_and_get() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let upload = FileUpload::hashed(b"purr".to_vec())
        .with_filename("purr.txt")
        .with_mime_type("text/plain");
    let id = File::create(&store, &tom, upload).unwrap().id();

    let mut file = File::get(&store, id).unwrap();
    assert_eq!(file.uploader_id().unwrap(), tom.id());
    assert!(!file.uploader_hidden().unwrap());
    assert_eq!(file.filename().unwrap(), Some("purr.txt"));
    assert_eq!(file.mime_type().unwrap(), "text/plain");
    assert_eq!(file.data_hash().unwrap(), data_hash(b"purr"));
    assert_eq!(file.max_access_count().unwrap(), None);
    assert_eq!(file.access_count().unwrap(), 0);
    assert_eq!(file.meta_access_count().unwrap(), 0);
    assert!(file.expiration_time().unwrap().is_some());
}

#[test]
fn test_data_hash_width() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let err = File::create(&store, &tom, FileUpload::new(vec![1], "a".repeat(31))).unwrap_err();
    assert!(err.is_hash_length_error());
    assert_eq!(err.module(), "file");
    File::create(&store, &tom, FileUpload::new(vec![1], "a".repeat(32))).unwrap();

    let mut file = File::create(&store, &tom, FileUpload::hashed(vec![2])).unwrap();
    assert!(file.set_data_hash("abc").unwrap_err().is_hash_length_error());
    file.set_data_hash(&"b".repeat(32)).unwrap();
    assert_eq!(file.data_hash().unwrap(), "b".repeat(32));
}

#[test]
fn test_size_quotas() {
    let config = StoreConfig {
        guest_max_file_size: 16,
        max_file_size: 32,
        ..admin_config()
    };
    let store = test_store_with(config, test_clock());
    let guest = User::guest(&store).unwrap();
    let tom = create_user(&store, "tom");
    let admin = User::get(&store, ADMIN_ID).unwrap();

    File::create(&store, &guest, FileUpload::hashed(vec![0; 16])).unwrap();
    let err = File::create(&store, &guest, FileUpload::hashed(vec![0; 17])).unwrap_err();
    assert!(err.is_size_limit_error());

    File::create(&store, &tom, FileUpload::hashed(vec![0; 32])).unwrap();
    let err = File::create(&store, &tom, FileUpload::hashed(vec![0; 33])).unwrap_err();
    assert!(err.is_size_limit_error());

    File::create(&store, &admin, FileUpload::hashed(vec![0; 1024])).unwrap();
}

#[test]
fn test_lifetimes() {
    let clock = test_clock();
    let store = test_store_with(StoreConfig::default(), clock.clone());
    let tom = create_user(&store, "tom");

    let mut never = File::create(
        &store,
        &tom,
        FileUpload::hashed(vec![1]).with_lifetime(Lifetime::Never),
    )
    .unwrap();
    let mut week = File::create(&store, &tom, FileUpload::hashed(vec![1])).unwrap();

    clock.advance_secs(8 * 24 * 60 * 60);
    assert!(!never.is_expired().unwrap());
    assert!(week.is_expired().unwrap());

    // Expired files stay readable; purging them is someone else's job.
    assert_eq!(week.read().unwrap().data, vec![1]);
}

#[test]
fn test_setters_write_through() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(&store, &tom, FileUpload::hashed(vec![1])).unwrap();

    file.set_filename(Some("cat.png")).unwrap();
    file.set_mime_type("image/png").unwrap();
    file.set_uploader_hidden(true).unwrap();
    file.set_expiration_time(None).unwrap();
    file.set_max_access_count(Some(3)).unwrap();
    file.set_data(vec![7; 4]).unwrap();

    let mut fresh = File::get(&store, file.id()).unwrap();
    assert_eq!(fresh.filename().unwrap(), Some("cat.png"));
    assert_eq!(fresh.mime_type().unwrap(), "image/png");
    assert!(fresh.uploader_hidden().unwrap());
    assert_eq!(fresh.expiration_time().unwrap(), None);
    assert_eq!(fresh.max_access_count().unwrap(), Some(3));
    assert_eq!(fresh.read().unwrap().data, vec![7; 4]);

    file.set_filename(None).unwrap();
    assert_eq!(file.filename().unwrap(), None);
}

#[test]
fn test_metadata_hides_uploader_on_request() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let mut file = File::create(
        &store,
        &tom,
        FileUpload::hashed(b"anon".to_vec())
            .hidden(true)
            .with_filename("a.bin"),
    )
    .unwrap();

    let meta = file.meta().unwrap();
    assert_eq!(meta.uploader_id, None);
    assert_eq!(meta.filename.as_deref(), Some("a.bin"));
    assert_eq!(meta.size, 4);

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["uploader_id"], serde_json::Value::Null);
    assert_eq!(json["id"], serde_json::Value::from(file.id().to_string()));
}

#[test]
fn test_listing_by_uploader() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let jerry = create_user(&store, "jerry");
    for _ in 0..3 {
        File::create(&store, &tom, FileUpload::hashed(vec![1])).unwrap();
    }
    File::create(&store, &jerry, FileUpload::hashed(vec![1])).unwrap();

    assert_eq!(File::get_uploaded_by(&store, tom.id()).unwrap().len(), 3);
    assert_eq!(tom.files().unwrap().len(), 3);
    assert_eq!(File::get_all(&store).unwrap().len(), 4);
}
