//! Concurrent use of one store from several threads.

use std::collections::HashSet;
use std::thread;

use purrcafe::{File, FileUpload, User};

use crate::helpers::{create_user, test_store};

#[test]
fn test_concurrent_creates_get_distinct_ids() {
    let store = test_store();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|i| create_user(&store, &format!("cat{t}-{i}")).id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 100);
    // Plus the guest.
    assert_eq!(User::get_all(&store).unwrap().len(), 101);
}

#[test]
fn test_concurrent_name_claims_admit_one_winner() {
    let store = test_store();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                User::create(&store, "tom", "", &purrcafe::hash::password_hash("x")).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_concurrent_downloads_may_lose_increments() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let id = File::create(&store, &tom, FileUpload::hashed(b"meow".to_vec()))
        .unwrap()
        .id();

    const READERS: u64 = 16;
    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let mut file = File::get(&store, id).unwrap();
                file.read().unwrap().data
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), b"meow");
    }

    // Read and increment are separate critical sections, so the counter can
    // lag behind the number of downloads but never overshoot it.
    let count = File::get(&store, id).unwrap().access_count().unwrap();
    assert!((1..=READERS).contains(&count), "count was {count}");
}

#[test]
fn test_single_use_file_is_served_at_least_once_under_contention() {
    let store = test_store();
    let tom = create_user(&store, "tom");
    let id = File::create(
        &store,
        &tom,
        FileUpload::hashed(b"secret".to_vec()).with_max_access_count(1),
    )
    .unwrap()
    .id();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || File::get(&store, id).and_then(|mut f| f.read()).is_ok())
        })
        .collect();
    let served = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert!(served >= 1);
    assert!(File::get(&store, id).unwrap_err().is_not_found());
}
