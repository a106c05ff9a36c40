//! Identifier codecs and the generator service.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use purrcafe::{Clock, FixedClock, MeowId, MeowIdGenerator};

#[test]
fn test_text_form_of_known_id() {
    let id = MeowId::new(0x6553_f100, 0xabc, 0x12345).unwrap();
    assert_eq!(id.to_string(), "6553f100-abc-12345");
    assert_eq!(id.to_int(), 0x6553_f100_abc1_2345);
    assert_eq!("6553F100-ABC-12345".parse::<MeowId>().unwrap(), id);
}

#[test]
fn test_parse_errors() {
    for text in ["", "6553f100abc12345", "6553f100-abc-1234", "6553f10g-abc-12345"] {
        let err: purrcafe::Error = text.parse::<MeowId>().unwrap_err().into();
        assert!(err.is_parse_error(), "{text:?} should not parse");
        assert_eq!(err.module(), "meowid");
    }
}

#[test]
fn test_range_errors() {
    let err: purrcafe::Error = MeowId::new(1 << 32, 0, 0).unwrap_err().into();
    assert!(err.is_range_error());
    let err: purrcafe::Error = MeowId::new(-1, 0, 0).unwrap_err().into();
    assert!(err.is_range_error());
    let err: purrcafe::Error = MeowId::new(0, 4096, 0).unwrap_err().into();
    assert!(err.is_range_error());
    let err: purrcafe::Error = MeowId::new(0, 0, 1 << 20).unwrap_err().into();
    assert!(err.is_range_error());
}

#[test]
fn test_generated_ids_carry_clock_time() {
    let clock = Arc::new(FixedClock::at_secs(1_700_000_000));
    let generator = MeowIdGenerator::new(clock.clone());
    let _hold = clock.hold();

    let first = generator.generate().unwrap();
    let second = generator.generate().unwrap();
    assert_eq!(first.timestamp(), 1_700_000_000);
    assert_eq!(first.sequence_count(), 0);
    assert_eq!(second.sequence_count(), 1);
    assert!(first < second);
}

#[test]
fn test_generator_exhausts_after_4096_ids_per_second() {
    let clock = Arc::new(FixedClock::at_secs(1_700_000_000));
    let generator = MeowIdGenerator::new(clock.clone());

    {
        let _hold = clock.hold();
        let ids: HashSet<MeowId> = (0..4096).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(ids.len(), 4096);
        assert!(ids.iter().all(|id| id.timestamp() == 1_700_000_000));

        let err: purrcafe::Error = generator.generate().unwrap_err().into();
        assert!(err.is_exhausted());
    }

    // The next second starts a fresh sequence.
    clock.advance_secs(1);
    let _hold = clock.hold();
    let id = generator.generate().unwrap();
    assert_eq!(id.timestamp(), 1_700_000_001);
    assert_eq!(id.sequence_count(), 0);
}

#[test]
fn test_concurrent_generation_is_unique() {
    let clock = Arc::new(FixedClock::at_secs(1_700_000_000));
    let generator = Arc::new(MeowIdGenerator::new(clock.clone()));
    let _hold = clock.hold();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = generator.clone();
            thread::spawn(move || {
                (0..500)
                    .map(|_| generator.generate().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), 4000);
    let sequences: HashSet<u16> = seen.iter().map(|id| id.sequence_count()).collect();
    assert_eq!(sequences.len(), 4000);
}

#[test]
fn test_datetime_matches_timestamp() {
    let clock = FixedClock::at_secs(1_704_067_200);
    let id = MeowId::new(clock.now_secs(), 0, 0).unwrap();
    assert_eq!(id.datetime().timestamp(), 1_704_067_200);
}

#[test]
fn test_serde_round_trips_through_text() {
    let id = MeowId::new(1_700_000_000, 7, 99).unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    assert_eq!(serde_json::from_str::<MeowId>(&json).unwrap(), id);
}
