//! Process-wide MeowID generation.
//!
//! [`MeowIdGenerator`] is an explicitly constructed service: build one at
//! process start, share it (usually behind an `Arc`, as [`Store`](crate::Store)
//! does) and keep it alive for the lifetime of the process. Two generators in
//! one process would each restart the sequence count and only the salt would
//! keep their identifiers apart.

use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use tracing::warn;

use super::{MeowId, MeowIdError, SALT_MAX_VALUE, SEQUENCE_COUNT_MAX_VALUE, TIMESTAMP_MAX_VALUE};
use crate::clock::{Clock, SystemClock};

/// Per-second sequence bookkeeping.
#[derive(Debug, Default)]
struct SequenceState {
    last_timestamp: Option<u32>,
    sequence_count: u64,
}

/// Mints unique, time-ordered [`MeowId`]s.
///
/// `generate` is serialized on an internal mutex so the sequence count
/// strictly increases within a second even under concurrent callers. The
/// mutex is independent of any storage lock.
#[derive(Debug)]
pub struct MeowIdGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<SequenceState>,
}

impl MeowIdGenerator {
    /// Create a generator reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(SequenceState::default()),
        }
    }

    /// The time source used for timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Mint a new identifier.
    ///
    /// Fails with [`MeowIdError::Exhausted`] once 4096 identifiers have been
    /// handed out in the current second; the failure repeats until the clock
    /// moves on. A clock that steps backwards keeps using the last observed
    /// second so timestamps never decrease, and stays exhausted until the
    /// clock passes that second again.
    pub fn generate(&self) -> Result<MeowId, MeowIdError> {
        let now = self.clock.now_secs();
        if !(0..=TIMESTAMP_MAX_VALUE as i64).contains(&now) {
            return Err(MeowIdError::TimestampOutOfRange {
                max: TIMESTAMP_MAX_VALUE,
                actual: now,
            });
        }
        let now = now as u32;

        let (timestamp, sequence_count) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let timestamp = match state.last_timestamp {
                Some(last) if last >= now => {
                    if last > now {
                        warn!(
                            last,
                            now,
                            "Clock moved backwards; staying on the last MeowID second"
                        );
                    }
                    if state.sequence_count >= SEQUENCE_COUNT_MAX_VALUE {
                        warn!(timestamp = last, "MeowID sequence exhausted for this second");
                        return Err(MeowIdError::Exhausted { timestamp: last });
                    }
                    state.sequence_count += 1;
                    last
                }
                _ => {
                    state.last_timestamp = Some(now);
                    state.sequence_count = 0;
                    now
                }
            };
            (timestamp, state.sequence_count)
        };

        let salt = rand::thread_rng().gen_range(0..=SALT_MAX_VALUE);

        Ok(MeowId::from_parts(
            timestamp,
            sequence_count as u16,
            salt as u32,
        ))
    }

    /// An endless iterator of freshly generated identifiers.
    ///
    /// Combine with [`Iterator::take`] for a bounded batch.
    pub fn ids(&self) -> Ids<'_> {
        Ids { generator: self }
    }
}

impl Default for MeowIdGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Iterator returned by [`MeowIdGenerator::ids`].
#[derive(Debug)]
pub struct Ids<'a> {
    generator: &'a MeowIdGenerator,
}

impl Iterator for Ids<'_> {
    type Item = Result<MeowId, MeowIdError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generator.generate())
    }
}
