//! MeowID: compact, time-ordered 64-bit identifiers.
//!
//! A MeowID packs three fields, most significant first:
//!
//! ```text
//! [timestamp:32][sequence:12][salt:20]
//! ```
//!
//! * **timestamp**: whole seconds since the Unix epoch
//! * **sequence count**: per-second counter disambiguating identifiers created in the same second
//! * **salt**: random tiebreaker guarding against collisions across processes and restarts
//!
//! Ordering and equality derive from the packed integer, so identifiers from
//! different seconds always sort by time. Two wire encodings exist: the raw
//! integer and the dash-delimited lowercase hex form `TTTTTTTT-SSS-SALTS`.
//!
//! ```
//! use purrcafe::MeowId;
//!
//! let id = MeowId::new(1_700_000_000, 3, 0xabcde).unwrap();
//! assert_eq!(id.to_string(), "6553f100-003-abcde");
//! assert_eq!("6553f100-003-abcde".parse::<MeowId>().unwrap(), id);
//! assert_eq!(MeowId::from_int(id.to_int()), id);
//! ```

pub mod errors;
pub mod generator;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use errors::MeowIdError;
pub use generator::MeowIdGenerator;

/// Bit offset of the timestamp field.
pub const TIMESTAMP_OFFSET: u32 = 32;
/// Bit offset of the sequence count field.
pub const SEQUENCE_COUNT_OFFSET: u32 = 20;
/// Bit offset of the salt field.
pub const SALT_OFFSET: u32 = 0;

/// Mask selecting the timestamp field.
pub const TIMESTAMP_MASK: u64 = 0xFFFF_FFFF_0000_0000;
/// Mask selecting the sequence count field.
pub const SEQUENCE_COUNT_MASK: u64 = 0x0000_0000_FFF0_0000;
/// Mask selecting the salt field.
pub const SALT_MASK: u64 = 0x0000_0000_000F_FFFF;

/// Largest encodable timestamp.
pub const TIMESTAMP_MAX_VALUE: u64 = (1 << 32) - 1;
/// Largest encodable sequence count.
pub const SEQUENCE_COUNT_MAX_VALUE: u64 = (1 << 12) - 1;
/// Largest encodable salt.
pub const SALT_MAX_VALUE: u64 = (1 << 20) - 1;

/// Hex digits per field in the textual form.
const TEXT_WIDTHS: [usize; 3] = [8, 3, 5];

/// An immutable, time-ordered 64-bit identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MeowId(u64);

impl MeowId {
    /// Builds an identifier from externally supplied components.
    ///
    /// Every component is checked against its bit width; use this for any
    /// value that did not come from a [`MeowIdGenerator`].
    pub fn new(timestamp: i64, sequence_count: u64, salt: u64) -> Result<Self, MeowIdError> {
        if !(0..=TIMESTAMP_MAX_VALUE as i64).contains(&timestamp) {
            return Err(MeowIdError::TimestampOutOfRange {
                max: TIMESTAMP_MAX_VALUE,
                actual: timestamp,
            });
        }
        if sequence_count > SEQUENCE_COUNT_MAX_VALUE {
            return Err(MeowIdError::SequenceOutOfRange {
                max: SEQUENCE_COUNT_MAX_VALUE,
                actual: sequence_count,
            });
        }
        if salt > SALT_MAX_VALUE {
            return Err(MeowIdError::SaltOutOfRange {
                max: SALT_MAX_VALUE,
                actual: salt,
            });
        }

        Ok(Self::from_parts(timestamp as u32, sequence_count as u16, salt as u32))
    }

    /// Packs components without range checks.
    ///
    /// Out-of-width bits of `sequence_count` and `salt` are masked off. Only
    /// trusted callers (the generator, the text parser) use this path.
    pub(crate) const fn from_parts(timestamp: u32, sequence_count: u16, salt: u32) -> Self {
        Self(
            ((timestamp as u64) << TIMESTAMP_OFFSET)
                | (((sequence_count as u64) << SEQUENCE_COUNT_OFFSET) & SEQUENCE_COUNT_MASK)
                | (((salt as u64) << SALT_OFFSET) & SALT_MASK),
        )
    }

    /// Decodes a packed integer. Every 64-bit value is a valid identifier.
    pub const fn from_int(value: u64) -> Self {
        Self(value)
    }

    /// Returns the packed integer form.
    pub const fn to_int(self) -> u64 {
        self.0
    }

    /// Seconds since the Unix epoch at which the identifier was minted.
    pub const fn timestamp(self) -> u32 {
        ((self.0 & TIMESTAMP_MASK) >> TIMESTAMP_OFFSET) as u32
    }

    /// Position of the identifier within its second.
    pub const fn sequence_count(self) -> u16 {
        ((self.0 & SEQUENCE_COUNT_MASK) >> SEQUENCE_COUNT_OFFSET) as u16
    }

    /// Random tiebreaker component.
    pub const fn salt(self) -> u32 {
        ((self.0 & SALT_MASK) >> SALT_OFFSET) as u32
    }

    /// The timestamp component as a UTC date-time.
    pub fn datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.timestamp()), 0).unwrap_or_default()
    }
}

impl fmt::Debug for MeowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeowId")
            .field("timestamp", &self.timestamp())
            .field("sequence_count", &self.sequence_count())
            .field("salt", &self.salt())
            .finish()
    }
}

impl fmt::Display for MeowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:03x}-{:05x}",
            self.timestamp(),
            self.sequence_count(),
            self.salt()
        )
    }
}

impl FromStr for MeowId {
    type Err = MeowIdError;

    /// Parses the `TTTTTTTT-SSS-SALTS` form.
    ///
    /// Each group must have exactly its field width in ASCII hex digits.
    /// Upper-case digits are accepted; [`Display`](fmt::Display) always emits lower case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| MeowIdError::Malformed {
            input: s.to_string(),
            reason,
        };

        let groups: Vec<&str> = s.split('-').collect();
        let [timestamp, sequence_count, salt] = groups[..] else {
            return Err(malformed("expected three dash-separated groups"));
        };

        let mut fields = [0u64; 3];
        for ((field, group), width) in fields
            .iter_mut()
            .zip([timestamp, sequence_count, salt])
            .zip(TEXT_WIDTHS)
        {
            if group.len() != width || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(malformed("groups must be 8, 3 and 5 hex digits"));
            }
            *field = u64::from_str_radix(group, 16)
                .map_err(|_| malformed("groups must be 8, 3 and 5 hex digits"))?;
        }

        // Group widths bound every field to its bit width.
        Ok(Self::from_parts(
            fields[0] as u32,
            fields[1] as u16,
            fields[2] as u32,
        ))
    }
}

impl From<u64> for MeowId {
    fn from(value: u64) -> Self {
        Self::from_int(value)
    }
}

impl From<MeowId> for u64 {
    fn from(id: MeowId) -> Self {
        id.to_int()
    }
}

impl Serialize for MeowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MeowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
