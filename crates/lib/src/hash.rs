//! Fixed-width hash helpers.
//!
//! The store never hashes anything itself; it only checks widths. These
//! helpers produce values of the widths it expects, for clients and tests.

use sha2::{Digest, Sha512};

use crate::constants::DATA_HASH_LENGTH;

/// Hex-encoded SHA-512 of a plaintext password: always 128 characters.
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha512::digest(password.as_bytes()))
}

/// Hex-encoded, truncated BLAKE3 digest of a payload: always 32 characters.
pub fn data_hash(data: &[u8]) -> String {
    let digest = blake3::hash(data);
    hex::encode(&digest.as_bytes()[..DATA_HASH_LENGTH / 2])
}
