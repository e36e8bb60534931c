// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic hash function.
//!
//! Signatures are never computed over raw object bytes.
//! Instead, objects are first compressed into a fixed-size [`Digest`],
//! which keeps signing cost independent of object size.
//! Currently, SHA-256 is used.

use sha2::{Digest as _, Sha256};

/// Size of a [`Digest`] in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Digest of an arbitrary byte string, the input to signing.
///
/// This provides 256-bit resistance against (second) preimage attacks
/// and 128-bit resistance against collision attacks.
pub type Digest = [u8; DIGEST_SIZE];

/// Hashes the given data using SHA-256.
#[must_use]
pub fn hash(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hashes all the given data slices together using SHA-256.
///
/// This is equivalent to hashing the concatenation of all slices.
#[must_use]
pub fn hash_all(data: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for item in data {
        hasher.update(item);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // SHA-256("test")
        let expected = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        assert_eq!(hex::encode(hash(b"test")), expected);
    }

    #[test]
    fn hash_all_matches_concatenation() {
        let parts: [&[u8]; 3] = [b"signed", b"-", b"object"];
        assert_eq!(hash_all(&parts), hash(b"signed-object"));
        assert_eq!(hash_all(&[]), hash(b""));
    }
}
