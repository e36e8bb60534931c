// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic primitives.
//!
//! This module contains the cryptographic primitives signed objects are built on.
//! These are mostly wrappers around existing libraries.

pub mod hash;
pub mod signature;

pub use self::hash::{DIGEST_SIZE, Digest, hash, hash_all};
pub use self::signature::{
    EntropyError, InvalidSignature, KeyError, PublicKey, SecretKey, Signature,
    generate_key_pair, generate_key_pair_deterministic, sign_hash, verify_hash,
};
