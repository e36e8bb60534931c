// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signed objects.
//!
//! This module binds together encoding, hashing and signing of arbitrary
//! serializable values. The writer encodes a value with [`bincode`], hashes
//! the encoding, signs the digest and emits a [`SignedFrame`].
//! The reader splits the frame into object bytes and signature, verifies the
//! signature and only then decodes the object bytes into a typed value.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use signed_object::crypto::signature::generate_key_pair_deterministic;
//! use signed_object::object::{sign_object, verify_object};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Greeting {
//!     id: u64,
//!     text: String,
//! }
//!
//! let (sk, pk) = generate_key_pair_deterministic([0; 32]);
//! let greeting = Greeting { id: 1, text: "hello".into() };
//! let bytes = sign_object(&greeting, &sk).unwrap();
//! let verified: Greeting = verify_object(&bytes, &pk).unwrap();
//! assert_eq!(verified, greeting);
//! ```

mod frame;
mod stream;

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use self::frame::{LENGTH_PREFIX_SIZE, SignedFrame};
pub use self::stream::{read_signed_object_async, write_signed_object_async};
use crate::crypto::signature::{InvalidSignature, PublicKey, SecretKey};

/// Encoding used for signed object payloads.
pub const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Maximum object length that places no limit at all.
pub const UNBOUNDED: u64 = u64::MAX;

/// Error type for reading signed frames off the wire.
///
/// These are all detected before any cryptographic check is attempted.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("signed frame is truncated")]
    Truncated,
    #[error("object length {len} exceeds maximum of {max}")]
    ObjectTooLong { len: u64, max: u64 },
    #[error("expected 64-byte signature, got length prefix {0}")]
    BadSignatureLength(u64),
    #[error("{0} trailing bytes after signed frame")]
    TrailingBytes(usize),
    #[error("failed to read signed frame")]
    Io(#[source] io::Error),
}

impl From<io::Error> for FramingError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(err)
        }
    }
}

/// Error type for decoding an authentic object into its target type.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("bincode decoding failed")]
    Bincode(#[from] bincode::error::DecodeError),
    #[error("{0} trailing bytes after decoded object")]
    TrailingBytes(usize),
}

/// Error type for signed object operations.
///
/// [`SignedObjectError::InvalidSignature`] means "not authentic",
/// while [`SignedObjectError::Decode`] means "authentic but malformed".
#[derive(Debug, Error)]
pub enum SignedObjectError {
    #[error("malformed signed frame")]
    Framing(#[from] FramingError),
    #[error(transparent)]
    InvalidSignature(#[from] InvalidSignature),
    #[error("signed object could not be decoded")]
    Decode(#[from] DecodeError),
    #[error("object could not be encoded")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to write signed frame")]
    Write(#[source] io::Error),
}

/// Encodes `value`, signs it with `sk` and writes the frame to `writer`.
///
/// # Errors
///
/// - [`SignedObjectError::Encode`] if `value` cannot be encoded
/// - [`SignedObjectError::Write`] if `writer` fails
pub fn write_signed_object<W, T>(
    writer: &mut W,
    value: &T,
    sk: &SecretKey,
) -> Result<(), SignedObjectError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    let frame = SignedFrame::sign(value, sk)?;
    frame.write_to(writer).map_err(SignedObjectError::Write)
}

/// Reads a frame from `reader`, verifies it under `pk` and decodes it.
///
/// Objects longer than `max_len` bytes are rejected before they are read.
///
/// Decoding is strict: `T` must consume the authentic object bytes entirely.
/// Leftover object bytes fail with [`DecodeError::TrailingBytes`] instead of
/// being ignored, so every accepted payload has exactly one encoding.
///
/// # Errors
///
/// - [`SignedObjectError::Framing`] if the frame is malformed or too long
/// - [`SignedObjectError::InvalidSignature`] if it was not signed by `pk`
/// - [`SignedObjectError::Decode`] if the object does not decode into `T`
pub fn read_signed_object<T, R>(
    reader: &mut R,
    max_len: u64,
    pk: &PublicKey,
) -> Result<T, SignedObjectError>
where
    T: DeserializeOwned,
    R: Read + ?Sized,
{
    SignedFrame::read_from(reader, max_len)?.into_object(pk)
}

/// Encodes and signs `value`, returning the frame as bytes.
///
/// # Errors
///
/// Returns [`SignedObjectError::Encode`] if `value` cannot be encoded.
pub fn sign_object<T: Serialize + ?Sized>(
    value: &T,
    sk: &SecretKey,
) -> Result<Vec<u8>, SignedObjectError> {
    Ok(SignedFrame::sign(value, sk)?.to_bytes())
}

/// Verifies the frame in `data` under `pk` and decodes it.
///
/// The object length is not limited, since `data` is already in memory.
/// Bytes after the first frame are ignored, just like [`read_signed_object`]
/// leaves them in the stream.
/// Use [`SignedFrame::from_bytes_exact`] to reject them.
///
/// Decoding of the object is as strict as in [`read_signed_object`].
///
/// # Errors
///
/// See [`read_signed_object`].
pub fn verify_object<T: DeserializeOwned>(
    data: &[u8],
    pk: &PublicKey,
) -> Result<T, SignedObjectError> {
    SignedFrame::from_bytes(data)?.into_object(pk)
}

fn decode_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let (value, read) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    if read != bytes.len() {
        return Err(DecodeError::TrailingBytes(bytes.len() - read));
    }
    Ok(value)
}
