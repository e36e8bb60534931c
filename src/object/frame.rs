// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Length-prefixed framing of signed objects.
//!
//! A signed frame consists of two fields, each preceded by its length
//! encoded as a little-endian `u64`:
//!
//! ```text
//! +------------+--------------+------------+-----------------+
//! | len: u64   | object bytes | 64: u64    | signature bytes |
//! +------------+--------------+------------+-----------------+
//! ```
//!
//! The signature covers the SHA-256 digest of the object bytes.

use std::io::{self, Read, Write};

use log::{debug, trace};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{BINCODE_CONFIG, FramingError, SignedObjectError, UNBOUNDED, decode_object};
use crate::crypto::signature::{
    InvalidSignature, PublicKey, SIGNATURE_SIZE, SecretKey, Signature, sign_hash, verify_hash,
};
use crate::crypto::{Digest, hash};

/// Size of each field's length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// A signed object as it travels on the wire.
///
/// The object bytes are untrusted until [`SignedFrame::verify`] succeeds.
/// [`SignedFrame::into_object`] only decodes after verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedFrame {
    object: Vec<u8>,
    signature: Signature,
}

impl SignedFrame {
    /// Assembles a frame from its raw parts, without any verification.
    #[must_use]
    pub fn new(object: Vec<u8>, signature: Signature) -> Self {
        Self { object, signature }
    }

    /// Encodes `value` with [`bincode`] and signs the digest of the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`bincode::error::EncodeError`] if `value` cannot be encoded.
    pub fn sign<T: Serialize + ?Sized>(
        value: &T,
        sk: &SecretKey,
    ) -> Result<Self, bincode::error::EncodeError> {
        let object = bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?;
        let signature = sign_hash(&hash(&object), sk);
        Ok(Self { object, signature })
    }

    /// Returns the encoded object bytes, which may not be authentic.
    #[must_use]
    pub fn object_bytes(&self) -> &[u8] {
        &self.object
    }

    /// Returns the signature carried by this frame.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the digest the signature is supposed to cover.
    #[must_use]
    pub fn digest(&self) -> Digest {
        hash(&self.object)
    }

    /// Returns the number of bytes this frame occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        2 * LENGTH_PREFIX_SIZE + self.object.len() + SIGNATURE_SIZE
    }

    /// Checks the signature against the object bytes and `pk`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSignature`] if the frame was not signed by `pk`.
    pub fn verify(&self, pk: &PublicKey) -> Result<(), InvalidSignature> {
        verify_hash(&self.digest(), pk, &self.signature)
    }

    /// Verifies this frame under `pk` and only then decodes the object.
    ///
    /// # Errors
    ///
    /// - [`SignedObjectError::InvalidSignature`] if verification fails,
    ///   the object bytes are not touched in that case
    /// - [`SignedObjectError::Decode`] if the authentic bytes do not decode into `T`
    pub fn into_object<T: DeserializeOwned>(
        self,
        pk: &PublicKey,
    ) -> Result<T, SignedObjectError> {
        if let Err(err) = self.verify(pk) {
            debug!(
                "rejected signed frame ({} object bytes) for {pk}",
                self.object.len()
            );
            return Err(err.into());
        }
        Ok(decode_object(&self.object)?)
    }

    /// Writes this frame to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error `writer` reports.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&(self.object.len() as u64).to_le_bytes())?;
        writer.write_all(&self.object)?;
        writer.write_all(&(SIGNATURE_SIZE as u64).to_le_bytes())?;
        writer.write_all(&self.signature.to_bytes())?;
        trace!("wrote signed frame ({} object bytes)", self.object.len());
        Ok(())
    }

    /// Reads a frame from `reader`, without verifying it.
    ///
    /// The declared object length is checked against `max_len` before any
    /// object bytes are read. Memory is only allocated for bytes that were
    /// actually received.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError`] if the stream is malformed or truncated,
    /// or if the object is longer than `max_len`.
    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        max_len: u64,
    ) -> Result<Self, FramingError> {
        let len = read_length(reader)?;
        check_object_len(len, max_len)?;
        let mut object = Vec::new();
        (&mut *reader).take(len).read_to_end(&mut object)?;
        if object.len() as u64 != len {
            return Err(FramingError::Truncated);
        }

        check_signature_len(read_length(reader)?)?;
        let mut sig = [0u8; SIGNATURE_SIZE];
        reader.read_exact(&mut sig)?;

        trace!("read signed frame ({len} object bytes)");
        Ok(Self::new(object, Signature::from_bytes(sig)))
    }

    /// Serializes this frame into owned bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&(self.object.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&self.object);
        bytes.extend_from_slice(&(SIGNATURE_SIZE as u64).to_le_bytes());
        bytes.extend_from_slice(&self.signature.to_bytes());
        bytes
    }

    /// Parses the frame at the start of `data`, without verifying it.
    ///
    /// Bytes after the frame are ignored, exactly as when reading one frame
    /// from a stream with [`SignedFrame::read_from`].
    ///
    /// # Errors
    ///
    /// Returns [`FramingError`] if `data` is malformed or truncated.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FramingError> {
        let mut reader = data;
        Self::read_from(&mut reader, UNBOUNDED)
    }

    /// Parses a frame that occupies all of `data`, without verifying it.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError`] if `data` is malformed, truncated,
    /// or has bytes left over after the frame.
    pub fn from_bytes_exact(data: &[u8]) -> Result<Self, FramingError> {
        let mut reader = data;
        let frame = Self::read_from(&mut reader, UNBOUNDED)?;
        if !reader.is_empty() {
            return Err(FramingError::TrailingBytes(reader.len()));
        }
        Ok(frame)
    }
}

fn read_length<R: Read + ?Sized>(reader: &mut R) -> Result<u64, FramingError> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix)?;
    Ok(u64::from_le_bytes(prefix))
}

pub(super) fn check_object_len(len: u64, max: u64) -> Result<(), FramingError> {
    if len > max {
        debug!("rejected signed frame: object length {len} exceeds {max}");
        return Err(FramingError::ObjectTooLong { len, max });
    }
    Ok(())
}

pub(super) fn check_signature_len(len: u64) -> Result<(), FramingError> {
    if len != SIGNATURE_SIZE as u64 {
        return Err(FramingError::BadSignatureLength(len));
    }
    Ok(())
}
