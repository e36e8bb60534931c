// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signed objects over asynchronous [`tokio`] streams.
//!
//! The wire format is the same as for the blocking [`std::io`] forms.

use std::io;

use log::trace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::frame::{check_object_len, check_signature_len};
use super::{FramingError, SignedFrame, SignedObjectError};
use crate::crypto::signature::{PublicKey, SIGNATURE_SIZE, SecretKey, Signature};

impl SignedFrame {
    /// Reads a frame from the asynchronous `reader`, without verifying it.
    ///
    /// Behaves exactly like [`SignedFrame::read_from`].
    ///
    /// # Errors
    ///
    /// Returns [`FramingError`] if the stream is malformed or truncated,
    /// or if the object is longer than `max_len`.
    pub async fn read_from_async<R>(reader: &mut R, max_len: u64) -> Result<Self, FramingError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let len = reader.read_u64_le().await?;
        check_object_len(len, max_len)?;
        let mut object = Vec::new();
        (&mut *reader).take(len).read_to_end(&mut object).await?;
        if object.len() as u64 != len {
            return Err(FramingError::Truncated);
        }

        check_signature_len(reader.read_u64_le().await?)?;
        let mut sig = [0u8; SIGNATURE_SIZE];
        reader.read_exact(&mut sig).await?;

        trace!("read signed frame ({len} object bytes)");
        Ok(Self::new(object, Signature::from_bytes(sig)))
    }

    /// Writes this frame to the asynchronous `writer`.
    ///
    /// Does not flush `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error `writer` reports.
    pub async fn write_to_async<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.to_bytes()).await?;
        trace!(
            "wrote signed frame ({} object bytes)",
            self.object_bytes().len()
        );
        Ok(())
    }
}

/// Encodes `value`, signs it with `sk` and writes the frame to `writer`.
///
/// # Errors
///
/// - [`SignedObjectError::Encode`] if `value` cannot be encoded
/// - [`SignedObjectError::Write`] if `writer` fails
pub async fn write_signed_object_async<W, T>(
    writer: &mut W,
    value: &T,
    sk: &SecretKey,
) -> Result<(), SignedObjectError>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize + ?Sized,
{
    let frame = SignedFrame::sign(value, sk)?;
    frame
        .write_to_async(writer)
        .await
        .map_err(SignedObjectError::Write)
}

/// Reads a frame from `reader`, verifies it under `pk` and decodes it.
///
/// # Errors
///
/// Same as [`read_signed_object`](super::read_signed_object).
pub async fn read_signed_object_async<T, R>(
    reader: &mut R,
    max_len: u64,
    pk: &PublicKey,
) -> Result<T, SignedObjectError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin + ?Sized,
{
    SignedFrame::read_from_async(reader, max_len)
        .await?
        .into_object(pk)
}
