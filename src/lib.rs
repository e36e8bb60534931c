// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signed objects: authenticated framing for arbitrary serializable values.
//!
//! A producer signs any [`serde::Serialize`] value with a [`SecretKey`].
//! A consumer verifies, before decoding, that the bytes were produced by the
//! holder of the matching [`PublicKey`].
//!
//! - [`crypto`] provides key generation, SHA-256 digests and Ed25519 signatures
//! - [`object`] provides the signed frame format and the read/write protocol
//! - [`logging`] optionally installs a logger for the [`log`] output of this crate

#![deny(rustdoc::broken_intra_doc_links)]

pub mod crypto;
pub mod logging;
pub mod object;

pub use self::crypto::{PublicKey, SecretKey, Signature};
pub use self::object::{
    SignedFrame, SignedObjectError, read_signed_object, sign_object, verify_object,
    write_signed_object,
};
