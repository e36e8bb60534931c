// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of a digital signature scheme.
//!
//! This implements the Ed25519 digital signature scheme, as specified in
//! [RFC 8032](https://tools.ietf.org/html/rfc8032).
//! Specifically, this is a wrapper around the [`ed25519_consensus`] crate,
//! which validates signatures according to the ZIP-215 rules.
//!
//! # Examples
//!
//! ```
//! use signed_object::crypto::hash;
//! use signed_object::crypto::signature::{
//!     generate_key_pair_deterministic, sign_hash, verify_hash,
//! };
//!
//! let (sk, pk) = generate_key_pair_deterministic([0; 32]);
//! assert_eq!(sk.to_pk(), pk);
//!
//! let digest = hash(b"test");
//! let sig = sign_hash(&digest, &sk);
//! assert!(verify_hash(&digest, &pk, &sig).is_ok());
//! ```

use std::fmt;

use ed25519_consensus::{SigningKey, VerificationKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, TryCryptoRng};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use static_assertions::{assert_impl_all, const_assert_eq};
use thiserror::Error;

use super::hash::Digest;

/// Number of entropy bytes a key pair is derived from.
pub const ENTROPY_SIZE: usize = 32;

/// Size of a [`PublicKey`] in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an exported [`SecretKey`] in bytes.
///
/// The exported form is the entropy seed followed by the public key.
pub const SECRET_KEY_SIZE: usize = 64;

/// Size of a [`Signature`] in bytes.
pub const SIGNATURE_SIZE: usize = 64;

const_assert_eq!(SECRET_KEY_SIZE, ENTROPY_SIZE + PUBLIC_KEY_SIZE);
assert_impl_all!(SecretKey: Send, Sync);
assert_impl_all!(PublicKey: Send, Sync);
assert_impl_all!(Signature: Send, Sync);

/// Secure randomness was unavailable during key generation.
///
/// Key generation never retries and never falls back to weaker entropy.
#[derive(Debug, Error)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(#[source] Box<dyn std::error::Error + Send + Sync>);

/// A signature did not match its claimed digest and public key.
///
/// This deliberately does not say whether the key, the data or the signature
/// itself was at fault.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("invalid signature")]
pub struct InvalidSignature;

/// Error type for importing keys from raw bytes.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("bytes do not encode a valid public key")]
    InvalidPublicKey,
    #[error("secret key suffix does not match its public key")]
    PublicKeyMismatch,
}

/// A secret key for the digital signature scheme.
///
/// This is a wrapper around [`ed25519_consensus::SigningKey`] that also keeps
/// the corresponding [`PublicKey`], so [`SecretKey::to_pk`] is a plain read.
///
/// Deliberately implements neither [`Serialize`] nor a revealing [`fmt::Debug`].
#[derive(Clone)]
pub struct SecretKey {
    signing_key: SigningKey,
    public_key: PublicKey,
}

/// A public key for the digital signature scheme.
///
/// This is a wrapper around [`ed25519_consensus::VerificationKey`].
#[derive(Clone, Copy)]
pub struct PublicKey(VerificationKey);

/// A digital signature.
///
/// This is a wrapper around [`ed25519_consensus::Signature`].
#[derive(Clone, Copy)]
pub struct Signature(ed25519_consensus::Signature);

/// Generates a fresh key pair from the operating system's entropy source.
///
/// # Errors
///
/// Returns [`EntropyError`] if the operating system fails to provide entropy.
pub fn generate_key_pair() -> Result<(SecretKey, PublicKey), EntropyError> {
    let sk = SecretKey::try_from_rng(&mut OsRng)?;
    let pk = sk.to_pk();
    Ok((sk, pk))
}

/// Derives a key pair as a pure function of `entropy`.
///
/// Identical entropy always yields an identical key pair.
/// Keeping `entropy` secret is the caller's responsibility.
#[must_use]
pub fn generate_key_pair_deterministic(entropy: [u8; ENTROPY_SIZE]) -> (SecretKey, PublicKey) {
    let sk = SecretKey::from_seed(entropy);
    let pk = sk.to_pk();
    (sk, pk)
}

/// Signs `digest` using the secret key `sk`.
///
/// Ed25519 signing is deterministic, the same inputs give the same signature.
#[must_use]
pub fn sign_hash(digest: &Digest, sk: &SecretKey) -> Signature {
    sk.sign(digest)
}

/// Verifies that `sig` is a valid signature of `digest` under `pk`.
///
/// # Errors
///
/// Returns [`InvalidSignature`] on any mismatch.
pub fn verify_hash(
    digest: &Digest,
    pk: &PublicKey,
    sig: &Signature,
) -> Result<(), InvalidSignature> {
    pk.0.verify(&sig.0, digest).map_err(|_| InvalidSignature)
}

impl SecretKey {
    /// Generates a new secret key.
    ///
    /// The required entropy is derived from the provided `rng`.
    pub fn new(rng: &mut impl CryptoRng) -> Self {
        let mut seed = [0u8; ENTROPY_SIZE];
        rng.fill_bytes(&mut seed[..]);
        Self::from_seed(seed)
    }

    /// Generates a new secret key from a fallible entropy source.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError`] if `rng` fails to provide entropy.
    pub fn try_from_rng<R>(rng: &mut R) -> Result<Self, EntropyError>
    where
        R: TryCryptoRng + ?Sized,
        R::Error: std::error::Error + Send + Sync + 'static,
    {
        let mut seed = [0u8; ENTROPY_SIZE];
        rng.try_fill_bytes(&mut seed[..])
            .map_err(|err| EntropyError(Box::new(err)))?;
        Ok(Self::from_seed(seed))
    }

    /// Deterministically derives a secret key from `seed`.
    #[must_use]
    pub fn from_seed(seed: [u8; ENTROPY_SIZE]) -> Self {
        let signing_key = SigningKey::from(seed);
        let public_key = PublicKey(signing_key.verification_key());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Imports a secret key in its exported `seed || public key` form.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::PublicKeyMismatch`] if the trailing public key
    /// does not belong to the seed.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Result<Self, KeyError> {
        let mut seed = [0u8; ENTROPY_SIZE];
        seed.copy_from_slice(&bytes[..ENTROPY_SIZE]);
        let sk = Self::from_seed(seed);
        if bytes[ENTROPY_SIZE..] != sk.public_key.as_bytes()[..] {
            return Err(KeyError::PublicKeyMismatch);
        }
        Ok(sk)
    }

    /// Exports this secret key as `seed || public key`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        let mut bytes = [0u8; SECRET_KEY_SIZE];
        bytes[..ENTROPY_SIZE].copy_from_slice(self.signing_key.as_bytes());
        bytes[ENTROPY_SIZE..].copy_from_slice(self.public_key.as_bytes());
        bytes
    }

    /// Returns the public key corresponding to this secret key.
    ///
    /// This is not a cryptographic operation, the key was derived on creation.
    #[must_use]
    pub fn to_pk(&self) -> PublicKey {
        self.public_key
    }

    /// Signs the byte string `msg` using this secret key.
    #[must_use]
    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.signing_key.sign(msg))
    }

    /// Returns the entropy seed of this secret key.
    #[must_use]
    pub fn as_seed(&self) -> &[u8; ENTROPY_SIZE] {
        self.signing_key.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Tries to convert a byte array into a public key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidPublicKey`] if `bytes` is not a curve point.
    pub fn try_from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Result<Self, KeyError> {
        VerificationKey::try_from(*bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Returns the bytes of this public key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(self.as_bytes(), state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fixed_bytes(self.as_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_fixed_bytes::<D, PUBLIC_KEY_SIZE>(deserializer)?;
        Self::try_from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl Signature {
    /// Converts raw bytes into a signature.
    ///
    /// Any 64 bytes form a signature, whether it verifies is another matter.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes.into())
    }

    /// Returns the bytes of this signature.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        self.0.to_bytes()
    }

    /// Verifies that this is a valid signature of `msg` under `pk`.
    #[must_use]
    pub fn verify(&self, msg: &[u8], pk: &PublicKey) -> bool {
        pk.0.verify(&self.0, msg).is_ok()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fixed_bytes(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_fixed_bytes::<D, SIGNATURE_SIZE>(deserializer)?;
        Ok(Self::from_bytes(bytes))
    }
}

// Hex strings for human-readable formats, raw bytes for binary ones.
fn serialize_fixed_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&hex::encode(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

fn deserialize_fixed_bytes<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    if deserializer.is_human_readable() {
        deserializer.deserialize_str(FixedBytesVisitor::<N>)
    } else {
        deserializer.deserialize_bytes(FixedBytesVisitor::<N>)
    }
}

struct FixedBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{N} bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        <[u8; N]>::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let mut bytes = [0u8; N];
        hex::decode_to_slice(v, &mut bytes).map_err(E::custom)?;
        Ok(bytes)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = seq
                .next_element()?
                .ok_or_else(|| <A::Error as de::Error>::invalid_length(i, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(<A::Error as de::Error>::invalid_length(N + 1, &self));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rand::TryRngCore;

    use super::*;
    use crate::crypto::hash;

    struct FailingRng;

    impl TryRngCore for FailingRng {
        type Error = io::Error;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Err(io::Error::other("no entropy"))
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Err(io::Error::other("no entropy"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> Result<(), Self::Error> {
            Err(io::Error::other("no entropy"))
        }
    }

    impl TryCryptoRng for FailingRng {}

    #[test]
    fn basic() {
        let sk = SecretKey::new(&mut rand::rng());
        let pk = sk.to_pk();
        assert_ne!(sk.as_seed(), pk.as_bytes());
        let msg = b"ed25519 is pretty fine";
        let sig = sk.sign(msg);
        assert!(sig.verify(msg, &pk));
        assert!(!sig.verify(b"ed25519 is pretty bad", &pk));
    }

    #[test]
    fn os_entropy() {
        let (sk1, pk1) = generate_key_pair().unwrap();
        let (_, pk2) = generate_key_pair().unwrap();
        assert_eq!(sk1.to_pk(), pk1);
        assert_ne!(pk1, pk2);
    }

    #[test]
    fn entropy_failure() {
        let res = SecretKey::try_from_rng(&mut FailingRng);
        let err = res.unwrap_err();
        assert!(err.to_string().contains("no entropy"));

        let source = std::error::Error::source(&err).expect("rng error is kept as source");
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn concurrent_sign_and_verify() {
        let (sk, pk) = generate_key_pair_deterministic([11; ENTROPY_SIZE]);
        let (sk, pk) = (&sk, &pk);
        let digests: Vec<_> = (0u8..8).map(|i| hash(&[i])).collect();

        let sigs: Vec<Signature> = std::thread::scope(|s| {
            let handles: Vec<_> = digests
                .iter()
                .map(|digest| s.spawn(move || sign_hash(digest, sk)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        std::thread::scope(|s| {
            for (digest, sig) in digests.iter().zip(&sigs) {
                s.spawn(move || {
                    assert_eq!(verify_hash(digest, pk, sig), Ok(()));
                    assert_eq!(*sig, sign_hash(digest, sk));
                });
            }
        });
    }

    #[test]
    fn deterministic() {
        let seed = [7; ENTROPY_SIZE];
        let (sk1, pk1) = generate_key_pair_deterministic(seed);
        let (sk2, pk2) = generate_key_pair_deterministic(seed);
        assert_eq!(pk1, pk2);
        assert_eq!(sk1.to_bytes(), sk2.to_bytes());
        assert_eq!(sk1.as_seed(), &seed);

        let (_, pk3) = generate_key_pair_deterministic([8; ENTROPY_SIZE]);
        assert_ne!(pk1, pk3);
    }

    #[test]
    fn zero_seed_scenario() {
        let (sk, pk) = generate_key_pair_deterministic([0; ENTROPY_SIZE]);
        let (_, other_pk) = generate_key_pair_deterministic([1; ENTROPY_SIZE]);
        let digest = hash(b"test");
        let sig = sign_hash(&digest, &sk);
        assert_eq!(sign_hash(&digest, &sk), sig);
        assert_eq!(verify_hash(&digest, &pk, &sig), Ok(()));
        assert_eq!(verify_hash(&digest, &other_pk, &sig), Err(InvalidSignature));
    }

    #[test]
    fn tampered_digest_or_signature() {
        let (sk, pk) = generate_key_pair_deterministic([3; ENTROPY_SIZE]);
        let digest = hash(b"tamper me");
        let sig = sign_hash(&digest, &sk);

        let mut bad_digest = digest;
        bad_digest[31] ^= 1;
        assert!(verify_hash(&bad_digest, &pk, &sig).is_err());

        for i in [0, 31, 32, 63] {
            let mut bytes = sig.to_bytes();
            bytes[i] ^= 0x80;
            let bad_sig = Signature::from_bytes(bytes);
            assert!(verify_hash(&digest, &pk, &bad_sig).is_err());
        }
    }

    #[test]
    fn secret_key_layout() {
        let (sk, pk) = generate_key_pair_deterministic([9; ENTROPY_SIZE]);
        let bytes = sk.to_bytes();
        assert_eq!(&bytes[..ENTROPY_SIZE], sk.as_seed());
        assert_eq!(&bytes[ENTROPY_SIZE..], pk.as_bytes());

        let imported = SecretKey::from_bytes(&bytes).unwrap();
        assert_eq!(imported.to_pk(), pk);

        let mut bad = bytes;
        bad[SECRET_KEY_SIZE - 1] ^= 1;
        assert_eq!(
            SecretKey::from_bytes(&bad).unwrap_err(),
            KeyError::PublicKeyMismatch
        );
    }

    #[test]
    fn debug_hides_secret() {
        let (sk, pk) = generate_key_pair_deterministic([5; ENTROPY_SIZE]);
        let debug = format!("{sk:?}");
        assert!(debug.contains(&pk.to_string()));
        assert!(!debug.contains(&hex::encode(sk.as_seed())));
    }

    #[test]
    fn public_key_bytes() {
        let (_, pk) = generate_key_pair_deterministic([2; ENTROPY_SIZE]);
        let restored = PublicKey::try_from_bytes(pk.as_bytes()).unwrap();
        assert_eq!(restored, pk);
    }

    #[test]
    fn serde_human_readable() {
        let (sk, pk) = generate_key_pair_deterministic([4; ENTROPY_SIZE]);
        let sig = sk.sign(b"json");

        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{pk}\""));
        let restored: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pk);

        let json = serde_json::to_string(&sig).unwrap();
        let restored: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, sig);

        assert!(serde_json::from_str::<Signature>("\"abcd\"").is_err());
    }

    #[test]
    fn serde_binary() {
        let config = bincode::config::standard();
        let (sk, pk) = generate_key_pair_deterministic([6; ENTROPY_SIZE]);
        let sig = sk.sign(b"bincode");

        let bytes = bincode::serde::encode_to_vec((pk, sig), config).unwrap();
        let ((restored_pk, restored_sig), read): ((PublicKey, Signature), usize) =
            bincode::serde::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(read, bytes.len());
        assert_eq!(restored_pk, pk);
        assert_eq!(restored_sig, sig);
    }
}
