//! secp256k1 key material.
//!
//! Elliptic-curve arithmetic is delegated to `k256`; this module only deals
//! with the encodings Witnet uses on the wire:
//!
//! - public keys as a compression flag (`0x02`/`0x03`) followed by the
//!   32-byte x coordinate
//! - private keys as bare 32-byte scalars, zeroized on drop
//!
//! Signing always happens over a 32-byte digest computed by the caller.

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

use crate::address::PublicKeyHash;
use crate::constants::PUBLIC_KEY_LEN;
use crate::error::CryptoError;
use crate::signature::{RecoverableSignature, RecoveryContext, RecoveryId, Signature};
use crate::types::{Hash256, decode_hex};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Hash256 {
    Hash256(Sha256::digest(data).into())
}

/// Compressed secp256k1 public key.
///
/// Two keys are equal iff both the compression flag and the x coordinate
/// match byte for byte. Construction only checks lengths; curve membership
/// is checked when the key is used for verification.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    compressed: u8,
    bytes: [u8; 32],
}

impl PublicKey {
    /// Build from the flag and x coordinate, as carried in keyed signatures.
    pub fn from_protobuf(compressed: u8, bytes: &[u8]) -> Result<Self, CryptoError> {
        let x: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::MalformedInput(format!(
                "expected 32-byte public key coordinate, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { compressed, bytes: x })
    }

    /// Parse the 33-byte `flag || x` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::MalformedInput(format!(
                "expected {PUBLIC_KEY_LEN}-byte public key, got {}",
                bytes.len()
            )));
        }
        Self::from_protobuf(bytes[0], &bytes[1..])
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&decode_hex(s)?)
    }

    /// Recover the signer of `digest` from a 65-byte `id || r || s` blob.
    pub fn from_recoverable(signature: &[u8], digest: &Hash256) -> Result<Self, CryptoError> {
        RecoverableSignature::from_recoverable(signature, digest).map(|sig| *sig.public_key())
    }

    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let encoded = point.as_bytes();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&encoded[1..PUBLIC_KEY_LEN]);
        Self {
            compressed: encoded[0],
            bytes,
        }
    }

    pub(crate) fn to_verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_sec1_bytes(&self.to_bytes()).map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Compression flag byte.
    pub fn compressed(&self) -> u8 {
        self.compressed
    }

    /// The 32-byte x coordinate.
    pub fn x_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// The 33-byte `flag || x` form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out[0] = self.compressed;
        out[1..].copy_from_slice(&self.bytes);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Mainnet public key hash of this key.
    pub fn hash(&self) -> PublicKeyHash {
        PublicKeyHash::from_public_key(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// secp256k1 private key.
///
/// Wraps [`k256::ecdsa::SigningKey`], which zeroizes the scalar on drop.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a random key using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a key from a 32-byte scalar, which must be in `1..n`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        Self::from_slice(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Whether `bytes` is a valid secp256k1 scalar.
    pub fn is_valid(bytes: &[u8]) -> bool {
        bytes.len() == 32 && SigningKey::from_slice(bytes).is_ok()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Raw scalar bytes. Handle with care.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Sign a 32-byte digest. The recovery id comes straight from the signer.
    pub fn sign_digest(&self, digest: &Hash256) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(recovery_id.to_byte())
            .ok_or_else(|| CryptoError::SigningFailed("recovery id out of range".into()))?;
        Ok(RecoverableSignature::from_parts(
            Signature::from_k256(&signature),
            RecoveryContext {
                recovery_id,
                public_key: self.public_key(),
                digest: *digest,
            },
        ))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
