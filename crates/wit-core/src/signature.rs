//! ECDSA signatures, public-key recovery and the signature wire shapes.
//!
//! A [`Signature`] is the bare 64-byte `r || s` payload. Recoverability is
//! an added capability, not a subtype: a [`RecoverableSignature`] is that
//! payload plus a [`RecoveryContext`] (recovery id, recovered key, digest).
//!
//! # Recovery id discovery
//!
//! Keyed signatures travel as `public key + DER signature` with no recovery
//! id. On import the id is found by trying each of the four candidates in
//! order and keeping the first whose recovered key equals the supplied key
//! byte for byte. Successful recovery doubles as verification; if no
//! candidate matches, the signature does not belong to that key and digest.
//!
//! # Wire shapes
//!
//! ```text
//! keyed:    {"signature":{"Secp256k1":{"der":[..]}},"public_key":{"bytes":[..32],"compressed":n}}
//! protobuf: {"signature":{"Secp256k1":{"der":[..]}},"publicKey":{"publicKey":[..33]}}
//! ```

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{self, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{RECOVERABLE_SIGNATURE_LEN, SIGNATURE_LEN};
use crate::crypto::PublicKey;
use crate::error::CryptoError;
use crate::types::{Hash256, decode_hex};

/// The four possible ECDSA recovery identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecoveryId {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
}

impl RecoveryId {
    /// Every id, in discovery order.
    pub const ALL: [RecoveryId; 4] = [
        RecoveryId::Zero,
        RecoveryId::One,
        RecoveryId::Two,
        RecoveryId::Three,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecoveryId::Zero),
            1 => Some(RecoveryId::One),
            2 => Some(RecoveryId::Two),
            3 => Some(RecoveryId::Three),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    fn to_k256(self) -> ecdsa::RecoveryId {
        let byte = self.to_byte();
        ecdsa::RecoveryId::new(byte & 1 != 0, byte & 2 != 0)
    }
}

/// A 64-byte compact `r || s` ECDSA signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LEN],
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::MalformedSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&decode_hex(s)?)
    }

    /// Import a DER-encoded signature.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let sig = ecdsa::Signature::from_der(der)
            .map_err(|e| CryptoError::MalformedSignature(format!("bad DER: {e}")))?;
        Ok(Self::from_k256(&sig))
    }

    pub(crate) fn from_k256(sig: &ecdsa::Signature) -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(&sig.to_bytes());
        Self { bytes }
    }

    fn to_k256(&self) -> Result<ecdsa::Signature, CryptoError> {
        ecdsa::Signature::from_slice(&self.bytes)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))
    }

    pub fn r(&self) -> &[u8] {
        &self.bytes[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.bytes[32..]
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// DER export: `0x30 len 0x02 rlen r 0x02 slen s`.
    ///
    /// The payload is exported as is. S is not normalized, since that would
    /// change which recovery id reproduces the signer.
    pub fn to_der(&self) -> Vec<u8> {
        let r = der_integer(self.r());
        let s = der_integer(self.s());
        let mut out = Vec::with_capacity(6 + r.len() + s.len());
        out.push(0x30);
        out.push((4 + r.len() + s.len()) as u8);
        out.push(0x02);
        out.push(r.len() as u8);
        out.extend_from_slice(&r);
        out.push(0x02);
        out.push(s.len() as u8);
        out.extend_from_slice(&s);
        out
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Minimal big-endian DER integer: leading zeros stripped, `0x00` prepended
/// when the high bit is set.
fn der_integer(value: &[u8]) -> Vec<u8> {
    let start = value.iter().position(|&b| b != 0).unwrap_or(value.len() - 1);
    let trimmed = &value[start..];
    let mut out = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

/// What a signature was recovered against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryContext {
    pub recovery_id: RecoveryId,
    pub public_key: PublicKey,
    pub digest: Hash256,
}

/// A signature together with the id and key that recover it.
///
/// Only constructed after recovery has succeeded, so a value of this type
/// always verifies against its own context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    context: RecoveryContext,
}

impl RecoverableSignature {
    pub(crate) fn from_parts(signature: Signature, context: RecoveryContext) -> Self {
        Self { signature, context }
    }

    /// Parse a 65-byte `id || r || s` blob and recover its signer.
    pub fn from_recoverable(bytes: &[u8], digest: &Hash256) -> Result<Self, CryptoError> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LEN {
            return Err(CryptoError::MalformedSignature(format!(
                "expected recoverable signature with length {RECOVERABLE_SIGNATURE_LEN}, got {}",
                bytes.len()
            )));
        }
        let recovery_id = RecoveryId::from_byte(bytes[0]).ok_or_else(|| {
            CryptoError::MalformedSignature(format!("recovery id {} out of range", bytes[0]))
        })?;
        let signature = Signature::from_bytes(&bytes[1..])?;
        let public_key = recover(&signature, recovery_id, digest)?;
        Ok(Self::from_parts(
            signature,
            RecoveryContext {
                recovery_id,
                public_key,
                digest: *digest,
            },
        ))
    }

    /// Hex variant of [`from_recoverable`](Self::from_recoverable).
    pub fn from_recoverable_hex(s: &str, digest: &Hash256) -> Result<Self, CryptoError> {
        Self::from_recoverable(&decode_hex(s)?, digest)
    }

    /// Find the recovery id that makes `signature` recover `public_key`.
    pub fn discover(
        signature: Signature,
        public_key: PublicKey,
        digest: &Hash256,
    ) -> Result<Self, CryptoError> {
        for recovery_id in RecoveryId::ALL {
            match recover(&signature, recovery_id, digest) {
                Ok(recovered) if recovered == public_key => {
                    debug!(?recovery_id, %public_key, "recovery id discovered");
                    return Ok(Self::from_parts(
                        signature,
                        RecoveryContext {
                            recovery_id,
                            public_key,
                            digest: *digest,
                        },
                    ));
                }
                _ => continue,
            }
        }
        warn!(%public_key, %digest, "no recovery id matches signature");
        Err(CryptoError::SignatureRecoveryFailed)
    }

    /// Import the keyed shape (public key + DER), discovering the id.
    pub fn from_keyed_signature(keyed: &KeyedSignature, digest: &Hash256) -> Result<Self, CryptoError> {
        let public_key =
            PublicKey::from_protobuf(keyed.public_key.compressed, &keyed.public_key.bytes)?;
        let signature = Signature::from_der(&keyed.signature.secp256k1.der)?;
        Self::discover(signature, public_key, digest)
    }

    /// Import the protobuf shape (raw public key + DER), discovering the id.
    pub fn from_protobuf(proto: &ProtobufSignature, digest: &Hash256) -> Result<Self, CryptoError> {
        let public_key = PublicKey::from_bytes(&proto.public_key.public_key)?;
        let signature = Signature::from_der(&proto.signature.secp256k1.der)?;
        Self::discover(signature, public_key, digest)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn context(&self) -> &RecoveryContext {
        &self.context
    }

    pub fn recovery_id(&self) -> RecoveryId {
        self.context.recovery_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.context.public_key
    }

    pub fn digest(&self) -> &Hash256 {
        &self.context.digest
    }

    /// The 65-byte `id || r || s` form.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LEN] {
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LEN];
        out[0] = self.context.recovery_id.to_byte();
        out[1..].copy_from_slice(self.signature.as_bytes());
        out
    }

    pub fn to_hex(&self, prefix_0x: bool) -> String {
        let hex = hex::encode(self.to_bytes());
        if prefix_0x { format!("0x{hex}") } else { hex }
    }

    pub fn to_keyed_signature(&self) -> KeyedSignature {
        KeyedSignature {
            signature: SignatureEnvelope::from(&self.signature),
            public_key: KeyedPublicKey {
                bytes: self.context.public_key.x_bytes().to_vec(),
                compressed: self.context.public_key.compressed(),
            },
        }
    }

    pub fn to_protobuf(&self) -> ProtobufSignature {
        ProtobufSignature {
            signature: SignatureEnvelope::from(&self.signature),
            public_key: ProtobufPublicKey {
                public_key: self.context.public_key.to_bytes().to_vec(),
            },
        }
    }

    /// Verify the payload against the recovered key and digest.
    pub fn verify(&self) -> bool {
        verify_digest(&self.context.digest, &self.context.public_key, &self.signature)
    }
}

fn recover(signature: &Signature, recovery_id: RecoveryId, digest: &Hash256) -> Result<PublicKey, CryptoError> {
    let sig = signature.to_k256()?;
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id.to_k256())
        .map_err(|_| CryptoError::SignatureRecoveryFailed)?;
    Ok(PublicKey::from_verifying_key(&key))
}

/// Verify a signature over a digest. Any failure, including a key that is
/// not on the curve or an out-of-range scalar, is simply `false`.
pub fn verify_digest(digest: &Hash256, public_key: &PublicKey, signature: &Signature) -> bool {
    let Ok(key) = public_key.to_verifying_key() else {
        return false;
    };
    let Ok(sig) = signature.to_k256() else {
        return false;
    };
    key.verify_prehash(digest.as_bytes(), &sig).is_ok()
}

/// Hex-level verification entry point.
///
/// Returns `Ok(false)` when the signature does not verify and
/// [`CryptoError::MalformedInput`] when an argument cannot be parsed at all:
/// bad hex, a digest that is not 32 bytes, a signature that is not 64 bytes,
/// or a public key that is not a SEC1 point.
pub fn ecdsa_verify(digest_hex: &str, public_key_hex: &str, signature_hex: &str) -> Result<bool, CryptoError> {
    let digest = Hash256::from_hex(digest_hex)?;
    let key_bytes = decode_hex(public_key_hex)?;
    let key = VerifyingKey::from_sec1_bytes(&key_bytes)
        .map_err(|_| CryptoError::MalformedInput(format!("unparsable public key: {public_key_hex}")))?;
    let sig_bytes = decode_hex(signature_hex)?;
    if sig_bytes.len() != SIGNATURE_LEN {
        return Err(CryptoError::MalformedInput(format!(
            "expected {SIGNATURE_LEN}-byte signature, got {}",
            sig_bytes.len()
        )));
    }
    let Ok(sig) = ecdsa::Signature::from_slice(&sig_bytes) else {
        return Ok(false);
    };
    Ok(key.verify_prehash(digest.as_bytes(), &sig).is_ok())
}

// --- Wire shapes ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DerSignature {
    pub der: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SignatureEnvelope {
    #[serde(rename = "Secp256k1")]
    pub secp256k1: DerSignature,
}

impl From<&Signature> for SignatureEnvelope {
    fn from(signature: &Signature) -> Self {
        Self {
            secp256k1: DerSignature {
                der: signature.to_der(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeyedPublicKey {
    /// x coordinate, 32 bytes.
    pub bytes: Vec<u8>,
    /// Compression flag byte.
    pub compressed: u8,
}

/// Public key + DER signature, as embedded in signed transactions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeyedSignature {
    pub signature: SignatureEnvelope,
    pub public_key: KeyedPublicKey,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProtobufPublicKey {
    /// `flag || x`, 33 bytes.
    #[serde(rename = "publicKey")]
    pub public_key: Vec<u8>,
}

/// DER signature + raw public key bytes, protobuf JSON naming.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProtobufSignature {
    pub signature: SignatureEnvelope,
    #[serde(rename = "publicKey")]
    pub public_key: ProtobufPublicKey,
}
