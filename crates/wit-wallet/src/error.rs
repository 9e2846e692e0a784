//! Wallet error types.

use thiserror::Error;
use wit_core::error::{AddressError, AmountError, CryptoError, DecodeError};

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Extended key string carries the wrong human-readable prefix.
    #[error("invalid XPRV header: {0:?} != \"xprv\"")]
    InvalidHeader(String),

    /// Only master keys (depth 0) are supported.
    #[error("invalid XPRV: not a master private key (depth: {0})")]
    UnsupportedKeyDepth(u8),

    /// Payload length does not match what its depth implies.
    #[error("malformed payload: expected {expected} bytes, got {got}")]
    MalformedPayload {
        /// Expected payload length in bytes.
        expected: usize,
        /// Actual payload length in bytes.
        got: usize,
    },

    /// Key slot marker is not 0 or the scalar is outside `1..n`.
    #[error("invalid XPRV: not a private key")]
    NotAPrivateKey,

    /// Wrong password or corrupted ciphertext.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Encryption failure.
    #[error("encryption: {0}")]
    Encryption(String),

    /// Unknown UTXO selection strategy name.
    #[error("invalid UTXO selection strategy: {0}")]
    InvalidStrategy(String),

    /// Invalid configuration value.
    #[error("config: {0}")]
    Config(String),

    /// Bech32 decoding error from wit-core.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Amount error from wit-core.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Cryptographic error from wit-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Address error from wit-core.
    #[error(transparent)]
    Address(#[from] AddressError),
}
