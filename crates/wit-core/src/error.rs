//! Error types for the Witnet toolkit core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid HRP")] InvalidHrp,
    #[error("invalid length")] InvalidLength,
    #[error("string too long: {len} > {max}")] TooLong { len: usize, max: usize },
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid padding bits")] InvalidPadding,
    #[error("missing separator")] MissingSeparator,
    #[error("mixed case")] MixedCase,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address: unknown prefix {0:?}")] UnknownPrefix(String),
    #[error("invalid address: {0}")] Encoding(#[from] DecodeError),
    #[error("invalid hash length: {0}")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("malformed signature: {0}")] MalformedSignature(String),
    #[error("malformed input: {0}")] MalformedInput(String),
    #[error("no recovery id in 0..=3 recovers the expected public key")] SignatureRecoveryFailed,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid private key bytes")] InvalidPrivateKey,
    #[error("signing failed: {0}")] SigningFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount too large: {0}")] AmountTooLarge(String),
    #[error("amount is not a finite number")] NotFinite,
    #[error("invalid amount: {0}")] InvalidAmount(String),
}

#[derive(Error, Debug)]
pub enum WitError {
    #[error(transparent)] Decode(#[from] DecodeError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Amount(#[from] AmountError),
}
