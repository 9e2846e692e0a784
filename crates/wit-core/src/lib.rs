//! # wit-core
//! Amounts, addresses, keys and signatures for Witnet wallets.

pub mod address;
pub mod bech32;
pub mod coins;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod signature;
pub mod types;

pub use address::{Network, PublicKeyHash};
pub use coins::{Balance, Coins};
pub use crypto::{PrivateKey, PublicKey, sha256};
pub use error::{AddressError, AmountError, CryptoError, DecodeError, WitError};
pub use signature::{KeyedSignature, ProtobufSignature, RecoverableSignature, RecoveryId, Signature, ecdsa_verify};
pub use types::Hash256;
