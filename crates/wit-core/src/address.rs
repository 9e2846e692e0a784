//! Public key hashes and their Bech32 address form.
//!
//! A Witnet address is the plain Bech32 encoding of a 20-byte public key
//! hash under a network prefix:
//! - Mainnet: `wit1...`
//! - Testnet: `twit1...`
//!
//! The hash itself is the first 20 bytes of SHA-256 over the compressed
//! public key (see [`PublicKeyHash::from_public_key`]).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::bech32;
use crate::constants::{MAINNET_HRP, PUBKEY_HASH_LEN, TESTNET_HRP};
use crate::crypto::{PublicKey, sha256};
use crate::error::AddressError;
use crate::types::decode_hex;

/// Network identifier determining the address prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet (HRP: "wit", addresses start with `wit1`).
    #[default]
    Mainnet,
    /// Testnet (HRP: "twit", addresses start with `twit1`).
    Testnet,
}

impl Network {
    /// Human-readable prefix for this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_HRP,
            Network::Testnet => TESTNET_HRP,
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            MAINNET_HRP => Ok(Network::Mainnet),
            TESTNET_HRP => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownPrefix(hrp.to_string())),
        }
    }
}

impl FromStr for Network {
    type Err = AddressError;

    /// Accepts `mainnet`/`testnet` as well as the bare prefixes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Network::from_hrp(other),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// A 20-byte public key hash tagged with the network it belongs to.
///
/// Equality covers both the hash and the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKeyHash {
    hash: [u8; PUBKEY_HASH_LEN],
    network: Network,
}

impl PublicKeyHash {
    /// Wrap a raw 20-byte hash.
    pub fn from_hash(hash: [u8; PUBKEY_HASH_LEN], network: Network) -> Self {
        Self { hash, network }
    }

    /// Hash a public key: first 20 bytes of SHA-256(compressed || x).
    ///
    /// The result is tagged as mainnet; use [`with_network`](Self::with_network)
    /// to retag it.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = sha256(&public_key.to_bytes());
        let mut hash = [0u8; PUBKEY_HASH_LEN];
        hash.copy_from_slice(&digest.as_bytes()[..PUBKEY_HASH_LEN]);
        Self::from_hash(hash, Network::Mainnet)
    }

    /// Build from a 20-byte hash or a 32-byte zero-padded hash buffer.
    ///
    /// Only the first 20 bytes of a 32-byte buffer are kept.
    pub fn from_buffer(bytes: &[u8], network: Network) -> Result<Self, AddressError> {
        match bytes.len() {
            PUBKEY_HASH_LEN | 32 => {
                let mut hash = [0u8; PUBKEY_HASH_LEN];
                hash.copy_from_slice(&bytes[..PUBKEY_HASH_LEN]);
                Ok(Self::from_hash(hash, network))
            }
            len => Err(AddressError::InvalidLength(len)),
        }
    }

    /// Parse a hex-encoded 20-byte hash.
    pub fn from_hex(s: &str, network: Network) -> Result<Self, AddressError> {
        let bytes = decode_hex(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if bytes.len() != PUBKEY_HASH_LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        Self::from_buffer(&bytes, network)
    }

    /// Decode a `wit1...` or `twit1...` address. Case-insensitive.
    pub fn from_address(address: &str) -> Result<Self, AddressError> {
        let decoded = bech32::decode(address, bech32::ADDRESS_LIMIT)?;
        let network = Network::from_hrp(&decoded.hrp)?;
        if decoded.data.len() != PUBKEY_HASH_LEN {
            return Err(AddressError::InvalidLength(decoded.data.len()));
        }
        Self::from_buffer(&decoded.data, network)
    }

    /// Same hash, different network tag.
    pub fn with_network(self, network: Network) -> Self {
        Self { network, ..self }
    }

    /// Encode the hash as an address on `network`.
    pub fn to_address(&self, network: Network) -> String {
        bech32::encode(network.hrp(), &self.hash)
    }

    /// Encode the hash as an address on its own network.
    pub fn address(&self) -> String {
        self.to_address(self.network)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn to_bytes20(&self) -> [u8; PUBKEY_HASH_LEN] {
        self.hash
    }

    /// The hash right-padded with zeros to 32 bytes.
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..PUBKEY_HASH_LEN].copy_from_slice(&self.hash);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl AsRef<[u8]> for PublicKeyHash {
    fn as_ref(&self) -> &[u8] {
        &self.hash
    }
}

impl fmt::Display for PublicKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

impl FromStr for PublicKeyHash {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl Serialize for PublicKeyHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address())
    }
}

impl<'de> Deserialize<'de> for PublicKeyHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_address(&s).map_err(serde::de::Error::custom)
    }
}
