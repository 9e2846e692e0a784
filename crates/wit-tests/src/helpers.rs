//! Shared fixtures for the property tests.

use wit_core::address::{Network, PublicKeyHash};
use wit_core::crypto::PrivateKey;
use wit_core::types::Hash256;
use wit_wallet::coin_selection::Utxo;
use wit_wallet::xprv::ExtendedKeyMaterial;

/// A private key from 32 arbitrary bytes, or `None` when they are not a
/// valid scalar.
pub fn private_key(seed: [u8; 32]) -> Option<PrivateKey> {
    PrivateKey::from_bytes(&seed).ok()
}

/// A UTXO owned by a fixed mainnet hash.
pub fn utxo(index: u32, value: u64, timelock: u64) -> Utxo {
    Utxo {
        transaction_id: Hash256([(index % 256) as u8; 32]),
        output_index: index,
        value,
        timelock,
        owner: PublicKeyHash::from_hash([0x5A; 20], Network::Mainnet),
    }
}

/// UTXOs with the given values, all unlocked.
pub fn unlocked(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| utxo(i as u32, v, 0))
        .collect()
}

/// Plaintext master `xprv` string for a key and chain code.
pub fn master_xprv(key: &PrivateKey, chain_code: [u8; 32]) -> String {
    // A master key always fits in a single depth byte.
    ExtendedKeyMaterial::master(chain_code, key)
        .to_slip32()
        .unwrap_or_default()
}
