//! # wit-wallet: extended keys and funds selection for Witnet wallets.
//!
//! Decodes and decrypts SLIP-32 `xprv` exports, selects UTXOs to fund a
//! payment, and carries the toolkit configuration shared by front ends.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`xprv`]: `xprv` parsing and PBKDF2 + AES-256-CBC export encryption
//! - [`coin_selection`]: Strategy-ordered UTXO selection
//! - [`config`]: `ToolkitConfig` and tracing setup

pub mod coin_selection;
pub mod config;
pub mod error;
pub mod xprv;

// Re-exports for convenient access
pub use coin_selection::{Utxo, UtxoCacheInfo, UtxoSelectionStrategy, select_utxos, select_utxos_at};
pub use config::{LogFormat, ToolkitConfig, init_tracing};
pub use error::WalletError;
pub use xprv::{
    ExtendedKeyMaterial, decipher_and_parse_xprv, decipher_xprv, encipher_xprv, encipher_xprv_with,
    parse_xprv,
};
