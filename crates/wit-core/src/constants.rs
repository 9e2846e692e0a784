//! Protocol constants. All monetary values in pedros (1 WIT = 10^9 pedros).

/// Pedros per wit.
pub const PEDROS_PER_WIT: u64 = 1_000_000_000;

/// Number of fractional digits in a wit amount.
pub const WIT_DECIMALS: usize = 9;

/// Largest integer a 64-bit float represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Address HRP on mainnet.
pub const MAINNET_HRP: &str = "wit";

/// Address HRP on testnet.
pub const TESTNET_HRP: &str = "twit";

/// Length of a public key hash in bytes.
pub const PUBKEY_HASH_LEN: usize = 20;

/// Length of a compressed secp256k1 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Length of a compact (r || s) ECDSA signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Length of a recoverable signature: recovery id byte + compact signature.
pub const RECOVERABLE_SIGNATURE_LEN: usize = 1 + SIGNATURE_LEN;
