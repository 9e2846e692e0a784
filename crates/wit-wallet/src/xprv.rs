//! SLIP-32 extended private keys and their password-encrypted export.
//!
//! # Wire formats
//! ```text
//! xprv payload:      depth (1) || path (4 * depth, BE u32) || chain code (32) || 0x00 || key (32)
//! encrypted payload: iv (16) || salt (32) || AES-256-CBC(PKCS#7) ciphertext of the xprv string
//! ```
//!
//! Both are carried as Bech32 strings under the `xprv` prefix. The cipher
//! key is PBKDF2-HMAC-SHA256 over the password with 10 000 iterations.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::Sha256;
use tracing::{debug, warn};
use wit_core::bech32;
use wit_core::crypto::PrivateKey;
use zeroize::Zeroizing;

use crate::error::WalletError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Human-readable prefix of extended private keys.
pub const XPRV_PREFIX: &str = "xprv";

const DEPTH_LEN: usize = 1;
const KEY_PATH_LEN: usize = 4;
const CHAIN_CODE_LEN: usize = 32;
const KEY_SLOT_LEN: usize = 33;

/// Longest accepted string: a depth-255 key.
pub const XPRV_LIMIT: usize = DEPTH_LEN + 255 * KEY_PATH_LEN + CHAIN_CODE_LEN + KEY_SLOT_LEN;

/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 10_000;

/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 32;

const BLOCK_LEN: usize = 16;

/// Smallest encrypted payload: iv, salt and one cipher block.
const MIN_ENCRYPTED_LEN: usize = IV_LEN + SALT_LEN + BLOCK_LEN;

/// Payload length implied by a key depth.
pub fn expected_payload_len(depth: u8) -> usize {
    DEPTH_LEN + depth as usize * KEY_PATH_LEN + CHAIN_CODE_LEN + KEY_SLOT_LEN
}

/// Decoded contents of an extended private key.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKeyMaterial {
    /// Derivation path; its length is the key depth.
    pub key_path: Vec<u32>,
    pub chain_code: [u8; CHAIN_CODE_LEN],
    pub private_key: Zeroizing<[u8; 32]>,
}

impl ExtendedKeyMaterial {
    /// A master (depth 0) key.
    pub fn master(chain_code: [u8; CHAIN_CODE_LEN], private_key: &PrivateKey) -> Self {
        Self {
            key_path: Vec::new(),
            chain_code,
            private_key: private_key.to_bytes(),
        }
    }

    pub fn depth(&self) -> usize {
        self.key_path.len()
    }

    pub fn private_key(&self) -> Result<PrivateKey, WalletError> {
        PrivateKey::from_bytes(&self.private_key).map_err(|_| WalletError::NotAPrivateKey)
    }

    /// Encode back to the `xprv` string form.
    pub fn to_slip32(&self) -> Result<String, WalletError> {
        let depth = u8::try_from(self.depth()).map_err(|_| {
            WalletError::Encryption(format!("key path too deep: {}", self.depth()))
        })?;
        let mut payload = Zeroizing::new(Vec::with_capacity(expected_payload_len(depth)));
        payload.push(depth);
        for index in &self.key_path {
            payload.extend_from_slice(&index.to_be_bytes());
        }
        payload.extend_from_slice(&self.chain_code);
        payload.push(0);
        payload.extend_from_slice(&self.private_key[..]);
        Ok(bech32::encode(XPRV_PREFIX, &payload))
    }
}

impl std::fmt::Debug for ExtendedKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKeyMaterial")
            .field("key_path", &self.key_path)
            .field("chain_code", &hex::encode(self.chain_code))
            .finish_non_exhaustive()
    }
}

/// Decode a plaintext `xprv` string into its key material.
///
/// Checks run in a fixed order and the first failure is returned: Bech32
/// decoding, prefix, depth, payload length, then the key slot.
pub fn parse_xprv(slip32: &str) -> Result<ExtendedKeyMaterial, WalletError> {
    let decoded = bech32::decode(slip32, XPRV_LIMIT).inspect_err(|e| {
        debug!(error = %e, "xprv bech32 decode failed");
    })?;
    if decoded.hrp != XPRV_PREFIX {
        return Err(WalletError::InvalidHeader(decoded.hrp));
    }
    let bytes = Zeroizing::new(decoded.data);

    let depth = bytes.first().copied().ok_or(WalletError::MalformedPayload {
        expected: expected_payload_len(0),
        got: 0,
    })?;
    if depth != 0 {
        return Err(WalletError::UnsupportedKeyDepth(depth));
    }
    let expected = expected_payload_len(depth);
    if bytes.len() != expected {
        return Err(WalletError::MalformedPayload {
            expected,
            got: bytes.len(),
        });
    }

    let path_end = DEPTH_LEN + depth as usize * KEY_PATH_LEN;
    let key_path = bytes[DEPTH_LEN..path_end]
        .chunks_exact(KEY_PATH_LEN)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mut chain_code = [0u8; CHAIN_CODE_LEN];
    chain_code.copy_from_slice(&bytes[path_end..path_end + CHAIN_CODE_LEN]);

    let slot = &bytes[path_end + CHAIN_CODE_LEN..];
    if slot[0] != 0 || !PrivateKey::is_valid(&slot[1..]) {
        return Err(WalletError::NotAPrivateKey);
    }
    let mut private_key = Zeroizing::new([0u8; 32]);
    private_key.copy_from_slice(&slot[1..]);

    Ok(ExtendedKeyMaterial {
        key_path,
        chain_code,
        private_key,
    })
}

fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ROUNDS, &mut key[..]);
    key
}

/// Whether `s` decodes as Bech32 under the `xprv` prefix.
fn is_xprv_string(s: &str) -> bool {
    bech32::decode(s, XPRV_LIMIT).is_ok_and(|d| d.hrp == XPRV_PREFIX)
}

/// Decrypt a password-protected `xprv` export back to the plaintext key string.
///
/// A wrong password almost always breaks the PKCS#7 padding. When it does
/// not, the plaintext still has to be UTF-8 and itself a valid `xprv`
/// string; anything else is reported as [`WalletError::DecryptionFailed`].
pub fn decipher_xprv(encrypted: &str, password: &str) -> Result<Zeroizing<String>, WalletError> {
    let decoded = bech32::decode(encrypted, XPRV_LIMIT).inspect_err(|e| {
        debug!(error = %e, "encrypted xprv bech32 decode failed");
    })?;
    if decoded.hrp != XPRV_PREFIX {
        return Err(WalletError::InvalidHeader(decoded.hrp));
    }
    let payload = decoded.data;
    if payload.len() < MIN_ENCRYPTED_LEN {
        return Err(WalletError::MalformedPayload {
            expected: MIN_ENCRYPTED_LEN,
            got: payload.len(),
        });
    }

    let iv = &payload[..IV_LEN];
    let salt = &payload[IV_LEN..IV_LEN + SALT_LEN];
    let ciphertext = &payload[IV_LEN + SALT_LEN..];

    let key = derive_key(password.as_bytes(), salt);
    let cipher = Aes256CbcDec::new_from_slices(&key[..], iv)
        .map_err(|_| WalletError::DecryptionFailed)?;
    let plaintext = Zeroizing::new(cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|_| {
        warn!("xprv decryption failed: bad padding");
        WalletError::DecryptionFailed
    })?);

    let slip32 = std::str::from_utf8(&plaintext).map_err(|_| {
        warn!("xprv decryption failed: plaintext is not UTF-8");
        WalletError::DecryptionFailed
    })?;
    if !is_xprv_string(slip32) {
        warn!("xprv decryption failed: plaintext is not an xprv string");
        return Err(WalletError::DecryptionFailed);
    }
    Ok(Zeroizing::new(slip32.to_owned()))
}

/// Encrypt an `xprv` string with a random iv and salt from the OS RNG.
pub fn encipher_xprv(slip32: &str, password: &str) -> Result<String, WalletError> {
    use rand::RngCore;
    let mut iv = [0u8; IV_LEN];
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    rand::rngs::OsRng.fill_bytes(&mut salt);
    encipher_xprv_with(slip32, password, &iv, &salt)
}

/// Encrypt an `xprv` string with a caller-chosen iv and salt.
pub fn encipher_xprv_with(
    slip32: &str,
    password: &str,
    iv: &[u8; IV_LEN],
    salt: &[u8; SALT_LEN],
) -> Result<String, WalletError> {
    if !is_xprv_string(slip32) {
        return Err(WalletError::Encryption("input is not an xprv string".into()));
    }
    let key = derive_key(password.as_bytes(), salt);
    let cipher = Aes256CbcEnc::new_from_slices(&key[..], iv)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(slip32.as_bytes());

    let mut payload = Vec::with_capacity(IV_LEN + SALT_LEN + ciphertext.len());
    payload.extend_from_slice(iv);
    payload.extend_from_slice(salt);
    payload.extend_from_slice(&ciphertext);
    Ok(bech32::encode(XPRV_PREFIX, &payload))
}

/// [`decipher_xprv`] followed by [`parse_xprv`].
pub fn decipher_and_parse_xprv(
    encrypted: &str,
    password: &str,
) -> Result<ExtendedKeyMaterial, WalletError> {
    let slip32 = decipher_xprv(encrypted, password)?;
    parse_xprv(&slip32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wit_core::error::DecodeError;

    /// Master key with chain code `0x11..` and secret `0x22..`.
    const MASTER_XPRV: &str = "xprv1qqg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zqpzyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygsd9zvj";

    /// `MASTER_XPRV` under password "password", iv `0x01..`, salt `0x02..`.
    const ENCRYPTED_XPRV: &str = "xprv1qyqszqgpqyqszqgpqyqszqgpqypqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpq97z8u9780gvug5qcm0hyn2r4lgc2777xgskql4jgeyx833unuz9w9rk5emhqwzwl63nl84n79yktcemxfm6lwqdtf4nz53eqkhmzrfds667e3s8y4ysnuqxukkfh9f5yqucv04gy4tuy5ce339fwrhhsavmnctfmp027e436e982akk9kngv46e6akphj8m4zux7jkwrj6a8wuuzwvgw";

    fn payload_with(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut payload = bech32::decode(MASTER_XPRV, XPRV_LIMIT).unwrap().data;
        f(&mut payload);
        bech32::encode(XPRV_PREFIX, &payload)
    }

    // --- Constants ---

    #[test]
    fn limits() {
        assert_eq!(XPRV_LIMIT, 1086);
        assert_eq!(expected_payload_len(0), 66);
        assert_eq!(expected_payload_len(2), 74);
        assert_eq!(MASTER_XPRV.len(), 117);
    }

    // --- parse_xprv ---

    #[test]
    fn parse_known_master_key() {
        let key = parse_xprv(MASTER_XPRV).unwrap();
        assert!(key.key_path.is_empty());
        assert_eq!(key.depth(), 0);
        assert_eq!(key.chain_code, [0x11; 32]);
        assert_eq!(*key.private_key, [0x22; 32]);
        assert_eq!(
            key.private_key().unwrap().public_key(),
            PrivateKey::from_bytes(&[0x22; 32]).unwrap().public_key()
        );
    }

    #[test]
    fn to_slip32_inverts_parse() {
        let key = parse_xprv(MASTER_XPRV).unwrap();
        assert_eq!(key.to_slip32().unwrap(), MASTER_XPRV);
    }

    #[test]
    fn master_constructor() {
        let sk = PrivateKey::from_bytes(&[0x22; 32]).unwrap();
        let key = ExtendedKeyMaterial::master([0x11; 32], &sk);
        assert_eq!(key.to_slip32().unwrap(), MASTER_XPRV);
    }

    #[test]
    fn bad_checksum() {
        let mut s = MASTER_XPRV.to_string();
        let last = s.pop().unwrap();
        s.push(if last == 'q' { 'p' } else { 'q' });
        assert_eq!(
            parse_xprv(&s).unwrap_err(),
            WalletError::Decode(DecodeError::InvalidChecksum)
        );
    }

    #[test]
    fn wrong_prefix() {
        let data = bech32::decode(MASTER_XPRV, XPRV_LIMIT).unwrap().data;
        let xpub = bech32::encode("xpub", &data);
        assert_eq!(
            parse_xprv(&xpub).unwrap_err(),
            WalletError::InvalidHeader("xpub".into())
        );
    }

    #[test]
    fn nonzero_depth_rejected_before_length() {
        let s = payload_with(|p| p[0] = 1);
        assert_eq!(parse_xprv(&s).unwrap_err(), WalletError::UnsupportedKeyDepth(1));
    }

    #[test]
    fn short_payload() {
        let s = payload_with(|p| {
            p.pop();
        });
        assert_eq!(
            parse_xprv(&s).unwrap_err(),
            WalletError::MalformedPayload {
                expected: 66,
                got: 65
            }
        );
    }

    #[test]
    fn empty_payload() {
        let s = bech32::encode(XPRV_PREFIX, &[]);
        assert!(matches!(
            parse_xprv(&s).unwrap_err(),
            WalletError::MalformedPayload { got: 0, .. }
        ));
    }

    #[test]
    fn nonzero_marker_rejected() {
        let s = payload_with(|p| p[33] = 1);
        assert_eq!(parse_xprv(&s).unwrap_err(), WalletError::NotAPrivateKey);
    }

    #[test]
    fn zero_scalar_rejected() {
        let s = payload_with(|p| p[34..].fill(0));
        assert_eq!(parse_xprv(&s).unwrap_err(), WalletError::NotAPrivateKey);
    }

    #[test]
    fn scalar_above_order_rejected() {
        let s = payload_with(|p| p[34..].fill(0xFF));
        assert_eq!(parse_xprv(&s).unwrap_err(), WalletError::NotAPrivateKey);
    }

    #[test]
    fn debug_hides_secret() {
        let key = parse_xprv(MASTER_XPRV).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("ExtendedKeyMaterial"));
        assert!(!debug.contains(&hex::encode([0x22; 32])));
    }

    // --- decipher_xprv ---

    #[test]
    fn decipher_known_vector() {
        assert_eq!(decipher_xprv(ENCRYPTED_XPRV, "password").unwrap().as_str(), MASTER_XPRV);
    }

    #[test]
    fn encipher_known_vector() {
        let encrypted = encipher_xprv_with(MASTER_XPRV, "password", &[1; 16], &[2; 32]).unwrap();
        assert_eq!(encrypted, ENCRYPTED_XPRV);
    }

    #[test]
    fn wrong_password_fails() {
        assert_eq!(
            decipher_xprv(ENCRYPTED_XPRV, "wrong").unwrap_err(),
            WalletError::DecryptionFailed
        );
    }

    #[test]
    fn encipher_random_roundtrip() {
        let a = encipher_xprv(MASTER_XPRV, "hunter2").unwrap();
        let b = encipher_xprv(MASTER_XPRV, "hunter2").unwrap();
        assert_ne!(a, b);
        assert_eq!(decipher_xprv(&a, "hunter2").unwrap().as_str(), MASTER_XPRV);
        assert_eq!(decipher_xprv(&b, "hunter2").unwrap().as_str(), MASTER_XPRV);
    }

    #[test]
    fn decipher_and_parse() {
        let key = decipher_and_parse_xprv(ENCRYPTED_XPRV, "password").unwrap();
        assert_eq!(*key.private_key, [0x22; 32]);
    }

    #[test]
    fn decipher_wrong_prefix() {
        let data = bech32::decode(ENCRYPTED_XPRV, XPRV_LIMIT).unwrap().data;
        let s = bech32::encode("yprv", &data);
        assert_eq!(
            decipher_xprv(&s, "password").unwrap_err(),
            WalletError::InvalidHeader("yprv".into())
        );
    }

    #[test]
    fn decipher_short_payload() {
        let s = bech32::encode(XPRV_PREFIX, &[0u8; 63]);
        assert_eq!(
            decipher_xprv(&s, "password").unwrap_err(),
            WalletError::MalformedPayload {
                expected: 64,
                got: 63
            }
        );
    }

    #[test]
    fn decipher_unaligned_ciphertext() {
        let s = bech32::encode(XPRV_PREFIX, &[0u8; 70]);
        assert_eq!(decipher_xprv(&s, "password").unwrap_err(), WalletError::DecryptionFailed);
    }

    #[test]
    fn decipher_tampered_ciphertext() {
        let mut data = bech32::decode(ENCRYPTED_XPRV, XPRV_LIMIT).unwrap().data;
        let n = data.len();
        data[n - 20] ^= 0x01;
        let s = bech32::encode(XPRV_PREFIX, &data);
        assert_eq!(decipher_xprv(&s, "password").unwrap_err(), WalletError::DecryptionFailed);
    }

    #[test]
    fn decipher_non_xprv_plaintext_rejected() {
        let key = derive_key(b"password", &[2; 32]);
        let cipher = Aes256CbcEnc::new_from_slices(&key[..], &[1; 16]).unwrap();
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(b"not a key at all");
        let mut payload = vec![1u8; 16];
        payload.extend_from_slice(&[2; 32]);
        payload.extend_from_slice(&ciphertext);
        let s = bech32::encode(XPRV_PREFIX, &payload);
        assert_eq!(decipher_xprv(&s, "password").unwrap_err(), WalletError::DecryptionFailed);
    }

    #[test]
    fn encipher_rejects_non_xprv() {
        assert!(matches!(
            encipher_xprv("wit1qqqqqq", "password").unwrap_err(),
            WalletError::Encryption(_)
        ));
    }

    #[test]
    fn derive_key_deterministic() {
        assert_eq!(*derive_key(b"password", b"salt"), *derive_key(b"password", b"salt"));
        assert_ne!(*derive_key(b"password1", b"salt"), *derive_key(b"password2", b"salt"));
    }
}
