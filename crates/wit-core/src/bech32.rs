//! Bech32 checksummed encoding ([BIP-173]).
//!
//! Witnet encodes both addresses (`wit1...`, `twit1...`) and extended keys
//! (`xprv1...`) as plain Bech32: the human-readable part, the `1`
//! separator, the payload bytes regrouped into 5-bit values, and a 6-value
//! checksum. Unlike segwit addresses there is no witness version value in
//! front of the payload.
//!
//! The standard 90-character cap only applies to addresses; extended keys
//! are much longer, so callers pass their own limit to [`decode`].
//!
//! [BIP-173]: https://github.com/bitcoin/bips/blob/master/bip-0173.mediawiki

use crate::error::DecodeError;

/// Bech32 checksum constant (BIP-173).
const BECH32_CONST: u32 = 1;

/// Bech32 character set for encoding 5-bit values.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Number of checksum characters at the end of every string.
const CHECKSUM_LEN: usize = 6;

/// Maximum string length for addresses (BIP-173).
pub const ADDRESS_LIMIT: usize = 90;

/// Result of decoding a Bech32 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Lowercased human-readable part.
    pub hrp: String,
    /// Payload converted back to 8-bit bytes.
    pub data: Vec<u8>,
}

/// Encode `data` under `hrp`. The output is always lowercase.
pub fn encode(hrp: &str, data: &[u8]) -> String {
    let words = to_words(data);
    let checksum = create_checksum(hrp, &words);

    let mut result = String::with_capacity(hrp.len() + 1 + words.len() + CHECKSUM_LEN);
    result.push_str(hrp);
    result.push('1');
    for &d in words.iter().chain(checksum.iter()) {
        result.push(CHARSET[d as usize] as char);
    }
    result
}

/// Decode a Bech32 string of at most `limit` characters.
pub fn decode(s: &str, limit: usize) -> Result<Decoded, DecodeError> {
    if s.len() > limit {
        return Err(DecodeError::TooLong { len: s.len(), max: limit });
    }

    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(DecodeError::MixedCase);
    }

    let s_lower = s.to_ascii_lowercase();

    let sep_pos = s_lower.rfind('1').ok_or(DecodeError::MissingSeparator)?;
    if sep_pos == 0 {
        return Err(DecodeError::InvalidHrp);
    }
    if sep_pos + 1 + CHECKSUM_LEN > s_lower.len() {
        return Err(DecodeError::InvalidLength);
    }

    let hrp = &s_lower[..sep_pos];
    if hrp.bytes().any(|b| !(33..=126).contains(&b)) {
        return Err(DecodeError::InvalidHrp);
    }

    let mut values = Vec::with_capacity(s_lower.len() - sep_pos - 1);
    for c in s_lower[sep_pos + 1..].chars() {
        let pos = CHARSET
            .iter()
            .position(|&ch| ch as char == c)
            .ok_or(DecodeError::InvalidCharacter(c))?;
        values.push(pos as u8);
    }

    if !verify_checksum(hrp, &values) {
        return Err(DecodeError::InvalidChecksum);
    }

    let words = &values[..values.len() - CHECKSUM_LEN];
    let data = from_words(words).ok_or(DecodeError::InvalidPadding)?;

    Ok(Decoded {
        hrp: hrp.to_string(),
        data,
    })
}

/// Regroup 8-bit bytes into padded 5-bit words.
pub fn to_words(data: &[u8]) -> Vec<u8> {
    // 8 -> 5 with padding cannot fail: every input value fits in 8 bits.
    convert_bits(data, 8, 5, true).unwrap_or_default()
}

/// Regroup 5-bit words into bytes, rejecting non-zero padding.
pub fn from_words(words: &[u8]) -> Option<Vec<u8>> {
    convert_bits(words, 5, 8, false)
}

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut ret = Vec::with_capacity(hrp.len() * 2 + 1);
    for c in hrp.bytes() {
        ret.push(c >> 5);
    }
    ret.push(0);
    for c in hrp.bytes() {
        ret.push(c & 31);
    }
    ret
}

fn create_checksum(hrp: &str, words: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(words);
    values.extend_from_slice(&[0; CHECKSUM_LEN]);
    let pm = polymod(&values) ^ BECH32_CONST;
    let mut checksum = [0u8; CHECKSUM_LEN];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((pm >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

fn verify_checksum(hrp: &str, values: &[u8]) -> bool {
    let mut all = hrp_expand(hrp);
    all.extend_from_slice(values);
    polymod(&all) == BECH32_CONST
}

fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}
