//! Exact fixed-point currency amounts.
//!
//! [`Coins`] counts pedros (10^9 pedros = 1 wit) in an arbitrary-precision
//! integer. Every comparison and every sum happens on that integer; floats
//! only appear at the edges, as an input format ([`Coins::from_wits`]) or a
//! display format ([`Coins::wits`]), and both crossings have explicit
//! rounding rules:
//!
//! - float in: floor toward negative infinity at 9 decimal places
//! - string out: truncate toward zero at the requested number of decimals
//! - float out: refused above 2^53 - 1 whole wits

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::constants::{MAX_SAFE_INTEGER, PEDROS_PER_WIT, WIT_DECIMALS};
use crate::error::AmountError;

/// An exact amount of pedros. May be negative.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coins(BigInt);

impl Coins {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Amount from a raw pedro count.
    pub fn from_pedros(pedros: impl Into<BigInt>) -> Self {
        Self(pedros.into())
    }

    /// Nanowits are pedros under another name.
    pub fn from_nanowits(nanowits: impl Into<BigInt>) -> Self {
        Self::from_pedros(nanowits)
    }

    /// Convert a wit float to pedros, flooring at the ninth decimal.
    ///
    /// The float is rendered to its shortest round-trip decimal form and
    /// the integer and fractional digits are converted separately, so
    /// `1.23456789` becomes exactly `1234567890` pedros instead of picking
    /// up the binary representation error of `0.23456789 * 1e9`.
    ///
    /// Non-finite input has no integer counterpart and yields
    /// [`AmountError::NotFinite`]; use [`pedros_from_wits`] where the float
    /// should pass through unchanged.
    pub fn from_wits(wits: f64) -> Result<Self, AmountError> {
        if !wits.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if wits.abs().floor() > MAX_SAFE_INTEGER as f64 {
            return Err(AmountError::AmountTooLarge(format!(
                "too many wits: {wits} > {MAX_SAFE_INTEGER}"
            )));
        }
        floor_pedros(&wits.to_string()).map(Self)
    }

    /// Sum of the locked, staked and unlocked parts of a balance.
    pub fn from_balance(balance: &Balance) -> Self {
        Self::from_pedros(balance.locked) + Self::from_pedros(balance.staked)
            + Self::from_pedros(balance.unlocked)
    }

    pub fn pedros(&self) -> &BigInt {
        &self.0
    }

    pub fn nanowits(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Amount as a wit float, for callers that must render one.
    ///
    /// Fails with [`AmountError::AmountTooLarge`] when the whole-wit part
    /// exceeds 2^53 - 1 and would lose precision as an `f64`.
    pub fn wits(&self) -> Result<f64, AmountError> {
        let unit = BigInt::from(PEDROS_PER_WIT);
        let quotient = &self.0 / &unit;
        if quotient.abs() > BigInt::from(MAX_SAFE_INTEGER) {
            return Err(AmountError::AmountTooLarge(format!(
                "too many coins: {quotient} > {MAX_SAFE_INTEGER}"
            )));
        }
        let rest = &self.0 - &quotient * &unit;
        let whole = quotient.to_f64().unwrap_or(f64::NAN);
        let fraction = rest.to_f64().unwrap_or(f64::NAN) / PEDROS_PER_WIT as f64;
        Ok(whole + fraction)
    }

    /// Decimal wit string with exactly `decimals` fractional digits.
    ///
    /// Digits beyond `decimals` are dropped, never rounded. With
    /// `decimals == 0` only the integer part is printed.
    pub fn to_display_string(&self, decimals: usize) -> String {
        let unit = BigInt::from(PEDROS_PER_WIT);
        let magnitude = self.0.abs();
        let whole = &magnitude / &unit;
        let fraction = &magnitude % &unit;

        let mut out = String::new();
        if self.0.sign() == Sign::Minus {
            out.push('-');
        }
        out.push_str(&whole.to_string());
        if decimals == 0 {
            return out;
        }

        let mut digits = format!("{:0>width$}", fraction.to_string(), width = WIT_DECIMALS);
        if decimals <= WIT_DECIMALS {
            digits.truncate(decimals);
        } else {
            digits.extend(std::iter::repeat_n('0', decimals - WIT_DECIMALS));
        }
        out.push('.');
        out.push_str(&digits);
        out
    }
}

/// Wit float to pedro float, flooring at the ninth decimal.
///
/// Same rule as [`Coins::from_wits`], but infinities and NaN propagate
/// unchanged instead of failing.
pub fn pedros_from_wits(wits: f64) -> f64 {
    if !wits.is_finite() {
        return wits;
    }
    match floor_pedros(&wits.to_string()) {
        Ok(pedros) => pedros.to_f64().unwrap_or(f64::NAN),
        Err(_) => f64::NAN,
    }
}

/// Floor a plain decimal wit string (no exponent) to whole pedros.
fn floor_pedros(decimal: &str) -> Result<BigInt, AmountError> {
    let invalid = || AmountError::InvalidAmount(decimal.to_string());

    let s = decimal.trim();
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole = if int_part.is_empty() {
        BigInt::zero()
    } else {
        int_part.parse::<BigInt>().map_err(|_| invalid())?
    };

    let kept = &frac_part[..frac_part.len().min(WIT_DECIMALS)];
    let dropped = &frac_part[kept.len()..];
    let fraction: u64 = format!("{kept:0<width$}", width = WIT_DECIMALS)
        .parse()
        .map_err(|_| invalid())?;

    let magnitude = whole * BigInt::from(PEDROS_PER_WIT) + BigInt::from(fraction);
    if !negative {
        return Ok(magnitude);
    }
    // Floor toward negative infinity: any discarded digit moves one pedro down.
    let remainder = dropped.bytes().any(|b| b != b'0');
    Ok(-magnitude - BigInt::from(u8::from(remainder)))
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string(WIT_DECIMALS))
    }
}

/// Parses a decimal wit string such as `"3.141592653"`.
impl FromStr for Coins {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        floor_pedros(s).map(Self)
    }
}

impl From<u64> for Coins {
    fn from(pedros: u64) -> Self {
        Self::from_pedros(pedros)
    }
}

impl From<i64> for Coins {
    fn from(pedros: i64) -> Self {
        Self::from_pedros(pedros)
    }
}

impl From<BigInt> for Coins {
    fn from(pedros: BigInt) -> Self {
        Self(pedros)
    }
}

/// Compare against a raw pedro count such as a UTXO value.
impl PartialEq<u64> for Coins {
    fn eq(&self, other: &u64) -> bool {
        self.0 == BigInt::from(*other)
    }
}

impl PartialOrd<u64> for Coins {
    fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
        Some(self.0.cmp(&BigInt::from(*other)))
    }
}

impl AddAssign<u64> for Coins {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl Add for Coins {
    type Output = Coins;

    fn add(self, rhs: Coins) -> Coins {
        Coins(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Coins> for &'a Coins {
    type Output = Coins;

    fn add(self, rhs: &'a Coins) -> Coins {
        Coins(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Coins> for Coins {
    fn add_assign(&mut self, rhs: &Coins) {
        self.0 += &rhs.0;
    }
}

impl Sub for Coins {
    type Output = Coins;

    fn sub(self, rhs: Coins) -> Coins {
        Coins(self.0 - rhs.0)
    }
}

impl Sum for Coins {
    fn sum<I: Iterator<Item = Coins>>(iter: I) -> Self {
        iter.fold(Coins::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Coins> for Coins {
    fn sum<I: Iterator<Item = &'a Coins>>(iter: I) -> Self {
        iter.fold(Coins::zero(), |acc, c| &acc + c)
    }
}

/// Pedros as a decimal integer string; JSON numbers cannot hold them exactly.
impl Serialize for Coins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<BigInt>()
            .map(Self)
            .map_err(|_| serde::de::Error::custom(format!("invalid pedro amount: {s:?}")))
    }
}

/// Balance record reported by a node, in pedros.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub locked: u64,
    pub staked: u64,
    pub unlocked: u64,
}

impl Balance {
    pub fn total(&self) -> Coins {
        Coins::from_balance(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_with_raw_pedros() {
        let c = Coins::from_pedros(25u64);
        assert!(c > 10u64);
        assert!(c <= 25u64);
        assert!(c == 25u64);
        assert!(Coins::from_pedros(-1i64) < 0u64);
        let mut acc = Coins::zero();
        acc += 7u64;
        acc += 8u64;
        assert_eq!(acc, Coins::from(15u64));
    }

    fn wits(w: f64) -> i64 {
        Coins::from_wits(w).unwrap().pedros().to_i64().unwrap()
    }

    // --- from_wits ---

    #[test]
    fn from_wits_floors_at_ninth_decimal() {
        assert_eq!(wits(1.23456789), 1_234_567_890);
        assert_eq!(wits(0.000000001), 1);
        assert_eq!(wits(0.9999999999), 999_999_999);
    }

    #[test]
    fn from_wits_integers() {
        assert_eq!(wits(0.0), 0);
        assert_eq!(wits(2.0), 2_000_000_000);
        assert_eq!(wits(100.0), 100_000_000_000);
    }

    #[test]
    fn from_wits_below_one_pedro() {
        assert_eq!(wits(0.0000000001), 0);
    }

    #[test]
    fn from_wits_negative_floors_down() {
        assert_eq!(wits(-1.5), -1_500_000_000);
        assert_eq!(wits(-0.999999999), -999_999_999);
        assert_eq!(wits(-0.0000000001), -1);
        assert_eq!(wits(-0.0), 0);
    }

    #[test]
    fn from_wits_rejects_non_finite() {
        assert_eq!(Coins::from_wits(f64::INFINITY).unwrap_err(), AmountError::NotFinite);
        assert_eq!(Coins::from_wits(f64::NEG_INFINITY).unwrap_err(), AmountError::NotFinite);
        assert_eq!(Coins::from_wits(f64::NAN).unwrap_err(), AmountError::NotFinite);
    }

    #[test]
    fn from_wits_rejects_unsafe_integer_part() {
        assert!(matches!(
            Coins::from_wits(1e16).unwrap_err(),
            AmountError::AmountTooLarge(_)
        ));
        assert!(Coins::from_wits(MAX_SAFE_INTEGER as f64).is_ok());
    }

    // --- pedros_from_wits ---

    #[test]
    fn pedros_from_wits_matches_coins() {
        assert_eq!(pedros_from_wits(1.23456789), 1_234_567_890.0);
        assert_eq!(pedros_from_wits(-1.5), -1_500_000_000.0);
        assert_eq!(pedros_from_wits(0.0), 0.0);
    }

    #[test]
    fn pedros_from_wits_propagates_non_finite() {
        assert_eq!(pedros_from_wits(f64::INFINITY), f64::INFINITY);
        assert_eq!(pedros_from_wits(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert!(pedros_from_wits(f64::NAN).is_nan());
    }

    // --- FromStr ---

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("3.141592653".parse::<Coins>().unwrap(), Coins::from(3_141_592_653u64));
        assert_eq!("0.123456789".parse::<Coins>().unwrap(), Coins::from(123_456_789u64));
        assert_eq!("0".parse::<Coins>().unwrap(), Coins::zero());
        assert_eq!("0.0000000001".parse::<Coins>().unwrap(), Coins::zero());
        assert_eq!("-0.999999999".parse::<Coins>().unwrap(), Coins::from(-999_999_999i64));
        assert_eq!(".5".parse::<Coins>().unwrap(), Coins::from(500_000_000u64));
    }

    #[test]
    fn parse_rejects_garbage() {
        for s in ["", "-", ".", "NaN", "1e-9", "1.2.3", "12a"] {
            assert!(
                matches!(s.parse::<Coins>(), Err(AmountError::InvalidAmount(_))),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_beyond_float_range_is_exact() {
        let c: Coins = "123456789012345678901234567890.123456789".parse().unwrap();
        assert_eq!(
            c.pedros().to_string(),
            "123456789012345678901234567890123456789"
        );
    }

    // --- to_display_string ---

    #[test]
    fn display_string_truncates() {
        let c = Coins::from(1_234_567_891u64);
        assert_eq!(c.to_display_string(2), "1.23");
        assert_eq!(c.to_display_string(9), "1.234567891");
        assert_eq!(Coins::from(1_239_000_000u64).to_display_string(2), "1.23");
    }

    #[test]
    fn display_string_pads() {
        assert_eq!(Coins::from(1_200_000_000u64).to_display_string(4), "1.2000");
        assert_eq!(Coins::from(10_000_000_000u64).to_display_string(3), "10.000");
        assert_eq!(Coins::from(1u64).to_display_string(12), "0.000000001000");
    }

    #[test]
    fn display_string_zero_decimals() {
        assert_eq!(Coins::from(123_456_000_000u64).to_display_string(0), "123");
        assert_eq!(Coins::from(-99_990_000_000i64).to_display_string(0), "-99");
    }

    #[test]
    fn display_string_negative_truncates_magnitude() {
        assert_eq!(Coins::from(-1_299_900_000i64).to_display_string(2), "-1.29");
    }

    #[test]
    fn display_uses_nine_decimals() {
        assert_eq!(Coins::from(42u64).to_string(), "0.000000042");
    }

    // --- wits ---

    #[test]
    fn wits_float() {
        assert_eq!(Coins::from(1_500_000_000u64).wits().unwrap(), 1.5);
        assert_eq!(Coins::from(-2_250_000_000i64).wits().unwrap(), -2.25);
    }

    #[test]
    fn wits_guard() {
        let limit = BigInt::from(MAX_SAFE_INTEGER) * BigInt::from(PEDROS_PER_WIT);
        assert!(Coins::from_pedros(limit.clone()).wits().is_ok());
        let over = Coins::from_pedros(limit + BigInt::from(PEDROS_PER_WIT));
        assert!(matches!(over.wits().unwrap_err(), AmountError::AmountTooLarge(_)));
    }

    // --- Balance / arithmetic ---

    #[test]
    fn balance_total() {
        let b = Balance {
            locked: u64::MAX,
            staked: u64::MAX,
            unlocked: 1,
        };
        let expected = BigInt::from(u64::MAX) * 2 + 1;
        assert_eq!(b.total().pedros(), &expected);
        assert_eq!(Coins::from_balance(&b), b.total());
    }

    #[test]
    fn arithmetic_and_ordering() {
        let a = Coins::from(10u64);
        let b = Coins::from(30u64);
        assert!(a < b);
        assert_eq!(&a + &b, Coins::from(40u64));
        assert_eq!(a.clone() - b.clone(), Coins::from(-20i64));
        assert_eq!(vec![a, b].into_iter().sum::<Coins>(), Coins::from(40u64));
    }

    #[test]
    fn serde_as_pedro_string() {
        let c = Coins::from(1_234_567_890u64);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"1234567890\"");
        assert_eq!(serde_json::from_str::<Coins>(&json).unwrap(), c);
        assert!(serde_json::from_str::<Coins>("\"1.5\"").is_err());
    }
}
