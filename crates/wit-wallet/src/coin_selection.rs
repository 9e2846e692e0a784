//! UTXO selection strategies.
//!
//! Orders the candidate outputs by strategy, drops the ones still
//! timelocked, then takes outputs until the target is covered. The coverage
//! walk keeps an output while the total gathered *before* it is still
//! `<= target`, so an exactly met target pulls in one more output.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wit_core::address::PublicKeyHash;
use wit_core::coins::Coins;
use wit_core::types::Hash256;

use crate::error::WalletError;

/// An unspent output as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub transaction_id: Hash256,
    pub output_index: u32,
    /// Value in pedros.
    pub value: u64,
    /// Unix seconds before which the output cannot be spent; 0 when unlocked.
    pub timelock: u64,
    pub owner: PublicKeyHash,
}

impl Utxo {
    pub fn is_spendable_at(&self, now: u64) -> bool {
        self.timelock <= now
    }
}

/// How candidate outputs are ordered before selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtxoSelectionStrategy {
    /// Largest values first.
    BigFirst,
    /// Uniform random order.
    Random,
    /// Largest values first, preferring one output that covers the target alone.
    #[default]
    SlimFit,
    /// Smallest values first.
    SmallFirst,
}

impl UtxoSelectionStrategy {
    pub const ALL: [UtxoSelectionStrategy; 4] = [
        UtxoSelectionStrategy::BigFirst,
        UtxoSelectionStrategy::Random,
        UtxoSelectionStrategy::SlimFit,
        UtxoSelectionStrategy::SmallFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UtxoSelectionStrategy::BigFirst => "big-first",
            UtxoSelectionStrategy::Random => "random",
            UtxoSelectionStrategy::SlimFit => "slim-fit",
            UtxoSelectionStrategy::SmallFirst => "small-first",
        }
    }
}

impl fmt::Display for UtxoSelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtxoSelectionStrategy {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| WalletError::InvalidStrategy(s.to_string()))
    }
}

/// Select outputs to cover `target` using the current time and thread RNG.
pub fn select_utxos(
    utxos: &[Utxo],
    target: Option<&Coins>,
    strategy: UtxoSelectionStrategy,
) -> Vec<Utxo> {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    select_utxos_at(utxos, target, strategy, now, &mut rand::thread_rng())
}

/// Select outputs to cover `target` as of unix time `now`.
///
/// Without a target, or with a zero target, every spendable output is
/// returned in strategy order.
pub fn select_utxos_at<R: Rng + ?Sized>(
    utxos: &[Utxo],
    target: Option<&Coins>,
    strategy: UtxoSelectionStrategy,
    now: u64,
    rng: &mut R,
) -> Vec<Utxo> {
    let mut ordered = utxos.to_vec();
    match strategy {
        UtxoSelectionStrategy::BigFirst | UtxoSelectionStrategy::SlimFit => {
            ordered.sort_by(|a, b| b.value.cmp(&a.value));
        }
        UtxoSelectionStrategy::SmallFirst => ordered.sort_by_key(|u| u.value),
        UtxoSelectionStrategy::Random => ordered.shuffle(rng),
    }
    ordered.retain(|u| u.is_spendable_at(now));

    let target = match target {
        Some(t) if !t.is_zero() => t,
        _ => {
            debug!(%strategy, selected = ordered.len(), "no target, selecting all spendable");
            return ordered;
        }
    };

    if strategy == UtxoSelectionStrategy::SlimFit {
        let fit = ordered.iter().position(|u| *target >= u.value);
        if let Some(index) = fit.filter(|&i| i >= 1) {
            debug!(%strategy, value = ordered[index - 1].value, "single output covers target");
            return vec![ordered.swap_remove(index - 1)];
        }
    }

    let mut covered = Coins::zero();
    let selected: Vec<Utxo> = ordered
        .into_iter()
        .take_while(|u| {
            let keep = covered <= *target;
            covered += u.value;
            keep
        })
        .collect();
    debug!(%strategy, selected = selected.len(), %target, "utxos selected");
    selected
}

/// Summary of a cached UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoCacheInfo {
    /// Total value spendable at the time of the snapshot.
    pub expendable: Coins,
    /// Number of cached outputs, locked or not.
    pub size: usize,
    /// Earliest timelock still in the future, if any.
    pub timelock: Option<u64>,
}

impl UtxoCacheInfo {
    pub fn from_utxos(utxos: &[Utxo], now: u64) -> Self {
        let expendable = utxos
            .iter()
            .filter(|u| u.is_spendable_at(now))
            .map(|u| Coins::from(u.value))
            .sum();
        let timelock = utxos
            .iter()
            .map(|u| u.timelock)
            .filter(|&t| t > now)
            .min();
        Self {
            expendable,
            size: utxos.len(),
            timelock,
        }
    }
}
