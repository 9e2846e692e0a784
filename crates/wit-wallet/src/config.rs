//! Toolkit configuration and logging setup for front ends.
//!
//! [`ToolkitConfig`] carries the network, default UTXO strategy and log
//! settings. Values come from [`Default`] and can be overridden through
//! `WIT_*` environment variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wit_core::address::Network;

use crate::coin_selection::UtxoSelectionStrategy;
use crate::error::WalletError;

pub const ENV_NETWORK: &str = "WIT_NETWORK";
pub const ENV_UTXO_STRATEGY: &str = "WIT_UTXO_STRATEGY";
pub const ENV_LOG_LEVEL: &str = "WIT_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "WIT_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(WalletError::Config(format!("unknown log format: {other}"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Settings shared by every toolkit front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Network whose address prefix is used for rendering.
    pub network: Network,
    /// Strategy used when the caller does not pick one.
    pub utxo_strategy: UtxoSelectionStrategy,
    /// Log level filter string (e.g. "info", "debug", "wit_wallet=trace").
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            utxo_strategy: UtxoSelectionStrategy::SlimFit,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ToolkitConfig {
    /// Load overrides from the process environment.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup(ENV_NETWORK) {
            config.network = network
                .parse()
                .map_err(|_| WalletError::Config(format!("{ENV_NETWORK}: unknown network {network:?}")))?;
        }
        if let Some(strategy) = lookup(ENV_UTXO_STRATEGY) {
            config.utxo_strategy = strategy
                .parse()
                .map_err(|e| WalletError::Config(format!("{ENV_UTXO_STRATEGY}: {e}")))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            if level.trim().is_empty() {
                return Err(WalletError::Config(format!("{ENV_LOG_LEVEL} must not be empty")));
            }
            config.log_level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.log_format = format
                .parse()
                .map_err(|e| WalletError::Config(format!("{ENV_LOG_FORMAT}: {e}")))?;
        }

        Ok(config)
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_tracing(&self) -> Result<(), WalletError> {
        init_tracing(&self.log_level, self.log_format)
    }
}

/// Install a global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<(), WalletError> {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init(),
    };
    result.map_err(|e| WalletError::Config(format!("tracing init: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ToolkitConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.utxo_strategy, UtxoSelectionStrategy::SlimFit);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let config = ToolkitConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ToolkitConfig::default());
    }

    #[test]
    fn overrides_applied() {
        let config = ToolkitConfig::from_lookup(lookup_from(&[
            (ENV_NETWORK, "testnet"),
            (ENV_UTXO_STRATEGY, "small-first"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "json"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.utxo_strategy, UtxoSelectionStrategy::SmallFirst);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_network() {
        let err = ToolkitConfig::from_lookup(lookup_from(&[(ENV_NETWORK, "devnet")])).unwrap_err();
        assert!(matches!(err, WalletError::Config(msg) if msg.contains(ENV_NETWORK)));
    }

    #[test]
    fn invalid_strategy() {
        let err =
            ToolkitConfig::from_lookup(lookup_from(&[(ENV_UTXO_STRATEGY, "fastest")])).unwrap_err();
        assert!(matches!(err, WalletError::Config(msg) if msg.contains("fastest")));
    }

    #[test]
    fn invalid_log_format() {
        let err = ToolkitConfig::from_lookup(lookup_from(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn empty_log_level_rejected() {
        let err = ToolkitConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, " ")])).unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = ToolkitConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"slim-fit\""));
        assert!(json.contains("\"mainnet\""));
        assert_eq!(serde_json::from_str::<ToolkitConfig>(&json).unwrap(), config);
    }

    #[test]
    fn second_tracing_init_fails() {
        // Whatever the first call returns, a subscriber is installed afterwards.
        let _ = init_tracing("info", LogFormat::Text);
        assert!(matches!(
            init_tracing("debug", LogFormat::Json).unwrap_err(),
            WalletError::Config(_)
        ));
    }
}
