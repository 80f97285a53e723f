//! Configuration for the staking coordinator

use crate::types::{Address, Amount};
use chrono::{DateTime, Utc};
use receipt_ledger::LedgerConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the stake record counts when part of a deposit is refunded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurplusAccounting {
    /// Only the delegated part
    #[default]
    Settled,
    /// The full requested amount
    Requested,
}

/// Staking coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Deposit parameters and identities
    pub protocol: ProtocolConfig,

    /// Receipt ledger configuration
    pub ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "staking-coordinator".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol: ProtocolConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Administrative identity
    pub owner: Address,

    /// Identity allowed to push validator records
    pub data_feed: Address,

    /// Identity the coordinator mints with
    pub coordinator: Address,

    /// Smallest accepted deposit
    pub min_stake_amount: Amount,

    /// Per-validator delegation ceiling
    pub max_validator_stake_capacity: Amount,

    /// Epoch length in seconds (default: 1000)
    pub epoch_duration_seconds: u64,

    /// Start of epoch 1
    pub genesis_time: DateTime<Utc>,

    /// Stake record accounting on partial refunds
    pub surplus_accounting: SurplusAccounting,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            owner: Address::new("owner"),
            data_feed: Address::new("data-feed"),
            coordinator: Address::new("staking-coordinator"),
            min_stake_amount: Decimal::from(1000),
            max_validator_stake_capacity: Decimal::from(80_000_000),
            epoch_duration_seconds: 1000,
            genesis_time: DateTime::<Utc>::default(),
            surplus_accounting: SurplusAccounting::default(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(owner) = std::env::var("STAKING_OWNER") {
            config.protocol.owner = Address::new(owner);
        }

        if let Ok(feed) = std::env::var("STAKING_DATA_FEED") {
            config.protocol.data_feed = Address::new(feed);
        }

        if let Ok(amount) = std::env::var("STAKING_MIN_STAKE") {
            config.protocol.min_stake_amount = parse_env("STAKING_MIN_STAKE", &amount)?;
        }

        if let Ok(amount) = std::env::var("STAKING_MAX_VALIDATOR_CAPACITY") {
            config.protocol.max_validator_stake_capacity =
                parse_env("STAKING_MAX_VALIDATOR_CAPACITY", &amount)?;
        }

        if let Ok(seconds) = std::env::var("STAKING_EPOCH_DURATION") {
            config.protocol.epoch_duration_seconds = parse_env("STAKING_EPOCH_DURATION", &seconds)?;
        }

        if let Ok(genesis) = std::env::var("STAKING_GENESIS_TIME") {
            config.protocol.genesis_time = DateTime::parse_from_rfc3339(&genesis)
                .map_err(|e| crate::Error::Config(format!("STAKING_GENESIS_TIME: {}", e)))?
                .with_timezone(&Utc);
        }

        if let Ok(amount) = std::env::var("STAKING_MIN_DEPOSIT") {
            config.ledger.min_deposit_amount = parse_env("STAKING_MIN_DEPOSIT", &amount)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the coordinator cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let protocol = &self.protocol;

        if protocol.epoch_duration_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "epoch duration must be positive".to_string(),
            ));
        }
        if protocol.min_stake_amount < Decimal::ZERO {
            return Err(crate::Error::InvalidConfig(format!(
                "negative minimum stake: {}",
                protocol.min_stake_amount
            )));
        }
        if protocol.max_validator_stake_capacity < Decimal::ZERO {
            return Err(crate::Error::InvalidConfig(format!(
                "negative validator capacity: {}",
                protocol.max_validator_stake_capacity
            )));
        }
        if self.ledger.min_deposit_amount < Decimal::ZERO {
            return Err(crate::Error::InvalidConfig(format!(
                "negative minimum deposit: {}",
                self.ledger.min_deposit_amount
            )));
        }

        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> crate::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::Config(format!("{}: {}", name, e)))
}
