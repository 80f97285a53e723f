//! Deposit simulator binary
//!
//! Usage: `staking-sim <scenario.json> [config.toml]`
//!
//! Without a config file the configuration comes from `STAKING_*`
//! environment variables. Receipts and errors are printed as JSON lines.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use staking::{
    Address, Amount, BlockHeight, Config, InMemoryDelegation, StakeRequest, StakingCoordinator,
};
use std::sync::Arc;
use validator_oracle::ValidatorRecord;

#[derive(Debug, Deserialize)]
struct Scenario {
    validators: Vec<ScenarioValidator>,
    deposits: Vec<ScenarioDeposit>,
}

#[derive(Debug, Deserialize)]
struct ScenarioValidator {
    #[serde(flatten)]
    record: ValidatorRecord,
    #[serde(default)]
    delegated: Amount,
}

#[derive(Debug, Deserialize)]
struct ScenarioDeposit {
    caller: Address,
    amount: Amount,
    value_sent: Option<Amount>,
    block_height: BlockHeight,
    timestamp: Option<DateTime<Utc>>,
}

impl ScenarioDeposit {
    fn into_request(self) -> StakeRequest {
        let mut request = StakeRequest::new(self.caller, self.amount, self.block_height);
        if let Some(value_sent) = self.value_sent {
            request = request.with_value(value_sent);
        }
        if let Some(timestamp) = self.timestamp {
            request = request.at(timestamp);
        }
        request
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let scenario_path = args
        .next()
        .context("usage: staking-sim <scenario.json> [config.toml]")?;

    // Load configuration
    let config = match args.next() {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    let content = std::fs::read_to_string(&scenario_path)
        .with_context(|| format!("reading {}", scenario_path))?;
    let scenario: Scenario =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", scenario_path))?;

    tracing::info!(
        "Starting {} with {} validators and {} deposits",
        config.service_name,
        scenario.validators.len(),
        scenario.deposits.len()
    );

    let delegation = Arc::new(InMemoryDelegation::new());
    let coordinator = StakingCoordinator::new(&config, delegation.clone())?;

    let feed = config.protocol.data_feed.clone();
    for validator in scenario.validators {
        let address = validator.record.address.clone();
        delegation.register(address.clone(), validator.delegated);
        coordinator
            .update_validator_record(&feed, &address, validator.record)
            .with_context(|| format!("registering validator {}", address))?;
    }

    for deposit in scenario.deposits {
        let caller = deposit.caller.clone();
        let line = match coordinator.stake(deposit.into_request()) {
            Ok(receipt) => json!({
                "caller": caller,
                "refund": receipt.refund(),
                "receipt": receipt,
            }),
            Err(e) => json!({
                "caller": caller,
                "error": e.to_string(),
            }),
        };
        println!("{}", line);
    }

    coordinator.check_invariants()?;
    tracing::info!(
        "Simulation finished: {} settled, {} aborted, supply {}",
        coordinator.metrics().stakes_total.get(),
        coordinator.metrics().stake_failures_total.get(),
        coordinator.total_supply()
    );

    Ok(())
}
