//! Staking coordinator
//!
//! Orchestrates validation, allocation, delegation and settlement of
//! deposits, and routes holder operations to the receipt ledger.
//!
//! # Atomicity
//!
//! Validate and Plan only read the committed state. Settle checks every
//! failure condition before its first write and ends with the ledger mint,
//! which is itself all-or-nothing. While a deposit is in flight no other
//! mutation can run, so the state Settle writes to is the state Plan read.
//! Delegation happens outside the core, so applied lines are compensated
//! through [`DelegationModule::revert_delegation`] on failure.
//!
//! # Reentrancy
//!
//! The delegation module may call back into the coordinator. Reads observe
//! the last committed state; every mutating call fails with
//! [`Error::Reentrancy`] until the deposit returns.

use crate::{
    allocator::CapacityAllocator,
    config::{Config, SurplusAccounting},
    delegation::DelegationModule,
    epoch::EpochClock,
    guard::ReentrancyGuard,
    metrics::Metrics,
    types::*,
    Error, Result,
};
use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use receipt_ledger::{AuthorizationPolicy, LedgerAccount, LedgerEvent, LiquidLedger};
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use validator_oracle::{ValidatorRankingStore, ValidatorRecord};

/// Tunable deposit parameters
#[derive(Debug, Clone)]
struct DepositParams {
    min_stake_amount: Amount,
    max_validator_stake_capacity: Amount,
    epoch: EpochClock,
    surplus_accounting: SurplusAccounting,
}

/// Everything a deposit may change
#[derive(Debug)]
struct ProtocolState {
    params: DepositParams,
    ranking: ValidatorRankingStore,
    ledger: LiquidLedger,
    stake_records: BTreeMap<Address, Amount>,
    events: Vec<StakingEvent>,
}

struct Shared {
    state: RefCell<ProtocolState>,
    in_flight: Cell<bool>,
}

/// Staking coordinator
pub struct StakingCoordinator {
    /// Identity the coordinator mints with
    address: Address,

    /// Administrative authority
    owner: AuthorizationPolicy,

    /// External delegation capability
    delegation: Arc<dyn DelegationModule>,

    /// Committed state
    shared: ReentrantMutex<Shared>,

    /// Metrics
    metrics: Metrics,
}

impl StakingCoordinator {
    /// Create new coordinator
    pub fn new(config: &Config, delegation: Arc<dyn DelegationModule>) -> Result<Self> {
        config.validate()?;
        let protocol = &config.protocol;

        let owner = AuthorizationPolicy::Identity(protocol.owner.clone());
        let address = protocol.coordinator.clone();

        let ledger = LiquidLedger::new(
            owner.clone(),
            AuthorizationPolicy::Identity(address.clone()),
            config.ledger.clone(),
        );
        let ranking = ValidatorRankingStore::new(
            owner.clone(),
            AuthorizationPolicy::Identity(protocol.data_feed.clone()),
        );

        let state = ProtocolState {
            params: DepositParams {
                min_stake_amount: protocol.min_stake_amount,
                max_validator_stake_capacity: protocol.max_validator_stake_capacity,
                epoch: EpochClock::new(protocol.genesis_time, protocol.epoch_duration_seconds),
                surplus_accounting: protocol.surplus_accounting,
            },
            ranking,
            ledger,
            stake_records: BTreeMap::new(),
            events: Vec::new(),
        };

        tracing::info!(
            "Staking coordinator {} ready (min stake {}, capacity {}, epoch {}s)",
            address,
            protocol.min_stake_amount,
            protocol.max_validator_stake_capacity,
            protocol.epoch_duration_seconds
        );

        Ok(Self {
            address,
            owner,
            delegation,
            shared: ReentrantMutex::new(Shared {
                state: RefCell::new(state),
                in_flight: Cell::new(false),
            }),
            metrics: Metrics::new()?,
        })
    }

    /// Identity the coordinator mints with
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // ===== Deposits =====

    /// Stake `request.amount` on behalf of `request.caller`
    ///
    /// Runs Validate, Plan, Delegate and Settle. On any failure nothing is
    /// committed and applied delegations are reverted.
    pub fn stake(&self, request: StakeRequest) -> Result<StakeReceipt> {
        let shared = self.shared.lock();
        let _in_flight = ReentrancyGuard::enter(&shared.in_flight)?;

        match self.run_deposit(&shared.state, &request) {
            Ok(receipt) => {
                self.metrics
                    .record_stake(receipt.staked, receipt.refund(), receipt.plan.lines.len());
                tracing::info!(
                    "Stake accepted: {} staked {} over {} validators, refund {} (epoch {})",
                    receipt.account,
                    receipt.staked,
                    receipt.plan.lines.len(),
                    receipt.refund(),
                    receipt.epoch
                );
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::warn!("Stake aborted for {} ({}): {}", request.caller, request.amount, e);
                Err(e)
            }
        }
    }

    fn run_deposit(&self, state: &RefCell<ProtocolState>, request: &StakeRequest) -> Result<StakeReceipt> {
        // Steps 1 and 2 read the committed state; the borrow ends before delegation
        let plan = {
            let state = state.borrow();

            // Step 1: Validate
            validate_request(&state.params, request)?;

            // Step 2: Plan
            let ranked = state.ranking.list_by_rank(request.block_height);
            let allocator = CapacityAllocator::new(state.params.max_validator_stake_capacity);
            let lookup = |validator: &Address| self.delegation.total_delegated(validator);
            allocator.plan(request.amount, &ranked, &lookup)?
        };

        // Step 3: Delegate
        self.delegate_plan(&plan)?;

        // Step 4: Settle
        let settled = settle(&self.address, &mut state.borrow_mut(), request, plan.clone());
        if settled.is_err() {
            self.revert_lines(&plan.lines);
        }
        settled
    }

    /// Apply every plan line, compensating applied lines on the first failure
    fn delegate_plan(&self, plan: &AllocationPlan) -> Result<()> {
        for (applied, line) in plan.lines.iter().enumerate() {
            if let Err(reason) = self.delegation.delegate(&line.validator, line.amount) {
                self.revert_lines(&plan.lines[..applied]);
                return Err(Error::Delegation {
                    validator: line.validator.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    fn revert_lines(&self, lines: &[AllocationLine]) {
        for line in lines.iter().rev() {
            if let Err(e) = self.delegation.revert_delegation(&line.validator, line.amount) {
                tracing::error!(
                    "Failed to revert delegation of {} to {}: {}",
                    line.amount,
                    line.validator,
                    e
                );
            }
        }
    }

    // ===== Holder operations =====

    /// Transfer receipt tokens
    pub fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.mutate(|state| Ok(state.ledger.transfer(caller, to, amount)?))
    }

    /// Set the allowance of `spender` over the caller's balance
    pub fn approve(&self, caller: &Address, spender: &Address, amount: Amount) -> Result<()> {
        self.mutate(|state| Ok(state.ledger.approve(caller, spender, amount)?))
    }

    /// Transfer on behalf of `from` within the caller's allowance
    pub fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.mutate(|state| Ok(state.ledger.transfer_from(spender, from, to, amount)?))
    }

    /// Credit free balance through the open deposit path
    ///
    /// Free balance carries no delegation and may be transferred or burned.
    pub fn mint_free(&self, account: &Address, amount: Amount) -> Result<()> {
        self.mutate(|state| Ok(state.ledger.mint_free(account, amount)?))
    }

    /// Burn from the caller's own free balance
    pub fn burn(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.mutate(|state| Ok(state.ledger.burn(caller, caller, amount)?))
    }

    // ===== Oracle =====

    /// Push a validator record (data feed only)
    pub fn update_validator_record(
        &self,
        caller: &Address,
        address: &Address,
        record: ValidatorRecord,
    ) -> Result<()> {
        self.mutate(|state| Ok(state.ranking.update_record(caller, address, record)?))
    }

    /// Push a validator record, rejecting windows closed at `current_height`
    pub fn update_validator_record_at(
        &self,
        caller: &Address,
        address: &Address,
        record: ValidatorRecord,
        current_height: BlockHeight,
    ) -> Result<()> {
        self.mutate(|state| {
            Ok(state
                .ranking
                .update_record_at(caller, address, record, current_height)?)
        })
    }

    // ===== Administration =====

    /// Change the smallest accepted deposit
    pub fn set_min_stake_amount(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.authorize_owner(caller)?;
        if amount < Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }
        self.mutate(|state| {
            state.params.min_stake_amount = amount;
            tracing::info!("Minimum stake set to {}", amount);
            Ok(())
        })
    }

    /// Change the per-validator delegation ceiling
    pub fn set_max_validator_stake_capacity(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.authorize_owner(caller)?;
        if amount < Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }
        self.mutate(|state| {
            state.params.max_validator_stake_capacity = amount;
            tracing::info!("Validator stake capacity set to {}", amount);
            Ok(())
        })
    }

    /// Change the epoch length
    pub fn set_epoch_duration(&self, caller: &Address, seconds: u64) -> Result<()> {
        self.authorize_owner(caller)?;
        if seconds == 0 {
            return Err(Error::InvalidConfig("epoch duration must be positive".to_string()));
        }
        self.mutate(|state| {
            state.params.epoch = state.params.epoch.with_duration(seconds);
            tracing::info!("Epoch duration set to {}s", seconds);
            Ok(())
        })
    }

    /// Rotate the ranking data feed
    pub fn set_data_feed(&self, caller: &Address, data_feed: Address) -> Result<()> {
        self.authorize_owner(caller)?;
        self.mutate(|state| {
            Ok(state
                .ranking
                .set_data_feed(caller, AuthorizationPolicy::Identity(data_feed))?)
        })
    }

    fn authorize_owner(&self, caller: &Address) -> Result<()> {
        self.owner.authorize(caller).map_err(|e| {
            tracing::warn!("Rejected administrative call from {}", caller);
            Error::from(e)
        })
    }

    // ===== Queries =====

    /// Smallest accepted deposit
    pub fn min_stake_amount(&self) -> Amount {
        self.read(|state| state.params.min_stake_amount)
    }

    /// Per-validator delegation ceiling
    pub fn max_validator_stake_capacity(&self) -> Amount {
        self.read(|state| state.params.max_validator_stake_capacity)
    }

    /// Epoch length in seconds
    pub fn epoch_duration(&self) -> u64 {
        self.read(|state| state.params.epoch.duration_seconds())
    }

    /// Epoch containing `now`
    pub fn current_epoch(&self, now: DateTime<Utc>) -> u64 {
        self.read(|state| state.params.epoch.current_epoch(now))
    }

    /// Instant `epoch` begins
    pub fn epoch_start(&self, epoch: u64) -> Option<DateTime<Utc>> {
        self.read(|state| state.params.epoch.epoch_start(epoch))
    }

    /// Ledger account of `address`
    pub fn account(&self, address: &Address) -> LedgerAccount {
        self.read(|state| state.ledger.account(address))
    }

    /// Outstanding receipt tokens
    pub fn total_supply(&self) -> Amount {
        self.read(|state| state.ledger.total_supply())
    }

    /// Allowance of `spender` over `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.read(|state| state.ledger.allowance(owner, spender))
    }

    /// Cumulative recorded stake of `address`
    pub fn staked_amount(&self, address: &Address) -> Amount {
        self.read(|state| {
            state
                .stake_records
                .get(address)
                .copied()
                .unwrap_or(Decimal::ZERO)
        })
    }

    /// All stake records in address order
    pub fn stake_records(&self) -> BTreeMap<Address, Amount> {
        self.read(|state| state.stake_records.clone())
    }

    /// Coordinator events, oldest first
    pub fn events(&self) -> Vec<StakingEvent> {
        self.read(|state| state.events.clone())
    }

    /// Ledger events, oldest first
    pub fn ledger_events(&self) -> Vec<LedgerEvent> {
        self.read(|state| state.ledger.events().to_vec())
    }

    /// Validators live at `height`, best rank first
    pub fn ranked_validators(&self, height: BlockHeight) -> Vec<ValidatorRecord> {
        self.read(|state| state.ranking.list_by_rank(height))
    }

    /// Record of `address`
    pub fn validator_record(&self, address: &Address) -> Result<ValidatorRecord> {
        self.read(|state| Ok(state.ranking.get_record(address)?.clone()))
    }

    /// Hash of the committed ledger balances
    pub fn ledger_state_hash(&self) -> Result<[u8; 32]> {
        self.read(|state| Ok(state.ledger.state_hash()?))
    }

    /// Check ledger supply conservation and per-account consistency
    pub fn check_invariants(&self) -> Result<()> {
        self.read(|state| Ok(state.ledger.check_supply_conservation()?))
    }

    // ===== Internals =====

    fn read<R>(&self, f: impl FnOnce(&ProtocolState) -> R) -> R {
        let shared = self.shared.lock();
        let state = shared.state.borrow();
        f(&state)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut ProtocolState) -> Result<R>) -> Result<R> {
        let shared = self.shared.lock();
        ReentrancyGuard::check(&shared.in_flight)?;
        let mut state = shared.state.borrow_mut();
        f(&mut state)
    }
}

impl fmt::Debug for StakingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakingCoordinator")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

fn validate_request(params: &DepositParams, request: &StakeRequest) -> Result<()> {
    if request.amount < params.min_stake_amount {
        return Err(Error::StakeAmountTooLow {
            amount: request.amount,
            min_stake: params.min_stake_amount,
        });
    }
    if request.value_sent < request.amount {
        return Err(Error::StakeValueTooLow {
            value_sent: request.value_sent,
            amount: request.amount,
        });
    }
    Ok(())
}

/// Apply a delegated plan to the committed state
///
/// Every check runs before the first write, so an error leaves `state` as it was.
fn settle(
    minter: &Address,
    state: &mut ProtocolState,
    request: &StakeRequest,
    plan: AllocationPlan,
) -> Result<StakeReceipt> {
    let staked = plan.allocated();
    let surplus = plan.surplus();
    let excess_value = request.value_sent - request.amount;

    let recorded = match state.params.surplus_accounting {
        SurplusAccounting::Settled => staked,
        SurplusAccounting::Requested => request.amount,
    };
    let record = state
        .stake_records
        .get(&request.caller)
        .copied()
        .unwrap_or(Decimal::ZERO)
        .checked_add(recorded)
        .ok_or(Error::Overflow)?;

    // Last fallible step; the ledger leaves itself untouched on error
    state.ledger.mint_protocol(minter, &request.caller, staked)?;
    state.stake_records.insert(request.caller.clone(), record);

    let epoch = state.params.epoch.current_epoch(request.timestamp);
    state.events.push(StakingEvent::Staked {
        account: request.caller.clone(),
        amount: staked,
        epoch,
    });

    Ok(StakeReceipt {
        account: request.caller.clone(),
        requested: request.amount,
        staked,
        surplus,
        excess_value,
        plan,
        epoch,
    })
}
