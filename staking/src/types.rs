//! Core types for the staking coordinator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use receipt_ledger::{Address, Amount, BlockHeight};

/// Portion of a deposit assigned to one validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// Receiving validator
    pub validator: Address,
    /// Amount to delegate (always positive)
    pub amount: Amount,
}

/// Split of a deposit across validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Amount the plan was built for
    pub requested: Amount,
    /// Lines in rank order
    pub lines: Vec<AllocationLine>,
}

impl AllocationPlan {
    /// Sum of all lines
    pub fn allocated(&self) -> Amount {
        self.lines.iter().map(|line| line.amount).sum()
    }

    /// Part of the request no validator could take
    pub fn surplus(&self) -> Amount {
        self.requested - self.allocated()
    }

    /// True if nothing was placed
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Deposit request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRequest {
    /// Depositor
    pub caller: Address,
    /// Amount to stake
    pub amount: Amount,
    /// Native value attached to the call
    pub value_sent: Amount,
    /// Block height used for the validator liveness window
    pub block_height: BlockHeight,
    /// Wall-clock time used for epoch accounting
    pub timestamp: DateTime<Utc>,
}

impl StakeRequest {
    /// Request whose attached value equals the amount, stamped now
    pub fn new(caller: impl Into<Address>, amount: Amount, block_height: BlockHeight) -> Self {
        Self {
            caller: caller.into(),
            amount,
            value_sent: amount,
            block_height,
            timestamp: Utc::now(),
        }
    }

    /// Override the attached value
    pub fn with_value(mut self, value_sent: Amount) -> Self {
        self.value_sent = value_sent;
        self
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Outcome of a successful deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeReceipt {
    /// Depositor
    pub account: Address,
    /// Amount requested
    pub requested: Amount,
    /// Amount delegated and minted as protocol balance
    pub staked: Amount,
    /// Part of the request no validator could take
    pub surplus: Amount,
    /// Attached value above the requested amount
    pub excess_value: Amount,
    /// Executed plan
    pub plan: AllocationPlan,
    /// Epoch the deposit landed in
    pub epoch: u64,
}

impl StakeReceipt {
    /// Total native value returned to the depositor
    pub fn refund(&self) -> Amount {
        self.surplus + self.excess_value
    }

    /// True if any value goes back to the depositor
    pub fn has_refund(&self) -> bool {
        self.refund() > Decimal::ZERO
    }
}

/// Coordinator event log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingEvent {
    /// A deposit settled
    Staked {
        /// Depositor
        account: Address,
        /// Amount delegated
        amount: Amount,
        /// Epoch at settlement
        epoch: u64,
    },
}
