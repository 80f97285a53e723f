//! Error types for the receipt ledger

use crate::types::{Address, Amount};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not allowed to perform a privileged operation
    #[error("Unauthorized caller: {caller}")]
    Unauthorized {
        /// Rejected caller
        caller: Address,
    },

    /// Negative amounts are never valid
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    /// Direct deposit below the configured minimum
    #[error("Deposit amount too low: {amount} < {min_deposit}")]
    DepositAmountTooLow {
        /// Deposited amount
        amount: Amount,
        /// Configured minimum
        min_deposit: Amount,
    },

    /// Holder burn exceeds free balance
    #[error(
        "Insufficient user balance for burn: requested {requested}, available {available}, free {free_available}"
    )]
    InsufficientUserBalanceForBurn {
        /// Requested burn amount
        requested: Amount,
        /// Total balance of the account
        available: Amount,
        /// Free (non-protocol) balance of the account
        free_available: Amount,
    },

    /// Minter burn exceeds protocol balance
    #[error(
        "Insufficient protocol balance for burn: requested {requested}, protocol available {protocol_available}"
    )]
    InsufficientProtocolBalanceForBurn {
        /// Requested burn amount
        requested: Amount,
        /// Protocol balance of the account
        protocol_available: Amount,
    },

    /// Transfer exceeds the sender's total balance
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Requested transfer amount
        requested: Amount,
        /// Total balance of the sender
        available: Amount,
    },

    /// Transfer exceeds the sender's free balance under a restrictive policy
    #[error("Insufficient free balance: requested {requested}, free {free_available}")]
    InsufficientFreeBalance {
        /// Requested transfer amount
        requested: Amount,
        /// Free balance of the sender
        free_available: Amount,
    },

    /// Spender allowance too small
    #[error("Allowance exceeded: requested {requested}, allowance {allowance}")]
    AllowanceExceeded {
        /// Requested amount
        requested: Amount,
        /// Remaining allowance
        allowance: Amount,
    },

    /// Decimal arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Invariant violation (balance split, supply conservation)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
