//! Error types for the staking coordinator

use crate::delegation::DelegationError;
use receipt_ledger::{Address, Amount};
use thiserror::Error;

/// Result type for staking operations
pub type Result<T> = std::result::Result<T, Error>;

/// Staking errors
#[derive(Error, Debug)]
pub enum Error {
    /// Receipt ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[source] receipt_ledger::Error),

    /// Validator oracle error
    #[error("Oracle error: {0}")]
    Oracle(#[source] validator_oracle::Error),

    /// Caller lacks the identity the operation requires
    #[error("Unauthorized caller: {caller}")]
    Unauthorized {
        /// Rejected caller
        caller: Address,
    },

    /// Deposit below the configured minimum
    #[error("Stake amount too low: {amount} < {min_stake}")]
    StakeAmountTooLow {
        /// Requested amount
        amount: Amount,
        /// Configured minimum
        min_stake: Amount,
    },

    /// Attached value does not cover the requested amount
    #[error("Stake value too low: sent {value_sent}, amount {amount}")]
    StakeValueTooLow {
        /// Value attached to the request
        value_sent: Amount,
        /// Requested amount
        amount: Amount,
    },

    /// Zero or negative amount where a positive one is required
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    /// No ranked validator can take any part of the deposit
    #[error("No validator capacity for {requested}")]
    NoCapacity {
        /// Amount that found no room
        requested: Amount,
    },

    /// Delegation module refused a plan line
    #[error("Delegation to {validator} failed: {reason}")]
    Delegation {
        /// Validator of the failing line
        validator: Address,
        /// Underlying refusal
        #[source]
        reason: DelegationError,
    },

    /// A mutating call arrived while a deposit is in flight
    #[error("Reentrant call rejected while a deposit is in progress")]
    Reentrancy,

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Authorization failures surface as `Unauthorized` whichever component rejected them

impl From<receipt_ledger::Error> for Error {
    fn from(err: receipt_ledger::Error) -> Self {
        match err {
            receipt_ledger::Error::Unauthorized { caller } => Error::Unauthorized { caller },
            other => Error::Ledger(other),
        }
    }
}

impl From<validator_oracle::Error> for Error {
    fn from(err: validator_oracle::Error) -> Self {
        match err {
            validator_oracle::Error::Unauthorized { caller } => Error::Unauthorized { caller },
            validator_oracle::Error::Ledger(inner) => Error::from(inner),
            other => Error::Oracle(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_unauthorized_has_one_shape() {
        let mallory = Address::new("mallory");

        let from_ledger = Error::from(receipt_ledger::Error::Unauthorized {
            caller: mallory.clone(),
        });
        let from_oracle = Error::from(validator_oracle::Error::Unauthorized {
            caller: mallory.clone(),
        });

        assert!(matches!(from_ledger, Error::Unauthorized { ref caller } if caller == &mallory));
        assert!(matches!(from_oracle, Error::Unauthorized { ref caller } if caller == &mallory));
    }

    #[test]
    fn test_other_component_errors_are_wrapped() {
        let err = Error::from(receipt_ledger::Error::InvalidAmount(Decimal::from(-1)));
        assert!(matches!(err, Error::Ledger(receipt_ledger::Error::InvalidAmount(_))));

        let err = Error::from(validator_oracle::Error::NotFound(Address::new("v1")));
        assert!(matches!(err, Error::Oracle(validator_oracle::Error::NotFound(_))));
    }
}
