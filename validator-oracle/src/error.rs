//! Error types for the validator oracle

use crate::types::{Address, BlockHeight};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Oracle error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not the data feed (or owner, for administrative writes)
    #[error("Unauthorized caller: {caller}")]
    Unauthorized {
        /// Rejected caller
        caller: Address,
    },

    /// No record for this validator
    #[error("Validator record not found: {0}")]
    NotFound(Address),

    /// No statistics recorded at this timestamp
    #[error("Node stats not found: {address} at {timestamp}")]
    StatsNotFound {
        /// Node address
        address: Address,
        /// Requested timestamp
        timestamp: DateTime<Utc>,
    },

    /// Record keyed under a different address than it describes
    #[error("Record address {record} does not match key {key}")]
    AddressMismatch {
        /// Address the update was keyed under
        key: Address,
        /// Address inside the record
        record: Address,
    },

    /// Record window already closed at the current height
    #[error("Stale record: window ends at {valid_to}, current height {current_height}")]
    StaleRecord {
        /// End of the record's window (exclusive)
        valid_to: BlockHeight,
        /// Height at which the update arrived
        current_height: BlockHeight,
    },

    /// Statistics older than (or equal to) the latest recorded sample
    #[error("Stale update for {address}: {timestamp} is not after {latest}")]
    StaleUpdate {
        /// Node address
        address: Address,
        /// Rejected timestamp
        timestamp: DateTime<Utc>,
        /// Latest recorded timestamp
        latest: DateTime<Utc>,
    },

    /// Shared primitive error other than authorization
    #[error("Ledger error: {0}")]
    Ledger(receipt_ledger::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

impl From<receipt_ledger::Error> for Error {
    fn from(err: receipt_ledger::Error) -> Self {
        match err {
            receipt_ledger::Error::Unauthorized { caller } => Error::Unauthorized { caller },
            other => Error::Ledger(other),
        }
    }
}
