//! Core types for the validator oracle

use serde::{Deserialize, Serialize};

/// Account or validator address
pub type Address = receipt_ledger::Address;

/// Block height of the host chain
pub type BlockHeight = receipt_ledger::BlockHeight;

/// Who may push updates
pub type AuthorizationPolicy = receipt_ledger::AuthorizationPolicy;

/// Validator quality record pushed by the data feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Validator address
    pub address: Address,

    /// Rank (1 = best); need not be contiguous
    pub rank: u32,

    /// Quality rating
    pub rating: u64,

    /// Yield in basis points
    pub apy_basis_points: u32,

    /// First block the record is live at
    pub valid_from: BlockHeight,

    /// First block the record is no longer live at
    pub valid_to: BlockHeight,
}

impl ValidatorRecord {
    /// Check whether the record is live at `height`
    pub fn is_live_at(&self, height: BlockHeight) -> bool {
        self.valid_from <= height && height < self.valid_to
    }

    /// Check whether the record's window has closed at `height`
    pub fn is_expired_at(&self, height: BlockHeight) -> bool {
        self.valid_to <= height
    }
}

/// Node continuity sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// DAG blocks produced
    pub dags_count: u64,

    /// Unix time of the last DAG block
    pub last_dag_timestamp: i64,

    /// Unix time of the last PBFT block
    pub last_pbft_timestamp: i64,

    /// Unix time of the last transaction
    pub last_transaction_timestamp: i64,

    /// PBFT blocks produced
    pub pbft_count: u64,

    /// Transactions processed
    pub transactions_count: u64,
}
