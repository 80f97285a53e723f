//! Configuration for the receipt ledger

use crate::types::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a transfer treats the sender's protocol balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPolicy {
    /// Reject transfers that exceed the sender's free balance
    #[default]
    RestrictToFreeBalance,
    /// Spend free balance first, then clamp protocol balance to the new total
    ///
    /// Protocol balance moved out this way comes back as free balance, so a
    /// holder can unwind protocol stake with a transfer round trip.
    ClampProtocolBalance,
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Minimum amount accepted on the open deposit path
    pub min_deposit_amount: Amount,

    /// Protocol balance handling on transfer
    pub transfer_policy: TransferPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_deposit_amount: Decimal::from(1000),
            transfer_policy: TransferPolicy::default(),
        }
    }
}
