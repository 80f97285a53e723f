//! Core types for the receipt ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Total ordering of identifiers (no reliance on hash iteration order)
//! - Exact arithmetic (Decimal for token amounts)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount (exact decimal)
pub type Amount = Decimal;

/// Block height of the host chain
pub type BlockHeight = u64;

/// Account or validator address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Balances held by one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Everything the account holds
    pub total_balance: Amount,

    /// Part of the total that was minted through the staking flow
    pub protocol_balance: Amount,
}

impl LedgerAccount {
    /// Balance not originating from the staking flow
    pub fn free_balance(&self) -> Amount {
        self.total_balance - self.protocol_balance
    }

    /// Check `0 <= protocol_balance <= total_balance`
    pub fn is_consistent(&self) -> bool {
        self.protocol_balance >= Decimal::ZERO && self.protocol_balance <= self.total_balance
    }
}

/// Burn request, tagged by the authority the caller holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurnRequest {
    /// Holder burns its own free balance
    Holder {
        /// Account burning (and calling)
        account: Address,
    },

    /// Protocol minter unwinds protocol balance
    Privileged {
        /// Calling minter
        minter: Address,
        /// Account whose protocol balance is burned
        account: Address,
    },
}

impl BurnRequest {
    /// Account whose balance is reduced
    pub fn account(&self) -> &Address {
        match self {
            BurnRequest::Holder { account } => account,
            BurnRequest::Privileged { account, .. } => account,
        }
    }
}

/// Origin of minted balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintKind {
    /// Minted by the staking coordinator
    Protocol,
    /// Acquired through the open deposit path
    Free,
}

/// Ledger event emitted once per successful operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the event log
    pub sequence: u64,

    /// What happened
    pub kind: LedgerEventKind,
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEventKind {
    /// Balance minted
    Minted {
        /// Credited account
        account: Address,
        /// Minted amount
        amount: Amount,
        /// Origin of the balance
        kind: MintKind,
    },

    /// Balance burned
    Burned {
        /// Debited account
        account: Address,
        /// Burned amount
        amount: Amount,
    },

    /// Balance moved between accounts
    Transferred {
        /// Sender
        from: Address,
        /// Receiver
        to: Address,
        /// Moved amount
        amount: Amount,
    },

    /// Allowance set
    Approved {
        /// Balance owner
        owner: Address,
        /// Allowed spender
        spender: Address,
        /// New allowance
        amount: Amount,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_balance() {
        let account = LedgerAccount {
            total_balance: Decimal::from(1200),
            protocol_balance: Decimal::from(1000),
        };
        assert_eq!(account.free_balance(), Decimal::from(200));
        assert!(account.is_consistent());
    }

    #[test]
    fn test_inconsistent_account() {
        let account = LedgerAccount {
            total_balance: Decimal::from(100),
            protocol_balance: Decimal::from(150),
        };
        assert!(!account.is_consistent());
    }

    #[test]
    fn test_address_ordering() {
        let mut addresses = vec![Address::new("0xc"), Address::new("0xa"), Address::new("0xb")];
        addresses.sort();
        assert_eq!(addresses[0].as_str(), "0xa");
        assert_eq!(addresses[2].to_string(), "0xc");
    }

    #[test]
    fn test_burn_request_account() {
        let request = BurnRequest::Privileged {
            minter: Address::new("minter"),
            account: Address::new("alice"),
        };
        assert_eq!(request.account(), &Address::new("alice"));
    }
}
