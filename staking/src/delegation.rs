//! Delegation module interface
//!
//! The coordinator never trusts the module: every call may fail, and a
//! failed deposit compensates the lines already applied through
//! [`DelegationModule::revert_delegation`].

use crate::types::{Address, Amount};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors reported by a delegation module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegationError {
    /// Validator not registered with the module
    #[error("Unknown validator: {0}")]
    UnknownValidator(Address),

    /// Zero or negative delegation amount
    #[error("Invalid delegation amount: {0}")]
    InvalidAmount(Amount),

    /// Reversal larger than what is delegated
    #[error("Cannot revert {requested}, only {delegated} delegated")]
    RevertExceedsDelegation {
        /// Requested reversal
        requested: Amount,
        /// Currently delegated
        delegated: Amount,
    },

    /// Module-specific refusal
    #[error("Delegation rejected: {0}")]
    Rejected(String),
}

/// External delegation capability
pub trait DelegationModule: Send + Sync {
    /// Delegate `amount` to `validator`
    fn delegate(&self, validator: &Address, amount: Amount) -> Result<(), DelegationError>;

    /// Total currently delegated to `validator`, `None` if unknown
    fn total_delegated(&self, validator: &Address) -> Option<Amount>;

    /// Undo an earlier successful `delegate` call
    fn revert_delegation(&self, validator: &Address, amount: Amount) -> Result<(), DelegationError>;
}

/// In-memory delegation module
#[derive(Debug, Default)]
pub struct InMemoryDelegation {
    /// Delegated totals by validator
    totals: RwLock<BTreeMap<Address, Amount>>,
}

impl InMemoryDelegation {
    /// Create an empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a module with validators and their initial totals
    pub fn with_validators(validators: impl IntoIterator<Item = (Address, Amount)>) -> Self {
        Self {
            totals: RwLock::new(validators.into_iter().collect()),
        }
    }

    /// Register a validator (keeps its total if already known)
    pub fn register(&self, validator: Address, initial: Amount) {
        self.totals.write().entry(validator).or_insert(initial);
    }

    /// Copy of all totals
    pub fn snapshot(&self) -> BTreeMap<Address, Amount> {
        self.totals.read().clone()
    }
}

impl DelegationModule for InMemoryDelegation {
    fn delegate(&self, validator: &Address, amount: Amount) -> Result<(), DelegationError> {
        if amount <= Decimal::ZERO {
            return Err(DelegationError::InvalidAmount(amount));
        }

        let mut totals = self.totals.write();
        let total = totals
            .get_mut(validator)
            .ok_or_else(|| DelegationError::UnknownValidator(validator.clone()))?;
        *total = total
            .checked_add(amount)
            .ok_or_else(|| DelegationError::Rejected("delegated total overflow".to_string()))?;

        tracing::debug!("Delegated {} to {} (total {})", amount, validator, total);
        Ok(())
    }

    fn total_delegated(&self, validator: &Address) -> Option<Amount> {
        self.totals.read().get(validator).copied()
    }

    fn revert_delegation(&self, validator: &Address, amount: Amount) -> Result<(), DelegationError> {
        let mut totals = self.totals.write();
        let total = totals
            .get_mut(validator)
            .ok_or_else(|| DelegationError::UnknownValidator(validator.clone()))?;
        if amount > *total {
            return Err(DelegationError::RevertExceedsDelegation {
                requested: amount,
                delegated: *total,
            });
        }

        *total -= amount;
        tracing::debug!("Reverted {} from {} (total {})", amount, validator, total);
        Ok(())
    }
}
