//! Capacity-bounded validator allocation
//!
//! Greedy best-validator-first bin fill over a ranked validator list.
//!
//! # Algorithm
//!
//! 1. Walk validators in the given (rank) order
//! 2. `room = max(0, capacity − delegated)`; validators reporting a negative
//!    total are treated as unknown
//! 3. `take = min(room, remaining)`, appended when positive
//! 4. Stop when nothing remains or the list is exhausted
//!
//! # Example
//!
//! ```text
//! Capacity: 1000
//!   A (rank 1): delegated 500   -> room 500
//!   B (rank 2): delegated 0     -> room 1000
//!
//! Deposit 700:
//!   A takes 500
//!   B takes 200
//!
//! Surplus: 0
//! ```

use crate::{types::*, Error, Result};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use validator_oracle::ValidatorRecord;

/// Lookup of the amount already delegated to a validator
///
/// `None` means the validator is unknown to the delegation side.
pub trait ValidatorStateSource {
    /// Total currently delegated to `validator`
    fn total_delegated(&self, validator: &Address) -> Option<Amount>;
}

impl<F> ValidatorStateSource for F
where
    F: Fn(&Address) -> Option<Amount>,
{
    fn total_delegated(&self, validator: &Address) -> Option<Amount> {
        self(validator)
    }
}

/// Capacity allocator
#[derive(Debug, Clone, Copy)]
pub struct CapacityAllocator {
    /// Per-validator delegation ceiling
    max_capacity: Amount,
}

impl CapacityAllocator {
    /// Create allocator with the given per-validator ceiling
    pub fn new(max_capacity: Amount) -> Self {
        Self { max_capacity }
    }

    /// Per-validator ceiling
    pub fn max_capacity(&self) -> Amount {
        self.max_capacity
    }

    /// Split `amount` over `ranked`, best first
    ///
    /// The residual after the list is exhausted is the plan's surplus.
    pub fn plan(
        &self,
        amount: Amount,
        ranked: &[ValidatorRecord],
        state: &impl ValidatorStateSource,
    ) -> Result<AllocationPlan> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        let mut remaining = amount;
        let mut lines = Vec::new();
        let mut visited = BTreeSet::new();

        for record in ranked {
            if remaining.is_zero() {
                break;
            }
            if !visited.insert(&record.address) {
                continue;
            }

            let Some(delegated) = state.total_delegated(&record.address) else {
                tracing::debug!("Skipping {}: unknown to delegation module", record.address);
                continue;
            };

            let Some(room) = self.room(delegated) else {
                tracing::warn!(
                    "Skipping {}: unusable delegated total {}",
                    record.address,
                    delegated
                );
                continue;
            };

            let take = room.min(remaining);
            if take > Decimal::ZERO {
                lines.push(AllocationLine {
                    validator: record.address.clone(),
                    amount: take,
                });
                remaining -= take;
            }
        }

        if lines.is_empty() {
            return Err(Error::NoCapacity { requested: amount });
        }

        let plan = AllocationPlan {
            requested: amount,
            lines,
        };

        tracing::debug!(
            "Allocation plan: {} lines, {} placed, {} surplus",
            plan.lines.len(),
            plan.allocated(),
            plan.surplus()
        );

        Ok(plan)
    }

    /// Remaining room of a validator holding `delegated`
    ///
    /// `None` for a negative total or one whose room does not fit an `Amount`.
    fn room(&self, delegated: Amount) -> Option<Amount> {
        if delegated < Decimal::ZERO {
            return None;
        }
        self.max_capacity
            .checked_sub(delegated)
            .map(|room| room.max(Decimal::ZERO))
    }
}
