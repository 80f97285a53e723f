//! Staking Coordinator
//!
//! Turns native-asset deposits into delegations and receipt tokens.
//!
//! # Architecture

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! Every deposit runs through four steps, all-or-nothing:
//!
//! 1. **Validate**: amount against the minimum stake, attached value against amount
//! 2. **Plan**: split the amount over ranked validators, best first, up to
//!    the per-validator capacity
//! 3. **Delegate**: one call into the delegation module per plan line
//! 4. **Settle**: mint protocol balance for what was placed, refund the rest
//!
//! # Allocation Algorithm
//!
//! Greedy best-validator-first bin fill:
//! - Validators are visited once, in ascending rank
//! - Each takes `min(room, remaining)` where `room = capacity − delegated`
//! - Whatever is left when the list runs out is surplus and is refunded
//!
//! # Example
//!
//! ```no_run
//! use staking::{Config, InMemoryDelegation, StakeRequest, StakingCoordinator};
//! use std::sync::Arc;
//!
//! fn main() -> staking::Result<()> {
//!     let config = Config::default();
//!     let delegation = Arc::new(InMemoryDelegation::new());
//!     let coordinator = StakingCoordinator::new(&config, delegation)?;
//!
//!     let amount = rust_decimal::Decimal::from(5_000);
//!     let receipt = coordinator.stake(StakeRequest::new("alice", amount, 0))?;
//!     println!("Staked {}, refunded {}", receipt.staked, receipt.refund());
//!
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod allocator;
pub mod epoch;
pub mod delegation;
pub mod guard;
pub mod error;
pub mod config;
pub mod metrics;
pub mod coordinator;

// Re-exports
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, ProtocolConfig, SurplusAccounting};
pub use allocator::CapacityAllocator;
pub use epoch::EpochClock;
pub use delegation::{DelegationError, DelegationModule, InMemoryDelegation};
pub use coordinator::StakingCoordinator;
