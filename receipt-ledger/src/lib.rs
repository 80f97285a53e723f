//! Receipt Ledger
//!
//! Dual-balance accounting for the liquid staking receipt token.
//!
//! # Architecture
//!
//! - **Dual balance**: every account tracks its total balance and the part of
//!   it that was minted by the staking protocol
//! - **Asymmetric burns**: holders burn free balance only, the protocol
//!   minter burns protocol balance only
//! - **Injected authorization**: privileged entry points are checked against
//!   [`AuthorizationPolicy`] values, never against ambient state

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - `0 <= protocol_balance <= total_balance` for every account
//! - Supply conservation: Σ(total balances) == total supply
//! - Protocol balance travels with mint, never with transfer
//! - Failed operations leave no partial effect

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod auth;
pub mod ledger;
pub mod config;
pub mod error;

// Re-exports
pub use auth::AuthorizationPolicy;
pub use config::{LedgerConfig, TransferPolicy};
pub use error::{Error, Result};
pub use ledger::LiquidLedger;
pub use types::{
    Address, Amount, BlockHeight, BurnRequest, LedgerAccount, LedgerEvent, LedgerEventKind,
    MintKind,
};
