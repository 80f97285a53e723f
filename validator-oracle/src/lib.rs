//! Validator Oracle
//!
//! Ranked, block-windowed validator quality records and per-node continuity
//! statistics, both fed by a single authorized data feed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod ranking;
pub mod continuity;

pub use error::{Error, Result};
pub use types::*;
pub use ranking::ValidatorRankingStore;
pub use continuity::NodeContinuityRecorder;
