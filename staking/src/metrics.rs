//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `staking_stakes_total` - Deposits settled
//! - `staking_stake_failures_total` - Deposits aborted
//! - `staking_staked_amount_total` - Native amount delegated
//! - `staking_surplus_refunded_total` - Native amount refunded
//! - `staking_allocation_lines` - Histogram of plan lengths
//!
//! Each collector owns its registry, so several coordinators can live in
//! one process.

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Registry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Deposits settled
    pub stakes_total: IntCounter,

    /// Deposits aborted
    pub stake_failures_total: IntCounter,

    /// Native amount delegated
    pub staked_amount_total: Counter,

    /// Native amount refunded (surplus plus excess value)
    pub surplus_refunded_total: Counter,

    /// Plan length histogram
    pub allocation_lines: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let stakes_total = IntCounter::new("staking_stakes_total", "Deposits settled")?;
        registry.register(Box::new(stakes_total.clone()))?;

        let stake_failures_total =
            IntCounter::new("staking_stake_failures_total", "Deposits aborted")?;
        registry.register(Box::new(stake_failures_total.clone()))?;

        let staked_amount_total =
            Counter::new("staking_staked_amount_total", "Native amount delegated")?;
        registry.register(Box::new(staked_amount_total.clone()))?;

        let surplus_refunded_total =
            Counter::new("staking_surplus_refunded_total", "Native amount refunded")?;
        registry.register(Box::new(surplus_refunded_total.clone()))?;

        let allocation_lines = Histogram::with_opts(
            HistogramOpts::new("staking_allocation_lines", "Histogram of plan lengths")
                .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
        )?;
        registry.register(Box::new(allocation_lines.clone()))?;

        Ok(Self {
            stakes_total,
            stake_failures_total,
            staked_amount_total,
            surplus_refunded_total,
            allocation_lines,
            registry,
        })
    }

    /// Record a settled deposit
    pub fn record_stake(&self, staked: Decimal, refunded: Decimal, lines: usize) {
        self.stakes_total.inc();
        self.staked_amount_total.inc_by(to_f64(staked));
        self.surplus_refunded_total.inc_by(to_f64(refunded));
        self.allocation_lines.observe(lines as f64);
    }

    /// Record an aborted deposit
    pub fn record_failure(&self) {
        self.stake_failures_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("stakes_total", &self.stakes_total.get())
            .field("stake_failures_total", &self.stake_failures_total.get())
            .finish_non_exhaustive()
    }
}

// Counters only move forward
fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0).max(0.0)
}
