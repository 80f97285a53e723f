//! Node continuity statistics
//!
//! Append-only time series of per-node liveness samples. Shares the data
//! feed identity with the ranking store but has no coupling to allocation.

use crate::{
    types::{Address, AuthorizationPolicy, NodeStats},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Continuity samples per node
#[derive(Debug, Clone)]
pub struct NodeContinuityRecorder {
    /// The single identity allowed to push samples
    data_feed: AuthorizationPolicy,

    /// Samples by node, ordered by timestamp
    samples: BTreeMap<Address, BTreeMap<DateTime<Utc>, NodeStats>>,
}

impl NodeContinuityRecorder {
    /// Create an empty recorder
    pub fn new(data_feed: AuthorizationPolicy) -> Self {
        Self {
            data_feed,
            samples: BTreeMap::new(),
        }
    }

    /// Current data feed policy
    pub fn data_feed(&self) -> &AuthorizationPolicy {
        &self.data_feed
    }

    /// Record a sample (data feed only)
    ///
    /// Samples must arrive in strictly increasing timestamp order per node.
    pub fn update_node_stats(
        &mut self,
        caller: &Address,
        address: &Address,
        timestamp: DateTime<Utc>,
        stats: NodeStats,
    ) -> Result<()> {
        self.data_feed.authorize(caller)?;

        let series = self.samples.entry(address.clone()).or_default();
        if let Some((&latest, _)) = series.last_key_value() {
            if timestamp <= latest {
                return Err(Error::StaleUpdate {
                    address: address.clone(),
                    timestamp,
                    latest,
                });
            }
        }

        series.insert(timestamp, stats);
        tracing::debug!("Recorded continuity sample for {} at {}", address, timestamp);
        Ok(())
    }

    /// Timestamps of all samples of `address`, oldest first
    pub fn node_update_timestamps(&self, address: &Address) -> Vec<DateTime<Utc>> {
        self.samples
            .get(address)
            .map(|series| series.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Sample of `address` recorded at `timestamp`
    pub fn node_stats(&self, address: &Address, timestamp: DateTime<Utc>) -> Result<NodeStats> {
        self.samples
            .get(address)
            .and_then(|series| series.get(&timestamp))
            .copied()
            .ok_or_else(|| Error::StatsNotFound {
                address: address.clone(),
                timestamp,
            })
    }

    /// Most recent sample of `address`
    pub fn latest_stats(&self, address: &Address) -> Option<(DateTime<Utc>, NodeStats)> {
        self.samples
            .get(address)
            .and_then(|series| series.last_key_value())
            .map(|(timestamp, stats)| (*timestamp, *stats))
    }
}
