//! Validator ranking store
//!
//! Holds one quality record per validator. Records are written only by the
//! data feed, replaced wholesale on update, and never deleted: they expire
//! when the current block height leaves their `[valid_from, valid_to)`
//! window.

use crate::{
    types::{Address, AuthorizationPolicy, BlockHeight, ValidatorRecord},
    Error, Result,
};
use std::collections::BTreeMap;

/// Ranked validator records
#[derive(Debug, Clone)]
pub struct ValidatorRankingStore {
    /// Administrative authority (data feed rotation)
    owner: AuthorizationPolicy,

    /// The single identity allowed to push records
    data_feed: AuthorizationPolicy,

    /// Records by validator address
    records: BTreeMap<Address, ValidatorRecord>,
}

impl ValidatorRankingStore {
    /// Create an empty store
    pub fn new(owner: AuthorizationPolicy, data_feed: AuthorizationPolicy) -> Self {
        Self {
            owner,
            data_feed,
            records: BTreeMap::new(),
        }
    }

    /// Current data feed policy
    pub fn data_feed(&self) -> &AuthorizationPolicy {
        &self.data_feed
    }

    /// Rotate the data feed (owner only)
    pub fn set_data_feed(&mut self, caller: &Address, data_feed: AuthorizationPolicy) -> Result<()> {
        self.owner.authorize(caller)?;
        tracing::info!("Ranking data feed changed to {:?}", data_feed.holder());
        self.data_feed = data_feed;
        Ok(())
    }

    /// Replace the record of `address` (data feed only)
    ///
    /// Replacement is unconditional: no field of the previous record
    /// survives. Writing identical data twice is a no-op the second time.
    pub fn update_record(
        &mut self,
        caller: &Address,
        address: &Address,
        record: ValidatorRecord,
    ) -> Result<()> {
        self.data_feed.authorize(caller)?;
        if &record.address != address {
            return Err(Error::AddressMismatch {
                key: address.clone(),
                record: record.address,
            });
        }

        tracing::debug!(
            "Validator {} ranked {} (rating {}, apy {} bps, blocks {}..{})",
            address,
            record.rank,
            record.rating,
            record.apy_basis_points,
            record.valid_from,
            record.valid_to
        );
        self.records.insert(address.clone(), record);
        Ok(())
    }

    /// Replace the record of `address`, rejecting windows already closed at
    /// `current_height`
    pub fn update_record_at(
        &mut self,
        caller: &Address,
        address: &Address,
        record: ValidatorRecord,
        current_height: BlockHeight,
    ) -> Result<()> {
        self.data_feed.authorize(caller)?;
        if record.is_expired_at(current_height) {
            tracing::warn!(
                "Rejected late record for {}: window ends at {}, height {}",
                address,
                record.valid_to,
                current_height
            );
            return Err(Error::StaleRecord {
                valid_to: record.valid_to,
                current_height,
            });
        }

        self.update_record(caller, address, record)
    }

    /// Record of `address`
    pub fn get_record(&self, address: &Address) -> Result<&ValidatorRecord> {
        self.records
            .get(address)
            .ok_or_else(|| Error::NotFound(address.clone()))
    }

    /// Records live at `current_height`, best rank first
    ///
    /// Equal ranks are ordered by address.
    pub fn list_by_rank(&self, current_height: BlockHeight) -> Vec<ValidatorRecord> {
        let mut live: Vec<ValidatorRecord> = self
            .records
            .values()
            .filter(|record| record.is_live_at(current_height))
            .cloned()
            .collect();

        live.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.address.cmp(&b.address)));
        live
    }

    /// Number of validators ever recorded
    pub fn node_count(&self) -> usize {
        self.records.len()
    }

    /// All records in address order
    pub fn records(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.records.values()
    }
}
