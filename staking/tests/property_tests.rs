//! Property-based tests for allocation and deposits
//!
//! - Plans never exceed validator room and account for the whole amount
//! - Plans are deterministic
//! - Deposits keep ledger and delegation totals in step

use proptest::prelude::*;
use rust_decimal::Decimal;
use staking::{
    Address, Amount, CapacityAllocator, Config, DelegationModule, Error, InMemoryDelegation,
    StakeRequest, StakingCoordinator,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator_oracle::ValidatorRecord;

/// Ranked validators with their current delegated totals
fn validator_strategy() -> impl Strategy<Value = Vec<(ValidatorRecord, Amount)>> {
    prop::collection::vec((1u32..10, 0i64..2_000), 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (rank, delegated))| {
                let record = ValidatorRecord {
                    address: Address::new(format!("v{}", i)),
                    rank,
                    rating: 0,
                    apy_basis_points: 0,
                    valid_from: 0,
                    valid_to: 1_000,
                };
                (record, Decimal::from(delegated))
            })
            .collect()
    })
}

fn sorted_records(validators: &[(ValidatorRecord, Amount)]) -> Vec<ValidatorRecord> {
    let mut records: Vec<ValidatorRecord> = validators.iter().map(|(r, _)| r.clone()).collect();
    records.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.address.cmp(&b.address)));
    records
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: lines + surplus == amount, each line within room
    #[test]
    fn prop_plan_accounts_for_amount(
        validators in validator_strategy(),
        capacity in 0i64..2_000,
        amount in 1i64..10_000,
    ) {
        let totals: BTreeMap<Address, Amount> = validators
            .iter()
            .map(|(r, d)| (r.address.clone(), *d))
            .collect();
        let ranked = sorted_records(&validators);
        let allocator = CapacityAllocator::new(Decimal::from(capacity));
        let lookup = |v: &Address| totals.get(v).copied();

        match allocator.plan(Decimal::from(amount), &ranked, &lookup) {
            Ok(plan) => {
                prop_assert_eq!(plan.allocated() + plan.surplus(), Decimal::from(amount));
                prop_assert!(plan.surplus() >= Decimal::ZERO);
                for line in &plan.lines {
                    let room = (Decimal::from(capacity) - totals[&line.validator]).max(Decimal::ZERO);
                    prop_assert!(line.amount > Decimal::ZERO);
                    prop_assert!(line.amount <= room);
                }

                // Lines follow rank order
                let positions: Vec<usize> = plan
                    .lines
                    .iter()
                    .filter_map(|line| ranked.iter().position(|r| r.address == line.validator))
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

                // Identical inputs give the identical plan
                let again = allocator.plan(Decimal::from(amount), &ranked, &lookup).unwrap();
                prop_assert_eq!(again, plan);
            }
            Err(Error::NoCapacity { requested }) => {
                prop_assert_eq!(requested, Decimal::from(amount));
                for (_, delegated) in &validators {
                    prop_assert!(*delegated >= Decimal::from(capacity));
                }
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: successful deposits move exactly the staked amount into
    /// ledger supply and delegation totals; failures move nothing
    #[test]
    fn prop_deposits_keep_totals_in_step(
        validators in validator_strategy(),
        deposits in prop::collection::vec((0usize..4, 0i64..3_000), 1..12),
    ) {
        let mut config = Config::default();
        config.protocol.min_stake_amount = Decimal::from(100);
        config.protocol.max_validator_stake_capacity = Decimal::from(2_500);

        let delegation = Arc::new(InMemoryDelegation::with_validators(
            validators.iter().map(|(r, d)| (r.address.clone(), *d)),
        ));
        let coordinator = StakingCoordinator::new(&config, delegation.clone()).unwrap();
        let feed = config.protocol.data_feed.clone();
        for (record, _) in &validators {
            coordinator
                .update_validator_record(&feed, &record.address, record.clone())
                .unwrap();
        }

        let delegated_at_start: Decimal = validators.iter().map(|(_, d)| *d).sum();
        let mut staked_total = Decimal::ZERO;

        for (who, amount) in deposits {
            let caller = Address::new(format!("user{}", who));
            let amount = Decimal::from(amount);
            let supply_before = coordinator.total_supply();

            match coordinator.stake(StakeRequest::new(caller.clone(), amount, 10)) {
                Ok(receipt) => {
                    prop_assert!(amount >= Decimal::from(100));
                    prop_assert_eq!(receipt.plan.allocated() + receipt.surplus, amount);
                    prop_assert_eq!(receipt.staked, receipt.plan.allocated());
                    prop_assert_eq!(coordinator.total_supply(), supply_before + receipt.staked);
                    staked_total += receipt.staked;
                }
                Err(_) => {
                    prop_assert_eq!(coordinator.total_supply(), supply_before);
                }
            }

            for (address, account) in coordinator_accounts(&coordinator, 4) {
                prop_assert!(account.0 >= Decimal::ZERO, "negative protocol for {}", address);
                prop_assert!(account.0 <= account.1, "protocol above total for {}", address);
            }
        }

        let delegated_now: Decimal = delegation.snapshot().values().copied().sum();
        prop_assert_eq!(delegated_now, delegated_at_start + staked_total);
        prop_assert_eq!(coordinator.total_supply(), staked_total);
        let recorded: Decimal = coordinator.stake_records().values().copied().sum();
        prop_assert_eq!(recorded, staked_total);
        for (record, initial) in &validators {
            let total = delegation.total_delegated(&record.address).unwrap();
            prop_assert!(total <= Decimal::from(2_500).max(*initial));
        }
        prop_assert!(coordinator.check_invariants().is_ok());
    }
}

/// (protocol, total) of the simulated users
fn coordinator_accounts(coordinator: &StakingCoordinator, users: usize) -> Vec<(Address, (Amount, Amount))> {
    (0..users)
        .map(|i| {
            let address = Address::new(format!("user{}", i));
            let account = coordinator.account(&address);
            (address, (account.protocol_balance, account.total_balance))
        })
        .collect()
}
