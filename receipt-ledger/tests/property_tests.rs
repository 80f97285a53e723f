//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Balance split: 0 <= protocol_balance <= total_balance
//! - Supply conservation: Σ(total balances) == total supply
//! - Holder burns never touch protocol balance
//! - Minter burns never touch free balance
//! - Rejected operations leave the state unchanged

use proptest::prelude::*;
use receipt_ledger::{
    Address, AuthorizationPolicy, LedgerConfig, LiquidLedger, TransferPolicy,
};
use rust_decimal::Decimal;

const ACCOUNTS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const MINTER: &str = "coordinator";

/// One ledger operation
#[derive(Debug, Clone)]
enum Op {
    MintProtocol(usize, u64),
    MintFree(usize, u64),
    HolderBurn(usize, u64),
    MinterBurn(usize, u64),
    Transfer(usize, usize, u64),
    Approve(usize, usize, u64),
    TransferFrom(usize, usize, usize, u64),
}

/// Strategy for generating amounts (whole tokens)
fn amount_strategy() -> impl Strategy<Value = u64> {
    0u64..5_000u64
}

fn account_strategy() -> impl Strategy<Value = usize> {
    0..ACCOUNTS.len()
}

/// Strategy for generating ledger operations
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (account_strategy(), amount_strategy()).prop_map(|(a, x)| Op::MintProtocol(a, x)),
        (account_strategy(), amount_strategy()).prop_map(|(a, x)| Op::MintFree(a, x)),
        (account_strategy(), amount_strategy()).prop_map(|(a, x)| Op::HolderBurn(a, x)),
        (account_strategy(), amount_strategy()).prop_map(|(a, x)| Op::MinterBurn(a, x)),
        (account_strategy(), account_strategy(), amount_strategy())
            .prop_map(|(a, b, x)| Op::Transfer(a, b, x)),
        (account_strategy(), account_strategy(), amount_strategy())
            .prop_map(|(a, b, x)| Op::Approve(a, b, x)),
        (account_strategy(), account_strategy(), account_strategy(), amount_strategy())
            .prop_map(|(s, a, b, x)| Op::TransferFrom(s, a, b, x)),
    ]
}

fn policy_strategy() -> impl Strategy<Value = TransferPolicy> {
    prop_oneof![
        Just(TransferPolicy::ClampProtocolBalance),
        Just(TransferPolicy::RestrictToFreeBalance),
    ]
}

fn addr(index: usize) -> Address {
    Address::new(ACCOUNTS[index])
}

fn create_test_ledger(transfer_policy: TransferPolicy) -> LiquidLedger {
    LiquidLedger::new(
        AuthorizationPolicy::identity("owner"),
        AuthorizationPolicy::identity(MINTER),
        LedgerConfig {
            min_deposit_amount: Decimal::ZERO,
            transfer_policy,
        },
    )
}

fn apply(ledger: &mut LiquidLedger, op: &Op) -> receipt_ledger::Result<()> {
    let minter = Address::new(MINTER);
    match *op {
        Op::MintProtocol(a, x) => ledger.mint_protocol(&minter, &addr(a), Decimal::from(x)),
        Op::MintFree(a, x) => ledger.mint_free(&addr(a), Decimal::from(x)),
        Op::HolderBurn(a, x) => ledger.burn(&addr(a), &addr(a), Decimal::from(x)),
        Op::MinterBurn(a, x) => ledger.burn(&minter, &addr(a), Decimal::from(x)),
        Op::Transfer(a, b, x) => ledger.transfer(&addr(a), &addr(b), Decimal::from(x)),
        Op::Approve(a, b, x) => ledger.approve(&addr(a), &addr(b), Decimal::from(x)),
        Op::TransferFrom(s, a, b, x) => {
            ledger.transfer_from(&addr(s), &addr(a), &addr(b), Decimal::from(x))
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: balance split and supply conservation hold after every operation
    #[test]
    fn prop_invariants_hold(
        policy in policy_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut ledger = create_test_ledger(policy);

        for op in &ops {
            let _ = apply(&mut ledger, op);

            for (_, account) in ledger.accounts() {
                prop_assert!(account.protocol_balance >= Decimal::ZERO);
                prop_assert!(account.protocol_balance <= account.total_balance);
            }
            prop_assert!(ledger.check_supply_conservation().is_ok());
        }
    }

    /// Property: rejected operations leave balances and events untouched
    #[test]
    fn prop_rejections_have_no_effect(
        policy in policy_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut ledger = create_test_ledger(policy);

        for op in &ops {
            let hash_before = ledger.state_hash().unwrap();
            let events_before = ledger.events().len();

            if apply(&mut ledger, op).is_err() {
                prop_assert_eq!(hash_before, ledger.state_hash().unwrap());
                prop_assert_eq!(events_before, ledger.events().len());
            } else {
                prop_assert_eq!(events_before + 1, ledger.events().len());
            }
        }
    }

    /// Property: under the default policy only the minter lowers protocol balance
    #[test]
    fn prop_default_policy_protocol_balance_only_falls_by_minter_burn(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut ledger = create_test_ledger(TransferPolicy::default());

        for op in &ops {
            let before: Vec<Decimal> = (0..ACCOUNTS.len())
                .map(|i| ledger.protocol_balance_of(&addr(i)))
                .collect();
            let _ = apply(&mut ledger, op);

            if !matches!(op, Op::MinterBurn(..)) {
                for (i, protocol) in before.iter().enumerate() {
                    prop_assert!(ledger.protocol_balance_of(&addr(i)) >= *protocol);
                }
            }
        }
    }

    /// Property: holder burns never reduce protocol balance
    #[test]
    fn prop_holder_burn_preserves_protocol_balance(
        protocol in 0u64..10_000,
        free in 0u64..10_000,
        burn in 0u64..20_000,
    ) {
        let mut ledger = create_test_ledger(TransferPolicy::ClampProtocolBalance);
        let minter = Address::new(MINTER);
        let alice = addr(0);
        ledger.mint_protocol(&minter, &alice, Decimal::from(protocol)).unwrap();
        ledger.mint_free(&alice, Decimal::from(free)).unwrap();

        let result = ledger.burn(&alice, &alice, Decimal::from(burn));

        prop_assert_eq!(ledger.protocol_balance_of(&alice), Decimal::from(protocol));
        prop_assert_eq!(result.is_ok(), burn <= free);
    }

    /// Property: minter burns never reduce free balance
    #[test]
    fn prop_minter_burn_preserves_free_balance(
        protocol in 0u64..10_000,
        free in 0u64..10_000,
        burn in 0u64..20_000,
    ) {
        let mut ledger = create_test_ledger(TransferPolicy::ClampProtocolBalance);
        let minter = Address::new(MINTER);
        let alice = addr(0);
        ledger.mint_protocol(&minter, &alice, Decimal::from(protocol)).unwrap();
        ledger.mint_free(&alice, Decimal::from(free)).unwrap();

        let result = ledger.burn(&minter, &alice, Decimal::from(burn));

        prop_assert_eq!(ledger.free_balance_of(&alice), Decimal::from(free));
        prop_assert_eq!(result.is_ok(), burn <= protocol);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_transfer_then_burn_cannot_unwind_protocol_stake() {
        let mut ledger = LiquidLedger::new(
            AuthorizationPolicy::identity("owner"),
            AuthorizationPolicy::identity(MINTER),
            LedgerConfig::default(),
        );
        let minter = Address::new(MINTER);
        let alice = addr(0);
        let bob = addr(1);

        ledger.mint_protocol(&minter, &alice, Decimal::from(1000)).unwrap();

        // Protocol balance cannot leave the account, so there is nothing to
        // bring back as free balance
        assert!(ledger.transfer(&alice, &bob, Decimal::from(1000)).is_err());
        assert!(ledger.transfer(&bob, &alice, Decimal::from(1000)).is_err());
        assert!(ledger.burn(&alice, &alice, Decimal::from(1000)).is_err());
        assert!(ledger.burn(&alice, &alice, Decimal::from(1)).is_err());

        let account = ledger.account(&alice);
        assert_eq!(account.total_balance, Decimal::from(1000));
        assert_eq!(account.protocol_balance, Decimal::from(1000));
        assert_eq!(ledger.balance_of(&bob), Decimal::ZERO);
        assert!(ledger.check_supply_conservation().is_ok());
    }
}
