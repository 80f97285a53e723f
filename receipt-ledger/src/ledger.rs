//! Dual-balance ledger for the receipt token
//!
//! Each account carries a total balance and a protocol balance. The protocol
//! balance is raised only by the protocol minter and travels with mint, not
//! with transfer, so a holder can never unwind protocol-originated stake by
//! transferring and then burning.
//!
//! # Example
//!
//! ```
//! use receipt_ledger::{Address, AuthorizationPolicy, LedgerConfig, LiquidLedger};
//! use rust_decimal::Decimal;
//!
//! let minter = Address::new("coordinator");
//! let mut ledger = LiquidLedger::new(
//!     AuthorizationPolicy::identity("owner"),
//!     AuthorizationPolicy::Identity(minter.clone()),
//!     LedgerConfig::default(),
//! );
//!
//! let alice = Address::new("alice");
//! ledger.mint_protocol(&minter, &alice, Decimal::from(1000)).unwrap();
//! assert_eq!(ledger.protocol_balance_of(&alice), Decimal::from(1000));
//! ```

use crate::{
    auth::AuthorizationPolicy,
    config::{LedgerConfig, TransferPolicy},
    types::{Address, Amount, BurnRequest, LedgerAccount, LedgerEvent, LedgerEventKind, MintKind},
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Receipt token ledger
#[derive(Debug, Clone)]
pub struct LiquidLedger {
    /// Administrative authority
    owner: AuthorizationPolicy,

    /// The single protocol minter (the staking coordinator)
    minter: AuthorizationPolicy,

    /// Configuration
    config: LedgerConfig,

    /// Account balances, ordered by address
    accounts: BTreeMap<Address, LedgerAccount>,

    /// Allowances keyed by (owner, spender)
    allowances: BTreeMap<(Address, Address), Amount>,

    /// Sum of all total balances
    total_supply: Amount,

    /// Event log
    events: Vec<LedgerEvent>,
}

impl LiquidLedger {
    /// Create an empty ledger
    pub fn new(owner: AuthorizationPolicy, minter: AuthorizationPolicy, config: LedgerConfig) -> Self {
        Self {
            owner,
            minter,
            config,
            accounts: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: Decimal::ZERO,
            events: Vec::new(),
        }
    }

    /// Replace the protocol minter (owner only)
    pub fn set_protocol_minter(
        &mut self,
        caller: &Address,
        minter: AuthorizationPolicy,
    ) -> Result<()> {
        self.owner.authorize(caller)?;
        tracing::info!("Protocol minter changed to {:?}", minter.holder());
        self.minter = minter;
        Ok(())
    }

    /// Current protocol minter policy
    pub fn protocol_minter(&self) -> &AuthorizationPolicy {
        &self.minter
    }

    /// Ledger configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Balances of an account (zero if never credited)
    pub fn account(&self, address: &Address) -> LedgerAccount {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    /// Total balance of an account
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.account(address).total_balance
    }

    /// Protocol balance of an account
    pub fn protocol_balance_of(&self, address: &Address) -> Amount {
        self.account(address).protocol_balance
    }

    /// Free balance of an account
    pub fn free_balance_of(&self, address: &Address) -> Amount {
        self.account(address).free_balance()
    }

    /// All accounts in address order
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &LedgerAccount)> {
        self.accounts.iter()
    }

    /// Token supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Remaining allowance of `spender` over `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Events emitted so far
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Mint protocol balance (protocol minter only)
    ///
    /// Raises both the total and the protocol balance of `account`.
    pub fn mint_protocol(&mut self, caller: &Address, account: &Address, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;
        self.minter.authorize(caller)?;

        self.credit(account, amount, MintKind::Protocol)?;
        tracing::debug!("Minted {} protocol balance to {}", amount, account);
        Ok(())
    }

    /// Mint free balance through the open deposit path
    ///
    /// Raises the total balance only; the protocol balance is untouched.
    pub fn mint_free(&mut self, account: &Address, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;
        if amount < self.config.min_deposit_amount {
            return Err(Error::DepositAmountTooLow {
                amount,
                min_deposit: self.config.min_deposit_amount,
            });
        }

        self.credit(account, amount, MintKind::Free)?;
        tracing::debug!("Minted {} free balance to {}", amount, account);
        Ok(())
    }

    /// Burn balance from `account`
    ///
    /// The caller's authority decides the path: the protocol minter burns
    /// protocol balance, the account itself burns free balance, anyone else
    /// is rejected.
    pub fn burn(&mut self, caller: &Address, account: &Address, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;

        match self.classify_burn(caller, account)? {
            BurnRequest::Holder { account } => self.burn_free(&account, amount),
            BurnRequest::Privileged { minter, account } => {
                tracing::debug!("Minter {} burning protocol balance of {}", minter, account);
                self.burn_protocol(&account, amount)
            }
        }
    }

    /// Transfer balance from the caller to `to`
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;
        self.move_balance(caller, to, amount)
    }

    /// Set the allowance of `spender` over the caller's balance
    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;

        self.allowances
            .insert((caller.clone(), spender.clone()), amount);
        self.emit(LedgerEventKind::Approved {
            owner: caller.clone(),
            spender: spender.clone(),
            amount,
        });
        Ok(())
    }

    /// Transfer on behalf of `from`, consuming the caller's allowance
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        ensure_non_negative(amount)?;

        let available = self.balance_of(from);
        if amount > available {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let allowance = self.allowance(from, spender);
        if amount > allowance {
            return Err(Error::AllowanceExceeded {
                requested: amount,
                allowance,
            });
        }

        self.move_balance(from, to, amount)?;
        self.allowances
            .insert((from.clone(), spender.clone()), allowance - amount);
        Ok(())
    }

    /// Check money conservation and the balance split of every account
    pub fn check_supply_conservation(&self) -> Result<()> {
        let mut sum = Decimal::ZERO;
        for (address, account) in &self.accounts {
            if !account.is_consistent() {
                return Err(Error::InvariantViolation(format!(
                    "account {} has protocol balance {} above total {}",
                    address, account.protocol_balance, account.total_balance
                )));
            }
            sum = sum.checked_add(account.total_balance).ok_or(Error::Overflow)?;
        }

        if sum != self.total_supply {
            return Err(Error::InvariantViolation(format!(
                "sum of balances {} != total supply {}",
                sum, self.total_supply
            )));
        }
        Ok(())
    }

    /// Digest of all balances
    ///
    /// Accounts are kept in address order, so equal states hash equally.
    pub fn state_hash(&self) -> Result<[u8; 32]> {
        let bytes = bincode::serialize(&(&self.accounts, &self.total_supply))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    fn classify_burn(&self, caller: &Address, account: &Address) -> Result<BurnRequest> {
        if self.minter.permits(caller) {
            Ok(BurnRequest::Privileged {
                minter: caller.clone(),
                account: account.clone(),
            })
        } else if caller == account {
            Ok(BurnRequest::Holder {
                account: account.clone(),
            })
        } else {
            Err(Error::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    fn burn_free(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let current = self.account(account);
        let free_available = current.free_balance();
        if amount > free_available {
            return Err(Error::InsufficientUserBalanceForBurn {
                requested: amount,
                available: current.total_balance,
                free_available,
            });
        }

        self.debit(account, amount, Decimal::ZERO)
    }

    fn burn_protocol(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let current = self.account(account);
        if amount > current.protocol_balance {
            return Err(Error::InsufficientProtocolBalanceForBurn {
                requested: amount,
                protocol_available: current.protocol_balance,
            });
        }

        self.debit(account, amount, amount)
    }

    /// Shared storage update for both burn paths
    fn debit(&mut self, address: &Address, amount: Amount, protocol_amount: Amount) -> Result<()> {
        let mut account = self.account(address);
        account.total_balance -= amount;
        account.protocol_balance -= protocol_amount;
        debug_assert!(account.is_consistent());

        self.store(address, account);
        self.total_supply -= amount;
        self.emit(LedgerEventKind::Burned {
            account: address.clone(),
            amount,
        });
        Ok(())
    }

    fn credit(&mut self, address: &Address, amount: Amount, kind: MintKind) -> Result<()> {
        let mut account = self.account(address);
        account.total_balance = account
            .total_balance
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        if kind == MintKind::Protocol {
            account.protocol_balance = account
                .protocol_balance
                .checked_add(amount)
                .ok_or(Error::Overflow)?;
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        self.store(address, account);
        self.total_supply = total_supply;
        self.emit(LedgerEventKind::Minted {
            account: address.clone(),
            amount,
            kind,
        });
        Ok(())
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let mut sender = self.account(from);
        if amount > sender.total_balance {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: sender.total_balance,
            });
        }
        if self.config.transfer_policy == TransferPolicy::RestrictToFreeBalance
            && amount > sender.free_balance()
        {
            return Err(Error::InsufficientFreeBalance {
                requested: amount,
                free_available: sender.free_balance(),
            });
        }

        if from != to {
            let mut receiver = self.account(to);
            receiver.total_balance = receiver
                .total_balance
                .checked_add(amount)
                .ok_or(Error::Overflow)?;

            sender.total_balance -= amount;
            sender.protocol_balance = sender.protocol_balance.min(sender.total_balance);

            self.store(from, sender);
            self.store(to, receiver);
        }

        self.emit(LedgerEventKind::Transferred {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Write back an account; entries appear on first credit only
    fn store(&mut self, address: &Address, account: LedgerAccount) {
        if account == LedgerAccount::default() && !self.accounts.contains_key(address) {
            return;
        }
        self.accounts.insert(address.clone(), account);
    }

    fn emit(&mut self, kind: LedgerEventKind) {
        let sequence = self.events.len() as u64;
        self.events.push(LedgerEvent { sequence, kind });
    }
}

fn ensure_non_negative(amount: Amount) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(())
}
