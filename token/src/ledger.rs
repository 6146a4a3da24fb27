//! The token ledger: balances, locks and supply.

use std::collections::HashMap;

use agora_types::{AccountId, GovernanceParams};
use tracing::debug;

use crate::account::Account;
use crate::error::LedgerError;

/// Balances and vote escrow for every account.
///
/// Each mutating method either fully applies or returns an error having
/// changed nothing.
#[derive(Clone, Debug)]
pub struct TokenLedger {
    accounts: HashMap<AccountId, Account>,
    total_supply: u128,
    max_supply: u128,
}

impl TokenLedger {
    pub fn new(max_supply: u128) -> Self {
        Self {
            accounts: HashMap::new(),
            total_supply: 0,
            max_supply,
        }
    }

    pub fn with_params(params: &GovernanceParams) -> Self {
        Self::new(params.max_supply)
    }

    /// Rebuild a ledger from previously exported accounts.
    ///
    /// Total supply is recomputed from the balances. Fails if any account
    /// breaks `locked <= balance` or the sum exceeds `max_supply`.
    pub fn from_accounts(
        max_supply: u128,
        accounts: impl IntoIterator<Item = (AccountId, Account)>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(max_supply);
        for (id, account) in accounts {
            if account.locked > account.balance {
                return Err(LedgerError::InsufficientLockedBalance {
                    account: id,
                    needed: account.locked,
                    locked: account.balance,
                });
            }
            let supply = ledger
                .total_supply
                .checked_add(account.balance)
                .ok_or(LedgerError::ArithmeticOverflow("restore supply"))?;
            if supply > max_supply {
                return Err(LedgerError::SupplyCapExceeded {
                    amount: account.balance,
                    supply: ledger.total_supply,
                    max_supply,
                });
            }
            ledger.total_supply = supply;
            if !account.is_empty() {
                ledger.accounts.insert(id, account);
            }
        }
        Ok(ledger)
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Create `amount` new tokens in `account`.
    pub fn mint(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("mint supply"))?;
        if supply > self.max_supply {
            return Err(LedgerError::SupplyCapExceeded {
                amount,
                supply: self.total_supply,
                max_supply: self.max_supply,
            });
        }
        let current = self.account(account);
        let balance = current
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("mint balance"))?;

        self.total_supply = supply;
        self.put(
            account,
            Account {
                balance,
                ..current
            },
        );
        debug!(%account, amount, total_supply = supply, "minted");
        Ok(())
    }

    /// Reserve `amount` of the account's available balance.
    pub fn lock(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.ensure_can_lock(account, amount)?;
        let current = self.account(account);
        let locked = current
            .locked
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("lock"))?;
        self.put(account, Account { locked, ..current });
        debug!(%account, amount, locked, "locked");
        Ok(())
    }

    /// Release `amount` of previously locked tokens.
    pub fn unlock(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.ensure_can_unlock(account, amount)?;
        let current = self.account(account);
        let locked = current
            .locked
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow("unlock"))?;
        self.put(account, Account { locked, ..current });
        debug!(%account, amount, locked, "unlocked");
        Ok(())
    }

    /// Move `amount` of available tokens from `from` to `to`.
    ///
    /// Locked tokens never move: the check is against `available`, not
    /// `balance`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let sender = self.account(from);
        if amount > sender.available() {
            return Err(LedgerError::InsufficientAvailableBalance {
                account: from.clone(),
                needed: amount,
                available: sender.available(),
            });
        }
        if from == to {
            return Ok(());
        }
        let receiver = self.account(to);
        let sender_balance = sender
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow("transfer debit"))?;
        let receiver_balance = receiver
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("transfer credit"))?;

        self.put(
            from,
            Account {
                balance: sender_balance,
                ..sender
            },
        );
        self.put(
            to,
            Account {
                balance: receiver_balance,
                ..receiver
            },
        );
        debug!(%from, %to, amount, "transferred");
        Ok(())
    }

    // ── Preflight ────────────────────────────────────────────────────────

    /// Check that `lock(account, amount)` would succeed, without applying it.
    pub fn ensure_can_lock(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let available = self.available(account);
        if amount > available {
            return Err(LedgerError::InsufficientAvailableBalance {
                account: account.clone(),
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Check that `unlock(account, amount)` would succeed, without applying it.
    pub fn ensure_can_unlock(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let locked = self.locked(account);
        if amount > locked {
            return Err(LedgerError::InsufficientLockedBalance {
                account: account.clone(),
                needed: amount,
                locked,
            });
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Snapshot of an account; unknown accounts read as empty.
    pub fn account(&self, account: &AccountId) -> Account {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    pub fn balance(&self, account: &AccountId) -> u128 {
        self.account(account).balance
    }

    pub fn locked(&self, account: &AccountId) -> u128 {
        self.account(account).locked
    }

    pub fn available(&self, account: &AccountId) -> u128 {
        self.account(account).available()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn max_supply(&self) -> u128 {
        self.max_supply
    }

    /// Sum of locked tokens across all accounts.
    pub fn total_locked(&self) -> u128 {
        self.accounts
            .values()
            .fold(0u128, |acc, a| acc.saturating_add(a.locked))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// All non-empty accounts, in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    fn put(&mut self, id: &AccountId, account: Account) {
        if account.is_empty() {
            self.accounts.remove(id);
        } else {
            self.accounts.insert(id.clone(), account);
        }
    }
}
