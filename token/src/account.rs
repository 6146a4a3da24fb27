//! Per-account token state.

use serde::{Deserialize, Serialize};

/// Balance of one account, with the escrowed share broken out.
///
/// Invariant: `locked <= balance`. Only [`crate::TokenLedger`] mutates these
/// fields, and every mutation preserves the invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Nominal holdings in minor units, locked share included.
    pub balance: u128,
    /// Share of `balance` reserved for open votes.
    pub locked: u128,
}

impl Account {
    /// Tokens that may be spent, transferred or newly locked.
    pub fn available(&self) -> u128 {
        self.balance.saturating_sub(self.locked)
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.locked == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_excludes_locked() {
        let account = Account {
            balance: 1_000,
            locked: 25,
        };
        assert_eq!(account.available(), 975);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Account::default().is_empty());
        assert_eq!(Account::default().available(), 0);
    }
}
