//! Ledger errors.

use agora_types::AccountId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient available balance for {account}: need {needed}, have {available}")]
    InsufficientAvailableBalance {
        account: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient locked balance for {account}: need {needed}, have {locked}")]
    InsufficientLockedBalance {
        account: AccountId,
        needed: u128,
        locked: u128,
    },

    #[error("supply cap exceeded: minting {amount} onto {supply} would pass {max_supply}")]
    SupplyCapExceeded {
        amount: u128,
        supply: u128,
        max_supply: u128,
    },

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}
