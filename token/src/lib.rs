//! Governance token ledger.
//!
//! Tracks every account's balance together with the portion of it that is
//! locked as escrow for open votes. Locked tokens count toward the balance
//! but can be neither spent nor transferred until they are unlocked.
//!
//! All arithmetic is checked: an overflow or underflow is an error, never a
//! wrapped value.

pub mod account;
pub mod error;
pub mod ledger;

pub use account::Account;
pub use error::LedgerError;
pub use ledger::TokenLedger;
