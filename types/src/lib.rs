//! Fundamental types for the Agora governance engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, proposal ids, timestamps and clocks, and the governance
//! policy parameters.

pub mod account;
pub mod error;
pub mod id;
pub mod params;
pub mod time;

pub use account::AccountId;
pub use error::TypesError;
pub use id::ProposalId;
pub use params::{GovernanceParams, TOKEN_UNIT};
pub use time::{Clock, SystemClock, Timestamp};
