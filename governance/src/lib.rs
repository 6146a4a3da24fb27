//! Token-weighted moderation governance.
//!
//! Members open moderation proposals (approve content, remove content, change
//! a policy) and vote on them by locking tokens. Votes are priced
//! quadratically, `n² · unit` tokens for `n` votes, and weighted by the
//! voter's reputation multiplier. Once the voting window closes any caller may
//! execute the proposal: the weighted tally is checked against a quorum of
//! total supply and an approval threshold, every voter's tokens are unlocked,
//! and each voter's reputation moves according to whether they sided with the
//! majority.
//!
//! [`GovernanceFacade`] is the public entry point; [`ProposalEngine`] holds the
//! lifecycle logic and works against borrowed ledgers.

pub mod engine;
pub mod error;
pub mod event;
pub mod facade;
pub mod proposal;
pub mod snapshot;
pub mod tally;

pub use engine::{ProposalEngine, SettlementReport, MAX_TITLE_LEN};
pub use error::{ErrorKind, GovernanceError};
pub use event::{EventBus, GovernanceEvent};
pub use facade::GovernanceFacade;
pub use proposal::{Proposal, ProposalDraft, ProposalKind, ProposalStatus, VoteBook, VoteRecord};
pub use snapshot::{GovernanceSnapshot, SNAPSHOT_VERSION};
pub use tally::{approval_pct, decide, quorum_required, vote_cost, weighted_power};
