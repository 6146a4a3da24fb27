//! Events emitted by governance operations for external consumers.

use agora_types::{AccountId, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::proposal::{ProposalKind, ProposalStatus};

/// Immutable record of a committed state change.
///
/// Emitted only after the operation that produced it has fully committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ProposalCreated {
        id: ProposalId,
        proposer: AccountId,
        kind: ProposalKind,
        deadline: Timestamp,
    },
    VoteCast {
        id: ProposalId,
        voter: AccountId,
        approve: bool,
        raw_votes: u64,
        weighted_power: u128,
        tokens_cost: u128,
    },
    /// Quorum was met; `outcome` is `Executed` or `Rejected`.
    ProposalExecuted {
        id: ProposalId,
        outcome: ProposalStatus,
    },
    ProposalExpired {
        id: ProposalId,
    },
    ReputationUpdated {
        account: AccountId,
        new_score: u32,
        new_multiplier: u32,
    },
    TokensMinted {
        account: AccountId,
        amount: u128,
    },
    TokensTransferred {
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
    /// Every voter of the proposal has been settled.
    SettlementCompleted {
        id: ProposalId,
        voters: usize,
    },
}

type Listener = Box<dyn Fn(&GovernanceEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread, after the state lock
/// has been released, so concurrent emitters are not serialised in commit
/// order. Keep handlers fast.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&GovernanceEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
