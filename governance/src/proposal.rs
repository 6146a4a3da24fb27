//! Moderation proposals, their votes and their lifecycle.

use std::collections::HashMap;

use agora_types::{AccountId, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};

/// The moderation action a proposal asks the community to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    /// Approve a piece of flagged content.
    Approve,
    /// Remove a piece of content.
    Remove,
    /// Change a moderation policy.
    Policy,
}

/// Lifecycle state. `Active` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Accepting votes until the deadline, awaiting execution after it.
    Active,
    /// Quorum met and approval threshold reached.
    Executed,
    /// Quorum met, approval threshold missed.
    Rejected,
    /// Quorum not met.
    Expired,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// The caller-supplied content of a new proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub kind: ProposalKind,
    pub title: String,
    pub description: String,
    /// Reference to the moderated content (URI, content hash, ...).
    pub content_ref: String,
}

/// One account's vote on one proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub approve: bool,
    /// Votes bought by the caller; always positive.
    pub raw_votes: u64,
    /// `raw_votes` scaled by the voter's reputation multiplier at cast time.
    pub weighted_power: u128,
    /// Tokens locked for this vote until settlement.
    pub tokens_cost: u128,
    pub cast_at: Timestamp,
}

/// Votes on a proposal: a lookup map plus an append-only insertion index.
///
/// Iteration always follows insertion order, so settlement over the voters
/// is reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBook {
    records: HashMap<AccountId, VoteRecord>,
    order: Vec<AccountId>,
}

impl VoteBook {
    /// Record a vote. Returns `false` (and changes nothing) if `voter` has
    /// already voted.
    pub fn insert(&mut self, voter: AccountId, record: VoteRecord) -> bool {
        if self.records.contains_key(&voter) {
            return false;
        }
        self.order.push(voter.clone());
        self.records.insert(voter, record);
        true
    }

    pub fn get(&self, voter: &AccountId) -> Option<&VoteRecord> {
        self.records.get(voter)
    }

    pub fn contains(&self, voter: &AccountId) -> bool {
        self.records.contains_key(voter)
    }

    /// Voters in the order their votes were cast.
    pub fn voters(&self) -> &[AccountId] {
        &self.order
    }

    /// `(voter, record)` pairs in cast order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &VoteRecord)> {
        self.iter_from(0)
    }

    /// `(voter, record)` pairs in cast order, starting at the `start`-th
    /// voter. Voters before `start` are not visited.
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = (&AccountId, &VoteRecord)> {
        self.order
            .get(start..)
            .unwrap_or_default()
            .iter()
            .filter_map(move |voter| self.records.get(voter).map(|r| (voter, r)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the map and the index describe the same voter set.
    pub(crate) fn is_consistent(&self) -> bool {
        self.order.len() == self.records.len()
            && self.order.iter().all(|v| self.records.contains_key(v))
    }
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: AccountId,
    pub kind: ProposalKind,
    pub title: String,
    pub description: String,
    pub content_ref: String,
    pub created_at: Timestamp,
    pub voting_deadline: Timestamp,
    /// Weighted power in favour.
    pub for_weight: u128,
    /// Weighted power against.
    pub against_weight: u128,
    pub status: ProposalStatus,
    /// Flips to true exactly once, when a terminal status is assigned.
    pub resolved: bool,
    pub resolved_at: Option<Timestamp>,
    pub(crate) votes: VoteBook,
    /// Whether the voters of this proposal are owed a settlement pass.
    pub(crate) settlement_due: bool,
    /// Number of voters (in cast order) already settled.
    pub(crate) settled: usize,
}

impl Proposal {
    pub(crate) fn new(
        id: ProposalId,
        proposer: AccountId,
        draft: ProposalDraft,
        created_at: Timestamp,
        voting_deadline: Timestamp,
    ) -> Self {
        Self {
            id,
            proposer,
            kind: draft.kind,
            title: draft.title,
            description: draft.description,
            content_ref: draft.content_ref,
            created_at,
            voting_deadline,
            for_weight: 0,
            against_weight: 0,
            status: ProposalStatus::Active,
            resolved: false,
            resolved_at: None,
            votes: VoteBook::default(),
            settlement_due: false,
            settled: 0,
        }
    }

    pub fn votes(&self) -> &VoteBook {
        &self.votes
    }

    pub fn vote(&self, voter: &AccountId) -> Option<&VoteRecord> {
        self.votes.get(voter)
    }

    pub fn voters(&self) -> &[AccountId] {
        self.votes.voters()
    }

    pub fn total_weight(&self) -> Option<u128> {
        self.for_weight.checked_add(self.against_weight)
    }

    /// Whether the voting window is still open at `now`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Active && now < self.voting_deadline
    }

    /// Sum of the tokens locked by this proposal's votes.
    pub fn total_tokens_locked(&self) -> u128 {
        self.votes
            .iter()
            .fold(0u128, |acc, (_, r)| acc.saturating_add(r.tokens_cost))
    }

    /// Votes whose cost is still locked: everything not yet settled.
    pub fn unsettled_votes(&self) -> impl Iterator<Item = (&AccountId, &VoteRecord)> {
        self.votes.iter_from(self.settled)
    }

    /// Voters still awaiting settlement.
    pub fn pending_settlement(&self) -> usize {
        if self.settlement_due {
            self.votes.len().saturating_sub(self.settled)
        } else {
            0
        }
    }

    /// The side that won the weighted tally. A tie counts as "against".
    pub fn majority_approves(&self) -> bool {
        self.for_weight > self.against_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(approve: bool, raw: u64) -> VoteRecord {
        VoteRecord {
            approve,
            raw_votes: raw,
            weighted_power: raw as u128,
            tokens_cost: (raw as u128) * (raw as u128),
            cast_at: Timestamp::new(0),
        }
    }

    #[test]
    fn test_vote_book_rejects_duplicates() {
        let mut book = VoteBook::default();
        let alice = AccountId::new("alice");
        assert!(book.insert(alice.clone(), record(true, 3)));
        assert!(!book.insert(alice.clone(), record(false, 9)));
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(&alice).unwrap().raw_votes, 3);
    }

    #[test]
    fn test_vote_book_iterates_in_cast_order() {
        let mut book = VoteBook::default();
        for name in ["zed", "amy", "mia", "bob"] {
            book.insert(AccountId::new(name), record(true, 1));
        }
        let order: Vec<_> = book.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(order, vec!["zed", "amy", "mia", "bob"]);
        assert!(book.is_consistent());
    }

    #[test]
    fn test_vote_book_iter_from_skips_prefix() {
        let mut book = VoteBook::default();
        for (name, raw) in [("zed", 1), ("amy", 2), ("mia", 3), ("bob", 4)] {
            book.insert(AccountId::new(name), record(true, raw));
        }
        let tail: Vec<_> = book.iter_from(2).map(|(v, r)| (v.as_str(), r.raw_votes)).collect();
        assert_eq!(tail, vec![("mia", 3), ("bob", 4)]);
        assert_eq!(book.iter_from(4).count(), 0);
        assert_eq!(book.iter_from(99).count(), 0);
        assert_eq!(book.iter_from(0).count(), 4);
    }

    #[test]
    fn test_unsettled_votes_follow_cursor() {
        let mut p = Proposal::new(
            ProposalId::FIRST,
            AccountId::new("alice"),
            ProposalDraft {
                kind: ProposalKind::Remove,
                title: "spam".into(),
                description: String::new(),
                content_ref: String::new(),
            },
            Timestamp::new(0),
            Timestamp::new(1),
        );
        for (name, raw) in [("a", 1), ("b", 2), ("c", 3)] {
            p.votes.insert(AccountId::new(name), record(true, raw));
        }
        assert_eq!(p.total_tokens_locked(), 14);
        p.settled = 1;
        let unsettled: u128 = p.unsettled_votes().map(|(_, r)| r.tokens_cost).sum();
        assert_eq!(unsettled, 13);
        assert_eq!(p.total_tokens_locked(), 14);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!ProposalStatus::Active.is_terminal());
        assert!(ProposalStatus::Executed.is_terminal());
        assert!(ProposalStatus::Rejected.is_terminal());
        assert!(ProposalStatus::Expired.is_terminal());
    }

    #[test]
    fn test_proposal_open_window() {
        let p = Proposal::new(
            ProposalId::FIRST,
            AccountId::new("alice"),
            ProposalDraft {
                kind: ProposalKind::Remove,
                title: "spam".into(),
                description: String::new(),
                content_ref: "post:1".into(),
            },
            Timestamp::new(100),
            Timestamp::new(200),
        );
        assert!(p.is_open(Timestamp::new(199)));
        assert!(!p.is_open(Timestamp::new(200)));
        assert_eq!(p.pending_settlement(), 0);
    }

    #[test]
    fn test_majority_tie_goes_against() {
        let mut p = Proposal::new(
            ProposalId::FIRST,
            AccountId::new("alice"),
            ProposalDraft {
                kind: ProposalKind::Policy,
                title: "t".into(),
                description: String::new(),
                content_ref: String::new(),
            },
            Timestamp::new(0),
            Timestamp::new(1),
        );
        p.for_weight = 10;
        p.against_weight = 10;
        assert!(!p.majority_approves());
        p.for_weight = 11;
        assert!(p.majority_approves());
    }
}
