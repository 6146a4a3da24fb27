//! Core governance engine — manages proposals through their lifecycle.
//!
//! `Active → {Executed, Rejected, Expired}`. Every operation validates fully
//! before its first mutation, so a rejected call leaves the proposal book and
//! both ledgers exactly as they were.

use std::collections::BTreeMap;

use agora_reputation::{OutcomeRecorder, ReputationTracker};
use agora_token::TokenLedger;
use agora_types::{AccountId, GovernanceParams, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GovernanceError;
use crate::event::GovernanceEvent;
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus, VoteRecord};
use crate::tally;

/// Maximum accepted title length in bytes.
pub const MAX_TITLE_LEN: usize = 256;

/// Progress of a proposal's settlement pass after an `execute` or `settle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub id: ProposalId,
    pub status: ProposalStatus,
    /// Voters settled by this call.
    pub settled: usize,
    /// Voters still awaiting settlement.
    pub remaining: usize,
}

/// One voter's share of a settlement batch, fully validated.
struct SettlementStep {
    voter: AccountId,
    refund: u128,
    /// `Some(with_majority)` when reputation is to be updated.
    outcome: Option<bool>,
}

/// Owns every proposal and drives the lifecycle against the two ledgers.
///
/// The ledgers are borrowed per call; the engine itself holds only the
/// proposal book and the reputation write capability.
#[derive(Debug)]
pub struct ProposalEngine {
    params: GovernanceParams,
    recorder: OutcomeRecorder,
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
}

impl ProposalEngine {
    pub fn new(params: GovernanceParams, recorder: OutcomeRecorder) -> Self {
        Self {
            params,
            recorder,
            proposals: BTreeMap::new(),
            next_id: ProposalId::FIRST,
        }
    }

    /// Rebuild an engine from exported proposals.
    ///
    /// Each proposal's tally, lifecycle flags and settlement cursor are
    /// checked against its vote book, and `ledger` must hold exactly the
    /// tokens locked by every unsettled vote.
    pub fn restore(
        params: GovernanceParams,
        recorder: OutcomeRecorder,
        ledger: &TokenLedger,
        proposals: impl IntoIterator<Item = Proposal>,
        next_id: ProposalId,
    ) -> Result<Self, GovernanceError> {
        let mut engine = Self::new(params, recorder);
        let mut owed: BTreeMap<AccountId, u128> = BTreeMap::new();
        for proposal in proposals {
            if proposal.id >= next_id || proposal.id < ProposalId::FIRST {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {} outside issued id range (next {})",
                    proposal.id, next_id
                )));
            }
            check_restored(&proposal)?;
            for (voter, record) in proposal.unsettled_votes() {
                let entry = owed.entry(voter.clone()).or_default();
                *entry = entry
                    .checked_add(record.tokens_cost)
                    .ok_or(GovernanceError::ArithmeticOverflow("restored locks"))?;
            }
            if engine.proposals.insert(proposal.id, proposal).is_some() {
                return Err(GovernanceError::Snapshot("duplicate proposal id".into()));
            }
        }

        for (voter, expected) in &owed {
            let locked = ledger.locked(voter);
            if locked != *expected {
                return Err(GovernanceError::Snapshot(format!(
                    "{voter} has {locked} locked but unsettled votes hold {expected}"
                )));
            }
        }
        let owed_total = owed
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(GovernanceError::ArithmeticOverflow("restored locks"))?;
        if ledger.total_locked() != owed_total {
            return Err(GovernanceError::Snapshot(format!(
                "ledger locks {} but unsettled votes hold {owed_total}",
                ledger.total_locked()
            )));
        }

        engine.next_id = next_id;
        Ok(engine)
    }

    // ── Create ───────────────────────────────────────────────────────────

    /// Open a new proposal. The proposer must hold at least
    /// `proposal_threshold` available tokens; nothing is locked.
    pub fn create_proposal(
        &mut self,
        ledger: &TokenLedger,
        proposer: &AccountId,
        draft: ProposalDraft,
        now: Timestamp,
        events: &mut Vec<GovernanceEvent>,
    ) -> Result<ProposalId, GovernanceError> {
        let available = ledger.available(proposer);
        if available < self.params.proposal_threshold {
            return Err(GovernanceError::ProposalThresholdNotMet {
                available,
                required: self.params.proposal_threshold,
            });
        }
        if draft.title.trim().is_empty() {
            return Err(GovernanceError::InvalidProposalContent(
                "title must not be empty".into(),
            ));
        }
        if draft.title.len() > MAX_TITLE_LEN {
            return Err(GovernanceError::InvalidProposalContent(format!(
                "title is {} bytes, limit is {MAX_TITLE_LEN}",
                draft.title.len()
            )));
        }
        let id = self.next_id;
        let next_id = id
            .next()
            .ok_or(GovernanceError::ArithmeticOverflow("proposal id"))?;
        let deadline = now
            .checked_add_secs(self.params.voting_period_secs)
            .ok_or(GovernanceError::ArithmeticOverflow("voting deadline"))?;

        let kind = draft.kind;
        self.proposals
            .insert(id, Proposal::new(id, proposer.clone(), draft, now, deadline));
        self.next_id = next_id;

        info!(%id, %proposer, ?kind, %deadline, "proposal created");
        events.push(GovernanceEvent::ProposalCreated {
            id,
            proposer: proposer.clone(),
            kind,
            deadline,
        });
        Ok(id)
    }

    // ── Vote ─────────────────────────────────────────────────────────────

    /// Cast `raw_votes` votes on proposal `id`, locking their quadratic cost.
    #[allow(clippy::too_many_arguments)]
    pub fn vote(
        &mut self,
        ledger: &mut TokenLedger,
        reputation: &ReputationTracker,
        id: ProposalId,
        voter: &AccountId,
        approve: bool,
        raw_votes: u64,
        now: Timestamp,
        events: &mut Vec<GovernanceEvent>,
    ) -> Result<VoteRecord, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        if proposal.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive {
                id,
                status: proposal.status,
            });
        }
        if now >= proposal.voting_deadline {
            return Err(GovernanceError::VotingPeriodEnded {
                id,
                deadline: proposal.voting_deadline,
            });
        }
        if proposal.votes.contains(voter) {
            return Err(GovernanceError::AlreadyVoted {
                id,
                voter: voter.clone(),
            });
        }
        if raw_votes == 0 {
            return Err(GovernanceError::InvalidVoteCount);
        }

        let tokens_cost = tally::vote_cost(raw_votes, self.params.unit)?;
        let available = ledger.available(voter);
        if tokens_cost > available {
            return Err(GovernanceError::InsufficientTokensForVote {
                cost: tokens_cost,
                available,
            });
        }
        let multiplier = reputation.voting_multiplier(voter);
        let weighted_power = tally::weighted_power(raw_votes, multiplier);
        let side = if approve {
            proposal.for_weight
        } else {
            proposal.against_weight
        };
        let new_side = side
            .checked_add(weighted_power)
            .ok_or(GovernanceError::ArithmeticOverflow("tally"))?;

        // Everything is validated; the lock is the first mutation.
        ledger.lock(voter, tokens_cost)?;

        let record = VoteRecord {
            approve,
            raw_votes,
            weighted_power,
            tokens_cost,
            cast_at: now,
        };
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        proposal.votes.insert(voter.clone(), record);
        if approve {
            proposal.for_weight = new_side;
        } else {
            proposal.against_weight = new_side;
        }

        debug!(%id, %voter, approve, raw_votes, weighted_power, tokens_cost, "vote cast");
        events.push(GovernanceEvent::VoteCast {
            id,
            voter: voter.clone(),
            approve,
            raw_votes,
            weighted_power,
            tokens_cost,
        });
        Ok(record)
    }

    // ── Execute / settle ─────────────────────────────────────────────────

    /// Resolve proposal `id` once its voting window has closed, then settle
    /// the first batch of its voters.
    pub fn execute(
        &mut self,
        ledger: &mut TokenLedger,
        reputation: &mut ReputationTracker,
        id: ProposalId,
        now: Timestamp,
        events: &mut Vec<GovernanceEvent>,
    ) -> Result<SettlementReport, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        if proposal.resolved {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        if proposal.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive {
                id,
                status: proposal.status,
            });
        }
        if now < proposal.voting_deadline {
            return Err(GovernanceError::VotingPeriodNotEnded {
                id,
                deadline: proposal.voting_deadline,
                now,
            });
        }

        let outcome = tally::decide(
            proposal.for_weight,
            proposal.against_weight,
            ledger.total_supply(),
            &self.params,
        )?;
        let settlement_due = match outcome {
            ProposalStatus::Expired => self.params.refund_on_expiry,
            _ => true,
        };
        let steps = if settlement_due {
            self.plan_batch(proposal, outcome, ledger, reputation)?
        } else {
            Vec::new()
        };

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        proposal.status = outcome;
        proposal.resolved = true;
        proposal.resolved_at = Some(now);
        proposal.settlement_due = settlement_due;

        info!(
            %id,
            ?outcome,
            for_weight = proposal.for_weight,
            against_weight = proposal.against_weight,
            voters = proposal.votes.len(),
            "proposal resolved"
        );
        events.push(match outcome {
            ProposalStatus::Expired => GovernanceEvent::ProposalExpired { id },
            outcome => GovernanceEvent::ProposalExecuted { id, outcome },
        });

        self.apply_batch(ledger, reputation, id, steps, events)
    }

    /// Settle the next batch of voters of an already resolved proposal.
    pub fn settle(
        &mut self,
        ledger: &mut TokenLedger,
        reputation: &mut ReputationTracker,
        id: ProposalId,
        events: &mut Vec<GovernanceEvent>,
    ) -> Result<SettlementReport, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        if !proposal.resolved || proposal.pending_settlement() == 0 {
            return Err(GovernanceError::NothingToSettle(id));
        }
        let steps = self.plan_batch(proposal, proposal.status, ledger, reputation)?;
        self.apply_batch(ledger, reputation, id, steps, events)
    }

    /// Validate the next settlement batch without mutating anything.
    fn plan_batch(
        &self,
        proposal: &Proposal,
        outcome: ProposalStatus,
        ledger: &TokenLedger,
        reputation: &ReputationTracker,
    ) -> Result<Vec<SettlementStep>, GovernanceError> {
        let rewards = outcome != ProposalStatus::Expired;
        if rewards {
            reputation.check_recorder(&self.recorder)?;
        }
        let majority_approves = proposal.majority_approves();

        proposal
            .unsettled_votes()
            .take(self.params.settlement_batch_size)
            .map(|(voter, record)| -> Result<SettlementStep, GovernanceError> {
                ledger.ensure_can_unlock(voter, record.tokens_cost)?;
                let outcome = if rewards {
                    let with_majority = record.approve == majority_approves;
                    reputation.record(voter).after_outcome(with_majority)?;
                    Some(with_majority)
                } else {
                    None
                };
                Ok(SettlementStep {
                    voter: voter.clone(),
                    refund: record.tokens_cost,
                    outcome,
                })
            })
            .collect()
    }

    fn apply_batch(
        &mut self,
        ledger: &mut TokenLedger,
        reputation: &mut ReputationTracker,
        id: ProposalId,
        steps: Vec<SettlementStep>,
        events: &mut Vec<GovernanceEvent>,
    ) -> Result<SettlementReport, GovernanceError> {
        let settled = steps.len();
        for step in steps {
            ledger.unlock(&step.voter, step.refund)?;
            if let Some(with_majority) = step.outcome {
                let record = reputation.record_outcome(&self.recorder, &step.voter, with_majority)?;
                events.push(GovernanceEvent::ReputationUpdated {
                    account: step.voter,
                    new_score: record.score,
                    new_multiplier: record.multiplier(),
                });
            }
        }

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        proposal.settled += settled;
        let remaining = proposal.pending_settlement();
        if proposal.settlement_due && settled > 0 && remaining == 0 {
            info!(%id, voters = proposal.votes.len(), "settlement completed");
            events.push(GovernanceEvent::SettlementCompleted {
                id,
                voters: proposal.votes.len(),
            });
        } else if settled > 0 {
            debug!(%id, settled, remaining, "settlement batch applied");
        }

        Ok(SettlementReport {
            id,
            status: proposal.status,
            settled,
            remaining,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn vote_record(&self, id: ProposalId, voter: &AccountId) -> Option<&VoteRecord> {
        self.proposals.get(&id).and_then(|p| p.vote(voter))
    }

    pub fn voters(&self, id: ProposalId) -> Option<&[AccountId]> {
        self.proposals.get(&id).map(|p| p.voters())
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// Voters of proposal `id` still awaiting settlement.
    pub fn pending_settlement(&self, id: ProposalId) -> Option<usize> {
        self.proposals.get(&id).map(|p| p.pending_settlement())
    }

    /// Id the next created proposal will receive.
    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    /// Proposals in a given status, in id order.
    pub fn proposals_with_status(&self, status: ProposalStatus) -> Vec<&Proposal> {
        self.proposals
            .values()
            .filter(|p| p.status == status)
            .collect()
    }

    /// Active proposals whose window has closed and can be executed at `now`.
    pub fn executable(&self, now: Timestamp) -> Vec<ProposalId> {
        self.proposals
            .values()
            .filter(|p| p.status == ProposalStatus::Active && now >= p.voting_deadline)
            .map(|p| p.id)
            .collect()
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}

/// Consistency checks a restored proposal must pass on its own.
fn check_restored(proposal: &Proposal) -> Result<(), GovernanceError> {
    let broken = |what: &str| -> Result<(), GovernanceError> {
        Err(GovernanceError::Snapshot(format!(
            "proposal {}: {what}",
            proposal.id
        )))
    };
    if !proposal.votes.is_consistent() || proposal.settled > proposal.votes.len() {
        return broken("inconsistent vote book");
    }
    let (mut for_weight, mut against_weight) = (0u128, 0u128);
    for (_, record) in proposal.votes.iter() {
        let side = if record.approve {
            &mut for_weight
        } else {
            &mut against_weight
        };
        *side = side
            .checked_add(record.weighted_power)
            .ok_or(GovernanceError::ArithmeticOverflow("restored tally"))?;
    }
    if for_weight != proposal.for_weight || against_weight != proposal.against_weight {
        return broken("tally does not match its votes");
    }
    if proposal.resolved != proposal.status.is_terminal()
        || proposal.resolved != proposal.resolved_at.is_some()
    {
        return broken("resolution flags disagree with status");
    }
    if proposal.settlement_due && !proposal.resolved {
        return broken("settlement due on an unresolved proposal");
    }
    if !proposal.settlement_due && proposal.settled > 0 {
        return broken("settled voters without a settlement pass");
    }
    Ok(())
}
