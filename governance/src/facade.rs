//! Single entry point for external collaborators.
//!
//! The facade owns the token ledger, the reputation tracker and the proposal
//! engine behind one mutex. Each public operation runs entirely under that
//! lock, and its events reach subscribers only after the lock is released,
//! so a listener may call back into the facade.
//!
//! Delivery to listeners is not ordered across threads: two operations that
//! commit back to back on different threads may reach subscribers in either
//! order. The audit log is always in commit order; consumers that need the
//! exact sequence should read it with [`GovernanceFacade::events_since`].

use std::sync::{Mutex, MutexGuard};

use agora_reputation::{ReputationRecord, ReputationTracker};
use agora_token::TokenLedger;
use agora_types::{AccountId, Clock, GovernanceParams, ProposalId, SystemClock, Timestamp};
use tracing::{debug, info, warn};

use crate::engine::{ProposalEngine, SettlementReport};
use crate::error::GovernanceError;
use crate::event::{EventBus, GovernanceEvent};
use crate::proposal::{Proposal, ProposalDraft, ProposalKind, VoteRecord};
use crate::snapshot::{GovernanceSnapshot, SNAPSHOT_VERSION};
use crate::tally;

#[derive(Debug)]
struct GovernanceState {
    ledger: TokenLedger,
    reputation: ReputationTracker,
    engine: ProposalEngine,
    /// Every committed event, in commit order.
    log: Vec<GovernanceEvent>,
}

#[derive(Debug)]
pub struct GovernanceFacade<C: Clock = SystemClock> {
    state: Mutex<GovernanceState>,
    clock: C,
    bus: EventBus,
}

impl<C: Clock> GovernanceFacade<C> {
    pub fn new(params: GovernanceParams, clock: C) -> Result<Self, GovernanceError> {
        params.validate()?;
        let (reputation, recorder) = ReputationTracker::new();
        let state = GovernanceState {
            ledger: TokenLedger::with_params(&params),
            reputation,
            engine: ProposalEngine::new(params, recorder),
            log: Vec::new(),
        };
        info!("governance facade initialised");
        Ok(Self {
            state: Mutex::new(state),
            clock,
            bus: EventBus::new(),
        })
    }

    /// Register a listener for every future event.
    ///
    /// Events of one operation arrive in order, but operations running on
    /// different threads may interleave out of commit order.
    pub fn subscribe(&mut self, listener: impl Fn(&GovernanceEvent) + Send + Sync + 'static) {
        self.bus.subscribe(listener);
    }

    fn lock(&self) -> Result<MutexGuard<'_, GovernanceState>, GovernanceError> {
        self.state.lock().map_err(|_| GovernanceError::StatePoisoned)
    }

    /// Run one mutating operation under the lock, then publish its events.
    fn transact<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut GovernanceState, &mut Vec<GovernanceEvent>) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let mut events = Vec::new();
        let result = {
            let mut state = self.lock()?;
            let result = f(&mut *state, &mut events);
            if result.is_ok() {
                state.log.extend(events.iter().cloned());
            }
            result
        };
        match result {
            Ok(value) => {
                for event in &events {
                    self.bus.emit(event);
                }
                Ok(value)
            }
            Err(e) => {
                warn!(op, kind = ?e.kind(), error = %e, "operation rejected");
                Err(e)
            }
        }
    }

    // ── Mutating operations ──────────────────────────────────────────────

    pub fn mint(&self, account: &AccountId, amount: u128) -> Result<(), GovernanceError> {
        self.transact("mint", |state, events| {
            state.ledger.mint(account, amount)?;
            events.push(GovernanceEvent::TokensMinted {
                account: account.clone(),
                amount,
            });
            Ok(())
        })
    }

    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        self.transact("transfer", |state, events| {
            state.ledger.transfer(from, to, amount)?;
            events.push(GovernanceEvent::TokensTransferred {
                from: from.clone(),
                to: to.clone(),
                amount,
            });
            Ok(())
        })
    }

    pub fn create_proposal(
        &self,
        proposer: &AccountId,
        kind: ProposalKind,
        title: impl Into<String>,
        description: impl Into<String>,
        content_ref: impl Into<String>,
    ) -> Result<ProposalId, GovernanceError> {
        let draft = ProposalDraft {
            kind,
            title: title.into(),
            description: description.into(),
            content_ref: content_ref.into(),
        };
        let now = self.clock.now();
        self.transact("create_proposal", |state, events| {
            state
                .engine
                .create_proposal(&state.ledger, proposer, draft, now, events)
        })
    }

    pub fn vote(
        &self,
        id: ProposalId,
        voter: &AccountId,
        approve: bool,
        raw_votes: u64,
    ) -> Result<VoteRecord, GovernanceError> {
        let now = self.clock.now();
        self.transact("vote", |state, events| {
            let GovernanceState {
                ledger,
                reputation,
                engine,
                ..
            } = state;
            engine.vote(ledger, reputation, id, voter, approve, raw_votes, now, events)
        })
    }

    /// Resolve a proposal whose voting window has closed and settle the first
    /// batch of its voters.
    pub fn execute(&self, id: ProposalId) -> Result<SettlementReport, GovernanceError> {
        let now = self.clock.now();
        self.transact("execute", |state, events| {
            let GovernanceState {
                ledger,
                reputation,
                engine,
                ..
            } = state;
            engine.execute(ledger, reputation, id, now, events)
        })
    }

    /// Settle the next batch of voters of a resolved proposal.
    pub fn settle(&self, id: ProposalId) -> Result<SettlementReport, GovernanceError> {
        self.transact("settle", |state, events| {
            let GovernanceState {
                ledger,
                reputation,
                engine,
                ..
            } = state;
            engine.settle(ledger, reputation, id, events)
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn get_proposal(&self, id: ProposalId) -> Result<Proposal, GovernanceError> {
        self.lock()?
            .engine
            .proposal(id)
            .cloned()
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    pub fn get_vote(
        &self,
        id: ProposalId,
        voter: &AccountId,
    ) -> Result<Option<VoteRecord>, GovernanceError> {
        let state = self.lock()?;
        let proposal = state
            .engine
            .proposal(id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        Ok(proposal.vote(voter).copied())
    }

    /// Voters of a proposal in the order they voted.
    pub fn get_voters(&self, id: ProposalId) -> Result<Vec<AccountId>, GovernanceError> {
        self.lock()?
            .engine
            .voters(id)
            .map(<[AccountId]>::to_vec)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    pub fn proposal_count(&self) -> Result<usize, GovernanceError> {
        Ok(self.lock()?.engine.proposal_count())
    }

    /// Token cost of casting `raw_votes` votes.
    pub fn preview_vote_cost(&self, raw_votes: u64) -> Result<u128, GovernanceError> {
        let unit = self.lock()?.engine.params().unit;
        tally::vote_cost(raw_votes, unit)
    }

    /// Weighted power `account` would get for `raw_votes` votes right now.
    pub fn preview_weighted_power(
        &self,
        account: &AccountId,
        raw_votes: u64,
    ) -> Result<u128, GovernanceError> {
        let multiplier = self.lock()?.reputation.voting_multiplier(account);
        Ok(tally::weighted_power(raw_votes, multiplier))
    }

    pub fn balance(&self, account: &AccountId) -> Result<u128, GovernanceError> {
        Ok(self.lock()?.ledger.balance(account))
    }

    pub fn available(&self, account: &AccountId) -> Result<u128, GovernanceError> {
        Ok(self.lock()?.ledger.available(account))
    }

    pub fn locked(&self, account: &AccountId) -> Result<u128, GovernanceError> {
        Ok(self.lock()?.ledger.locked(account))
    }

    pub fn total_supply(&self) -> Result<u128, GovernanceError> {
        Ok(self.lock()?.ledger.total_supply())
    }

    pub fn total_locked(&self) -> Result<u128, GovernanceError> {
        Ok(self.lock()?.ledger.total_locked())
    }

    pub fn reputation(&self, account: &AccountId) -> Result<ReputationRecord, GovernanceError> {
        Ok(self.lock()?.reputation.record(account))
    }

    pub fn voting_multiplier(&self, account: &AccountId) -> Result<u32, GovernanceError> {
        Ok(self.lock()?.reputation.voting_multiplier(account))
    }

    pub fn accuracy(&self, account: &AccountId) -> Result<u64, GovernanceError> {
        Ok(self.lock()?.reputation.accuracy(account))
    }

    pub fn pending_settlement(&self, id: ProposalId) -> Result<usize, GovernanceError> {
        self.lock()?
            .engine
            .pending_settlement(id)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    /// Active proposals whose voting window has closed.
    pub fn executable(&self) -> Result<Vec<ProposalId>, GovernanceError> {
        let now = self.clock.now();
        Ok(self.lock()?.engine.executable(now))
    }

    pub fn params(&self) -> Result<GovernanceParams, GovernanceError> {
        Ok(self.lock()?.engine.params().clone())
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Audit log ────────────────────────────────────────────────────────

    /// Every event committed so far.
    pub fn events(&self) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        Ok(self.lock()?.log.clone())
    }

    /// Events committed at or after position `cursor`, with the next cursor.
    pub fn events_since(
        &self,
        cursor: usize,
    ) -> Result<(Vec<GovernanceEvent>, usize), GovernanceError> {
        let state = self.lock()?;
        let start = cursor.min(state.log.len());
        Ok((state.log[start..].to_vec(), state.log.len()))
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the full governance state. The audit log is not included.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        let snapshot = {
            let state = self.lock()?;
            let mut accounts: Vec<_> = state
                .ledger
                .accounts()
                .map(|(id, account)| (id.clone(), *account))
                .collect();
            accounts.sort_by(|a, b| a.0.cmp(&b.0));
            let mut reputation: Vec<_> = state
                .reputation
                .records()
                .map(|(id, record)| (id.clone(), *record))
                .collect();
            reputation.sort_by(|a, b| a.0.cmp(&b.0));
            GovernanceSnapshot {
                version: SNAPSHOT_VERSION,
                params: state.engine.params().clone(),
                accounts,
                reputation,
                proposals: state.engine.proposals().cloned().collect(),
                next_proposal_id: state.engine.next_id(),
            }
        };
        let bytes = snapshot.encode()?;
        debug!(
            bytes = bytes.len(),
            proposals = snapshot.proposals.len(),
            "state saved"
        );
        Ok(bytes)
    }

    /// Rebuild a facade from bytes produced by [`save_state`](Self::save_state).
    ///
    /// The reputation tracker is restored with a fresh recording capability.
    /// Subscribers are not persisted.
    pub fn load_state(data: &[u8], clock: C) -> Result<Self, GovernanceError> {
        let snapshot = GovernanceSnapshot::decode(data)?;
        snapshot.params.validate()?;
        let ledger = TokenLedger::from_accounts(snapshot.params.max_supply, snapshot.accounts)?;
        let (reputation, recorder) = ReputationTracker::from_records(snapshot.reputation);
        let proposal_count = snapshot.proposals.len();
        let engine = ProposalEngine::restore(
            snapshot.params,
            recorder,
            &ledger,
            snapshot.proposals,
            snapshot.next_proposal_id,
        )?;
        info!(
            accounts = ledger.account_count(),
            proposals = proposal_count,
            "state loaded"
        );
        Ok(Self {
            state: Mutex::new(GovernanceState {
                ledger,
                reputation,
                engine,
                log: Vec::new(),
            }),
            clock,
            bus: EventBus::new(),
        })
    }
}
