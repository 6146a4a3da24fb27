use std::sync::Arc;

use proptest::prelude::*;

use agora_governance::{ErrorKind, GovernanceFacade, ProposalKind, ProposalStatus};
use agora_nullables::NullClock;
use agora_types::{AccountId, GovernanceParams, ProposalId};

const PERIOD: u64 = 100;
const ACCOUNTS: usize = 4;

#[derive(Clone, Debug)]
enum Op {
    Propose(usize),
    Vote(usize, usize, bool, u64),
    Transfer(usize, usize, u128),
    Advance(u64),
    Execute(usize),
    Settle(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS).prop_map(Op::Propose),
        (0usize..4, 0..ACCOUNTS, any::<bool>(), 0u64..12)
            .prop_map(|(p, a, approve, n)| Op::Vote(p, a, approve, n)),
        (0..ACCOUNTS, 0..ACCOUNTS, 0u128..200).prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
        (0u64..60).prop_map(Op::Advance),
        (0usize..4).prop_map(Op::Execute),
        (0usize..4).prop_map(Op::Settle),
    ]
}

fn account(i: usize) -> AccountId {
    AccountId::new(format!("member-{i}"))
}

fn params(batch: usize) -> GovernanceParams {
    GovernanceParams {
        voting_period_secs: PERIOD,
        quorum_pct: 1,
        approval_threshold_pct: 50,
        proposal_threshold: 10,
        unit: 1,
        max_supply: 1_000_000,
        settlement_batch_size: batch,
        refund_on_expiry: false,
    }
}

proptest! {
    /// Previewed cost is exactly n² · unit.
    #[test]
    fn preview_cost_is_square(n in 1u64..1_000_000, unit in 1u128..1_000_000) {
        let facade = GovernanceFacade::new(
            GovernanceParams { unit, ..params(8) },
            NullClock::new(0),
        ).unwrap();
        let n128 = n as u128;
        prop_assert_eq!(facade.preview_vote_cost(n).unwrap(), n128 * n128 * unit);
    }

    /// Across arbitrary operation sequences: `locked <= balance` for every
    /// account, a second vote always fails with `AlreadyVoted`, and terminal
    /// statuses never change.
    #[test]
    fn governance_invariants_hold(
        ops in prop::collection::vec(op(), 1..80),
        batch in 1usize..4,
    ) {
        let clock = Arc::new(NullClock::new(1_000));
        let facade = GovernanceFacade::new(params(batch), clock.clone()).unwrap();
        for i in 0..ACCOUNTS {
            facade.mint(&account(i), 300).unwrap();
        }
        let mut ids: Vec<ProposalId> = Vec::new();

        for op in ops {
            let statuses: Vec<_> = ids
                .iter()
                .map(|id| facade.get_proposal(*id).unwrap().status)
                .collect();
            match op {
                Op::Propose(a) => {
                    if let Ok(id) = facade.create_proposal(
                        &account(a), ProposalKind::Policy, "policy", "", "policy:1",
                    ) {
                        ids.push(id);
                    }
                }
                Op::Vote(p, a, approve, n) => {
                    if let Some(id) = ids.get(p).copied() {
                        let had_voted = facade.get_vote(id, &account(a)).unwrap().is_some();
                        let result = facade.vote(id, &account(a), approve, n);
                        if had_voted {
                            prop_assert!(result.is_err());
                            let kind = result.unwrap_err().kind();
                            prop_assert!(
                                kind == ErrorKind::AlreadyVoted
                                    || kind == ErrorKind::ProposalNotActive
                                    || kind == ErrorKind::VotingPeriodEnded
                            );
                        }
                    }
                }
                Op::Transfer(a, b, n) => {
                    let _ = facade.transfer(&account(a), &account(b), n);
                }
                Op::Advance(secs) => clock.advance(secs),
                Op::Execute(p) => {
                    if let Some(id) = ids.get(p).copied() {
                        let _ = facade.execute(id);
                    }
                }
                Op::Settle(p) => {
                    if let Some(id) = ids.get(p).copied() {
                        let _ = facade.settle(id);
                    }
                }
            }

            for i in 0..ACCOUNTS {
                let balance = facade.balance(&account(i)).unwrap();
                let locked = facade.locked(&account(i)).unwrap();
                prop_assert!(locked <= balance);
            }
            for (id, before) in ids.iter().zip(statuses) {
                if before.is_terminal() {
                    prop_assert_eq!(facade.get_proposal(*id).unwrap().status, before);
                }
            }
        }
    }

    /// Once a resolved proposal is fully settled, none of its vote costs
    /// remain locked, whatever the batch size.
    #[test]
    fn settled_proposals_release_all_locks(
        votes in prop::collection::vec((0..ACCOUNTS, any::<bool>(), 1u64..10), 1..12),
        batch in 1usize..4,
    ) {
        let clock = Arc::new(NullClock::new(0));
        let facade = GovernanceFacade::new(
            GovernanceParams { quorum_pct: 0, ..params(batch) },
            clock.clone(),
        ).unwrap();
        for i in 0..ACCOUNTS {
            facade.mint(&account(i), 1_000).unwrap();
        }
        let id = facade
            .create_proposal(&account(0), ProposalKind::Approve, "keep post", "", "post:7")
            .unwrap();
        let mut expected_locked = 0u128;
        for (a, approve, n) in votes {
            if let Ok(record) = facade.vote(id, &account(a), approve, n) {
                expected_locked += record.tokens_cost;
            }
        }
        prop_assert_eq!(facade.total_locked().unwrap(), expected_locked);

        clock.advance(PERIOD);
        let mut report = facade.execute(id).unwrap();
        prop_assert_ne!(report.status, ProposalStatus::Expired);
        while report.remaining > 0 {
            report = facade.settle(id).unwrap();
        }
        prop_assert_eq!(facade.total_locked().unwrap(), 0);
    }
}
