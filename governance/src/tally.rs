//! Vote pricing and outcome arithmetic.
//!
//! Pure functions, no ledger access. Voting is priced quadratically: buying
//! `n` votes costs `n² · unit`, so every extra vote costs more than the one
//! before it.

use agora_types::GovernanceParams;

use crate::error::GovernanceError;
use crate::proposal::ProposalStatus;

/// Token cost of casting `raw_votes` votes.
pub fn vote_cost(raw_votes: u64, unit: u128) -> Result<u128, GovernanceError> {
    if raw_votes == 0 {
        return Err(GovernanceError::InvalidVoteCount);
    }
    // u64² always fits in u128.
    let squared = (raw_votes as u128) * (raw_votes as u128);
    squared
        .checked_mul(unit)
        .ok_or(GovernanceError::ArithmeticOverflow("vote cost"))
}

/// Tallied power of `raw_votes` at a multiplier given in hundredths.
pub fn weighted_power(raw_votes: u64, multiplier: u32) -> u128 {
    (raw_votes as u128) * (multiplier as u128) / 100
}

/// `floor(total_supply · quorum_pct / 100)`, computed without overflow.
pub fn quorum_required(total_supply: u128, quorum_pct: u8) -> u128 {
    let pct = quorum_pct as u128;
    (total_supply / 100) * pct + (total_supply % 100) * pct / 100
}

/// Share of the weighted vote in favour, as a whole percentage.
pub fn approval_pct(for_weight: u128, total_weight: u128) -> Result<u128, GovernanceError> {
    if total_weight == 0 {
        return Ok(0);
    }
    let scaled = for_weight
        .checked_mul(100)
        .ok_or(GovernanceError::ArithmeticOverflow("approval percentage"))?;
    Ok(scaled / total_weight)
}

/// Decide the terminal status of a proposal from its final tally.
///
/// Below quorum, or with no participation at all, the proposal expires.
/// Otherwise it passes when the approval share reaches the threshold
/// (reaching it exactly counts).
pub fn decide(
    for_weight: u128,
    against_weight: u128,
    total_supply: u128,
    params: &GovernanceParams,
) -> Result<ProposalStatus, GovernanceError> {
    let total_weight = for_weight
        .checked_add(against_weight)
        .ok_or(GovernanceError::ArithmeticOverflow("total weight"))?;
    if total_weight == 0 || total_weight < quorum_required(total_supply, params.quorum_pct) {
        return Ok(ProposalStatus::Expired);
    }
    if approval_pct(for_weight, total_weight)? >= params.approval_threshold_pct as u128 {
        Ok(ProposalStatus::Executed)
    } else {
        Ok(ProposalStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GovernanceParams {
        GovernanceParams {
            quorum_pct: 20,
            approval_threshold_pct: 50,
            ..GovernanceParams::dev_defaults()
        }
    }

    #[test]
    fn test_vote_cost_is_quadratic() {
        assert_eq!(vote_cost(1, 1).unwrap(), 1);
        assert_eq!(vote_cost(5, 1).unwrap(), 25);
        assert_eq!(vote_cost(10, 1).unwrap(), 100);
        assert_eq!(vote_cost(5, 1_000).unwrap(), 25_000);
    }

    #[test]
    fn test_vote_cost_marginal_increases() {
        let mut previous_step = 0;
        for n in 1..50u64 {
            let step = vote_cost(n + 1, 1).unwrap() - vote_cost(n, 1).unwrap();
            assert!(step > previous_step);
            previous_step = step;
        }
    }

    #[test]
    fn test_vote_cost_zero_rejected() {
        assert!(matches!(vote_cost(0, 1), Err(GovernanceError::InvalidVoteCount)));
    }

    #[test]
    fn test_vote_cost_overflow() {
        assert!(matches!(
            vote_cost(u64::MAX, u128::MAX),
            Err(GovernanceError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn test_weighted_power_floors() {
        assert_eq!(weighted_power(5, 100), 5);
        assert_eq!(weighted_power(5, 150), 7);
        assert_eq!(weighted_power(3, 200), 6);
        assert_eq!(weighted_power(1, 199), 1);
    }

    #[test]
    fn test_quorum_required_matches_naive() {
        for supply in [0u128, 1, 99, 100, 2_500, 123_457] {
            for pct in [0u8, 1, 20, 33, 100] {
                assert_eq!(
                    quorum_required(supply, pct),
                    supply * pct as u128 / 100,
                    "supply {supply} pct {pct}"
                );
            }
        }
    }

    #[test]
    fn test_quorum_required_huge_supply() {
        assert_eq!(quorum_required(u128::MAX, 100), u128::MAX);
    }

    #[test]
    fn test_decide_executed() {
        // 700/300 with quorum 500 (20% of 2,500).
        assert_eq!(
            decide(700, 300, 2_500, &params()).unwrap(),
            ProposalStatus::Executed
        );
    }

    #[test]
    fn test_decide_rejected() {
        assert_eq!(
            decide(400, 600, 2_500, &params()).unwrap(),
            ProposalStatus::Rejected
        );
    }

    #[test]
    fn test_decide_threshold_exact_passes() {
        assert_eq!(
            decide(500, 500, 2_500, &params()).unwrap(),
            ProposalStatus::Executed
        );
    }

    #[test]
    fn test_decide_below_quorum_expires() {
        assert_eq!(
            decide(499, 0, 2_500, &params()).unwrap(),
            ProposalStatus::Expired
        );
    }

    #[test]
    fn test_decide_no_votes_expires_even_without_quorum() {
        let p = GovernanceParams {
            quorum_pct: 0,
            ..params()
        };
        assert_eq!(decide(0, 0, 0, &p).unwrap(), ProposalStatus::Expired);
    }
}
