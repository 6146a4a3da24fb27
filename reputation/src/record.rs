//! A single account's voting history and the numbers derived from it.

use serde::{Deserialize, Serialize};

use crate::error::ReputationError;

/// Upper bound on a reputation score.
pub const MAX_SCORE: u32 = 1_000;

/// Multiplier of an account with no reputation (1.00x).
pub const MIN_MULTIPLIER: u32 = 100;

/// Multiplier of an account at [`MAX_SCORE`] (2.00x).
pub const MAX_MULTIPLIER: u32 = 200;

/// Base points for a vote cast with the majority.
const MAJORITY_BASE_POINTS: u64 = 10;

/// Extra points per vote of the current streak.
const STREAK_BONUS_POINTS: u64 = 10;

/// Points lost for a vote cast against the majority.
const MINORITY_PENALTY: u32 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    /// 0..=MAX_SCORE.
    pub score: u32,
    pub total_votes: u64,
    pub majority_votes: u64,
    pub consecutive_correct: u64,
}

impl ReputationRecord {
    /// The record that results from one more resolved vote.
    ///
    /// Pure: callers compute successors up front and commit them only once
    /// every step of an operation is known to succeed.
    pub fn after_outcome(&self, voted_with_majority: bool) -> Result<Self, ReputationError> {
        let total_votes = self
            .total_votes
            .checked_add(1)
            .ok_or(ReputationError::ArithmeticOverflow("total_votes"))?;

        if !voted_with_majority {
            return Ok(Self {
                score: self.score.saturating_sub(MINORITY_PENALTY),
                total_votes,
                majority_votes: self.majority_votes,
                consecutive_correct: 0,
            });
        }

        let majority_votes = self
            .majority_votes
            .checked_add(1)
            .ok_or(ReputationError::ArithmeticOverflow("majority_votes"))?;
        let consecutive_correct = self
            .consecutive_correct
            .checked_add(1)
            .ok_or(ReputationError::ArithmeticOverflow("consecutive_correct"))?;

        // The streak bonus is bounded by the cap, so saturating here is exact.
        let gain = MAJORITY_BASE_POINTS
            .saturating_add(consecutive_correct.saturating_mul(STREAK_BONUS_POINTS));
        let score = (self.score as u64)
            .saturating_add(gain)
            .min(MAX_SCORE as u64) as u32;

        Ok(Self {
            score,
            total_votes,
            majority_votes,
            consecutive_correct,
        })
    }

    /// Voting-power multiplier in hundredths: `100 + score·100/1000`, within
    /// `[MIN_MULTIPLIER, MAX_MULTIPLIER]`.
    pub fn multiplier(&self) -> u32 {
        let bonus = self.score.min(MAX_SCORE) * 100 / MAX_SCORE;
        (MIN_MULTIPLIER + bonus).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
    }

    /// Share of votes cast with the majority, as a whole percentage.
    pub fn accuracy(&self) -> u64 {
        if self.total_votes == 0 {
            return 0;
        }
        // majority_votes <= total_votes, widen to avoid overflow on the ×100.
        ((self.majority_votes as u128 * 100) / self.total_votes as u128) as u64
    }
}
