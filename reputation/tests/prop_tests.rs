use proptest::prelude::*;

use agora_reputation::{ReputationRecord, ReputationTracker, MAX_MULTIPLIER, MAX_SCORE, MIN_MULTIPLIER};
use agora_types::AccountId;

proptest! {
    /// The multiplier is non-decreasing in score and stays within [100, 200].
    #[test]
    fn multiplier_monotone_and_bounded(a in 0u32..=MAX_SCORE, b in 0u32..=MAX_SCORE) {
        let ra = ReputationRecord { score: a, ..Default::default() };
        let rb = ReputationRecord { score: b, ..Default::default() };
        prop_assert!(ra.multiplier() >= MIN_MULTIPLIER && ra.multiplier() <= MAX_MULTIPLIER);
        if a <= b {
            prop_assert!(ra.multiplier() <= rb.multiplier());
        }
    }

    /// Any outcome sequence keeps the score in range and the counters consistent.
    #[test]
    fn outcome_sequences_stay_in_range(outcomes in prop::collection::vec(any::<bool>(), 0..200)) {
        let (mut tracker, recorder) = ReputationTracker::new();
        let alice = AccountId::new("alice");
        let mut streak = 0u64;
        for (i, with_majority) in outcomes.iter().enumerate() {
            let before = tracker.record(&alice);
            let after = tracker.record_outcome(&recorder, &alice, *with_majority).unwrap();
            streak = if *with_majority { streak + 1 } else { 0 };

            prop_assert!(after.score <= MAX_SCORE);
            prop_assert_eq!(after.total_votes, i as u64 + 1);
            prop_assert!(after.majority_votes <= after.total_votes);
            prop_assert_eq!(after.consecutive_correct, streak);
            if *with_majority {
                prop_assert!(after.score >= before.score);
            } else {
                prop_assert!(after.score <= before.score);
            }
            prop_assert!(tracker.accuracy(&alice) <= 100);
        }
    }
}
