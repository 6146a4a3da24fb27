//! Per-account reputation ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use agora_types::AccountId;
use tracing::debug;

use crate::error::ReputationError;
use crate::record::ReputationRecord;

static NEXT_TRACKER_ID: AtomicU64 = AtomicU64::new(1);

/// Write capability for one [`ReputationTracker`].
///
/// Issued exactly once, together with the tracker, and not cloneable. Whoever
/// holds it is the only party able to record vote outcomes.
#[derive(Debug)]
pub struct OutcomeRecorder {
    tracker_id: u64,
}

/// Voting-accuracy history for every account that has had a vote resolved.
///
/// Records are created lazily on the first recorded outcome and never
/// removed. Reads of unknown accounts see the zero record.
#[derive(Debug)]
pub struct ReputationTracker {
    id: u64,
    records: HashMap<AccountId, ReputationRecord>,
}

impl ReputationTracker {
    /// Create an empty tracker and its recording capability.
    pub fn new() -> (Self, OutcomeRecorder) {
        Self::from_records(std::iter::empty())
    }

    /// Rebuild a tracker from exported records, issuing a fresh capability.
    pub fn from_records(
        records: impl IntoIterator<Item = (AccountId, ReputationRecord)>,
    ) -> (Self, OutcomeRecorder) {
        let id = NEXT_TRACKER_ID.fetch_add(1, Ordering::Relaxed);
        let tracker = Self {
            id,
            records: records.into_iter().collect(),
        };
        (tracker, OutcomeRecorder { tracker_id: id })
    }

    /// Apply one resolved vote to `account`'s history.
    pub fn record_outcome(
        &mut self,
        recorder: &OutcomeRecorder,
        account: &AccountId,
        voted_with_majority: bool,
    ) -> Result<ReputationRecord, ReputationError> {
        self.check_recorder(recorder)?;
        let next = self.record(account).after_outcome(voted_with_majority)?;
        self.records.insert(account.clone(), next);
        debug!(
            %account,
            voted_with_majority,
            score = next.score,
            streak = next.consecutive_correct,
            "reputation updated"
        );
        Ok(next)
    }

    /// Fail unless `recorder` belongs to this tracker.
    pub fn check_recorder(&self, recorder: &OutcomeRecorder) -> Result<(), ReputationError> {
        if recorder.tracker_id != self.id {
            return Err(ReputationError::UnauthorizedRecorder);
        }
        Ok(())
    }

    /// Current record; the zero record for accounts never seen.
    pub fn record(&self, account: &AccountId) -> ReputationRecord {
        self.records.get(account).copied().unwrap_or_default()
    }

    pub fn score(&self, account: &AccountId) -> u32 {
        self.record(account).score
    }

    /// Voting-power multiplier in hundredths (100 = 1.00x, 200 = 2.00x).
    pub fn voting_multiplier(&self, account: &AccountId) -> u32 {
        self.record(account).multiplier()
    }

    /// Percentage of the account's resolved votes that sided with the majority.
    pub fn accuracy(&self, account: &AccountId) -> u64 {
        self.record(account).accuracy()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (&AccountId, &ReputationRecord)> {
        self.records.iter()
    }
}
