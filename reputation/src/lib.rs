//! Voting reputation.
//!
//! Every account accumulates a score from how often its votes ended up on the
//! winning side of a resolved proposal. Sustained alignment earns a growing
//! streak bonus; a single minority vote resets the streak and costs a few
//! points. The score maps onto a voting-power multiplier between 1.00x and
//! 2.00x, expressed in hundredths.
//!
//! Only the holder of the tracker's [`OutcomeRecorder`] may write outcomes.

pub mod error;
pub mod record;
pub mod tracker;

pub use error::ReputationError;
pub use record::{ReputationRecord, MAX_MULTIPLIER, MAX_SCORE, MIN_MULTIPLIER};
pub use tracker::{OutcomeRecorder, ReputationTracker};
