//! Reputation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReputationError {
    #[error("outcome recorder was issued by a different tracker")]
    UnauthorizedRecorder,

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}
