//! Errors raised while constructing shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("invalid governance parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}
