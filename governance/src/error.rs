use agora_reputation::ReputationError;
use agora_token::LedgerError;
use agora_types::{AccountId, ProposalId, Timestamp, TypesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proposal::ProposalStatus;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    InvalidProposalId(ProposalId),

    #[error("proposal threshold not met: available {available}, need {required}")]
    ProposalThresholdNotMet { available: u128, required: u128 },

    #[error("proposal {id} is not active (status: {status:?})")]
    ProposalNotActive { id: ProposalId, status: ProposalStatus },

    #[error("voting on proposal {id} closed at {deadline}")]
    VotingPeriodEnded { id: ProposalId, deadline: Timestamp },

    #[error("voting on proposal {id} is open until {deadline} (now {now})")]
    VotingPeriodNotEnded {
        id: ProposalId,
        deadline: Timestamp,
        now: Timestamp,
    },

    #[error("{voter} has already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, voter: AccountId },

    #[error("proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),

    #[error("vote count must be positive")]
    InvalidVoteCount,

    #[error("insufficient tokens for vote: cost {cost}, available {available}")]
    InsufficientTokensForVote { cost: u128, available: u128 },

    #[error("invalid proposal content: {0}")]
    InvalidProposalContent(String),

    #[error("proposal {0} has no pending settlement")]
    NothingToSettle(ProposalId),

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] TypesError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Reputation(#[from] ReputationError),

    #[error("governance state lock poisoned")]
    StatePoisoned,

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Flat category of a [`GovernanceError`], for callers that branch on the
/// kind of failure rather than its details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidProposalId,
    ProposalThresholdNotMet,
    ProposalNotActive,
    VotingPeriodEnded,
    VotingPeriodNotEnded,
    AlreadyVoted,
    AlreadyExecuted,
    InvalidVoteCount,
    InsufficientTokensForVote,
    InsufficientAvailableBalance,
    InsufficientLockedBalance,
    SupplyCapExceeded,
    ArithmeticOverflow,
    InvalidProposalContent,
    NothingToSettle,
    InvalidParams,
    UnauthorizedRecorder,
    StatePoisoned,
    Snapshot,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidProposalId(_) => ErrorKind::InvalidProposalId,
            Self::ProposalThresholdNotMet { .. } => ErrorKind::ProposalThresholdNotMet,
            Self::ProposalNotActive { .. } => ErrorKind::ProposalNotActive,
            Self::VotingPeriodEnded { .. } => ErrorKind::VotingPeriodEnded,
            Self::VotingPeriodNotEnded { .. } => ErrorKind::VotingPeriodNotEnded,
            Self::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
            Self::AlreadyExecuted(_) => ErrorKind::AlreadyExecuted,
            Self::InvalidVoteCount => ErrorKind::InvalidVoteCount,
            Self::InsufficientTokensForVote { .. } => ErrorKind::InsufficientTokensForVote,
            Self::InvalidProposalContent(_) => ErrorKind::InvalidProposalContent,
            Self::NothingToSettle(_) => ErrorKind::NothingToSettle,
            Self::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            Self::InvalidParams(_) => ErrorKind::InvalidParams,
            Self::Ledger(e) => match e {
                LedgerError::InsufficientAvailableBalance { .. } => {
                    ErrorKind::InsufficientAvailableBalance
                }
                LedgerError::InsufficientLockedBalance { .. } => {
                    ErrorKind::InsufficientLockedBalance
                }
                LedgerError::SupplyCapExceeded { .. } => ErrorKind::SupplyCapExceeded,
                LedgerError::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            },
            Self::Reputation(e) => match e {
                ReputationError::UnauthorizedRecorder => ErrorKind::UnauthorizedRecorder,
                ReputationError::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            },
            Self::StatePoisoned => ErrorKind::StatePoisoned,
            Self::Snapshot(_) => ErrorKind::Snapshot,
        }
    }
}
