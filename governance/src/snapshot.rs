//! Serializable snapshot of the whole governance state.
//!
//! Encoded with bincode. Restoring re-checks what the live state maintains:
//! supply within the cap, each tally equal to its votes, resolution flags
//! matching status, and every account's locked tokens equal to its unsettled
//! vote costs. A corrupt or hand-edited snapshot is rejected rather than
//! loaded.

use agora_reputation::ReputationRecord;
use agora_token::Account;
use agora_types::{AccountId, GovernanceParams, ProposalId};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::proposal::Proposal;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub version: u32,
    pub params: GovernanceParams,
    /// Ledger accounts, sorted by id.
    pub accounts: Vec<(AccountId, Account)>,
    /// Reputation records, sorted by id.
    pub reputation: Vec<(AccountId, ReputationRecord)>,
    /// Proposals in id order.
    pub proposals: Vec<Proposal>,
    pub next_proposal_id: ProposalId,
}

impl GovernanceSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(self).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: Self =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GovernanceError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> GovernanceSnapshot {
        GovernanceSnapshot {
            version: SNAPSHOT_VERSION,
            params: GovernanceParams::standard(),
            accounts: vec![(
                AccountId::new("alice"),
                Account {
                    balance: 1_000,
                    locked: 25,
                },
            )],
            reputation: vec![(
                AccountId::new("alice"),
                ReputationRecord {
                    score: 20,
                    total_votes: 1,
                    majority_votes: 1,
                    consecutive_correct: 1,
                },
            )],
            proposals: Vec::new(),
            next_proposal_id: ProposalId::FIRST,
        }
    }

    #[test]
    fn test_encode_decode() {
        let original = snapshot();
        let bytes = original.encode().unwrap();
        assert_eq!(GovernanceSnapshot::decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = GovernanceSnapshot::decode(&[0xff, 0x01]).unwrap_err();
        assert!(matches!(err, GovernanceError::Snapshot(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let bytes = GovernanceSnapshot {
            version: SNAPSHOT_VERSION + 1,
            ..snapshot()
        }
        .encode()
        .unwrap();
        assert!(GovernanceSnapshot::decode(&bytes).is_err());
    }
}
