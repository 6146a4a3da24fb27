//! JSON-lines command journal replayed through the governance facade.
//!
//! One command per line, externally tagged:
//!
//! ```text
//! {"mint": {"account": "alice", "amount": 1000}}
//! {"propose": {"proposer": "alice", "kind": "remove", "title": "Spam", "content_ref": "post:9"}}
//! {"vote": {"id": 1, "voter": "alice", "approve": true, "votes": 5}}
//! {"advance": {"secs": 3600}}
//! {"execute": {"id": 1}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Every committed event
//! is written to the output as one JSON object per line; a rejected command
//! is written as an `{"rejected": ...}` record and replay continues.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use agora_governance::{ErrorKind, GovernanceError, GovernanceFacade, ProposalKind};
use agora_nullables::NullClock;
use agora_types::{AccountId, ProposalId};
use agora_utils::format_remaining;

pub type ReplayFacade = GovernanceFacade<Arc<NullClock>>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Command {
    Mint {
        account: String,
        amount: u128,
    },
    Transfer {
        from: String,
        to: String,
        amount: u128,
    },
    Propose {
        proposer: String,
        kind: ProposalKind,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        content_ref: String,
    },
    Vote {
        id: ProposalId,
        voter: String,
        approve: bool,
        votes: u64,
    },
    Execute {
        id: ProposalId,
    },
    /// Execute every active proposal whose window has closed.
    ExecuteDue {},
    Settle {
        id: ProposalId,
    },
    /// Move the replay clock forward.
    Advance {
        secs: u64,
    },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[derive(Debug, Serialize)]
struct Rejection<'a> {
    line: usize,
    kind: ErrorKind,
    message: &'a str,
}

#[derive(Debug, Serialize)]
enum Record<'a> {
    #[serde(rename = "rejected")]
    Rejected(Rejection<'a>),
}

/// Counters reported at the end of a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub commands: usize,
    pub rejected: usize,
    pub events: usize,
}

fn account(raw: &str) -> Result<AccountId, GovernanceError> {
    AccountId::parse(raw).map_err(GovernanceError::from)
}

/// Apply one command. Governance rejections are returned, not raised.
fn apply(facade: &ReplayFacade, command: Command) -> Result<(), GovernanceError> {
    match command {
        Command::Mint { account: who, amount } => facade.mint(&account(&who)?, amount),
        Command::Transfer { from, to, amount } => {
            facade.transfer(&account(&from)?, &account(&to)?, amount)
        }
        Command::Propose {
            proposer,
            kind,
            title,
            description,
            content_ref,
        } => {
            let id =
                facade.create_proposal(&account(&proposer)?, kind, title, description, content_ref)?;
            let proposal = facade.get_proposal(id)?;
            debug!(
                %id,
                closes_in = %format_remaining(
                    proposal.voting_deadline.as_secs(),
                    facade.now().as_secs()
                ),
                "proposal open"
            );
            Ok(())
        }
        Command::Vote {
            id,
            voter,
            approve,
            votes,
        } => facade
            .vote(id, &account(&voter)?, approve, votes)
            .map(|_| ()),
        Command::Execute { id } => facade.execute(id).map(|_| ()),
        Command::ExecuteDue {} => {
            for id in facade.executable()? {
                facade.execute(id)?;
            }
            Ok(())
        }
        Command::Settle { id } => facade.settle(id).map(|_| ()),
        Command::Advance { secs } => {
            facade.clock().advance(secs);
            Ok(())
        }
    }
}

/// Replay a command journal, writing events and rejections to `out`.
///
/// Malformed lines abort the replay; governance rejections do not.
pub fn replay<R: BufRead, W: Write>(
    facade: &ReplayFacade,
    input: R,
    mut out: W,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let (_, mut cursor) = facade.events_since(usize::MAX)?;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command =
            Command::parse(trimmed).with_context(|| format!("malformed command on line {line_no}"))?;
        summary.commands += 1;

        if let Err(e) = apply(facade, command) {
            summary.rejected += 1;
            let message = e.to_string();
            let record = Record::Rejected(Rejection {
                line: line_no,
                kind: e.kind(),
                message: &message,
            });
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        }

        let (events, next) = facade.events_since(cursor)?;
        cursor = next;
        for event in &events {
            serde_json::to_writer(&mut out, event)?;
            writeln!(out)?;
        }
        summary.events += events.len();
    }

    out.flush()?;
    info!(
        commands = summary.commands,
        rejected = summary.rejected,
        events = summary.events,
        "replay finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::GovernanceParams;

    fn facade() -> ReplayFacade {
        let params = GovernanceParams {
            quorum_pct: 1,
            ..GovernanceParams::dev_defaults()
        };
        GovernanceFacade::new(params, Arc::new(NullClock::new(0))).unwrap()
    }

    fn run(facade: &ReplayFacade, script: &str) -> (ReplaySummary, Vec<serde_json::Value>) {
        let mut out = Vec::new();
        let summary = replay(facade, script.as_bytes(), &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, lines)
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            Command::parse(r#"{"advance": {"secs": 60}}"#).unwrap(),
            Command::Advance { secs: 60 }
        );
        assert_eq!(
            Command::parse(r#"{"execute_due": {}}"#).unwrap(),
            Command::ExecuteDue {}
        );
        assert!(Command::parse(r#"{"vote": {"id": 1}}"#).is_err());
        assert!(Command::parse(r#"{"mint": {"account": "a", "amount": 1, "x": 2}}"#).is_err());
    }

    #[test]
    fn full_lifecycle_script() {
        let facade = facade();
        let script = r#"
# two members, one proposal
{"mint": {"account": "alice", "amount": 1000}}
{"mint": {"account": "bob", "amount": 1000}}
{"propose": {"proposer": "alice", "kind": "remove", "title": "Spam", "content_ref": "post:9"}}
{"vote": {"id": 1, "voter": "alice", "approve": true, "votes": 15}}
{"vote": {"id": 1, "voter": "bob", "approve": false, "votes": 5}}
{"advance": {"secs": 3600}}
{"execute_due": {}}
"#;
        let (summary, lines) = run(&facade, script);
        assert_eq!(summary.commands, 7);
        assert_eq!(summary.rejected, 0);
        assert_eq!(lines.len(), summary.events);

        let kinds: Vec<&str> = lines.iter().map(|l| l["event"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "tokens_minted",
                "tokens_minted",
                "proposal_created",
                "vote_cast",
                "vote_cast",
                "proposal_executed",
                "reputation_updated",
                "reputation_updated",
                "settlement_completed",
            ]
        );
        assert_eq!(lines[5]["outcome"], "executed");
        assert_eq!(facade.locked(&AccountId::new("alice")).unwrap(), 0);
    }

    #[test]
    fn rejection_is_reported_and_replay_continues() {
        let facade = facade();
        let script = r#"
{"vote": {"id": 7, "voter": "alice", "approve": true, "votes": 1}}
{"mint": {"account": "alice", "amount": 5}}
"#;
        let (summary, lines) = run(&facade, script);
        assert_eq!(summary.rejected, 1);
        assert_eq!(lines[0]["rejected"]["kind"], "InvalidProposalId");
        assert_eq!(lines[0]["rejected"]["line"], 2);
        assert_eq!(lines[1]["event"], "tokens_minted");
    }

    #[test]
    fn invalid_account_key_rejected() {
        let facade = facade();
        let (summary, lines) = run(&facade, r#"{"mint": {"account": "", "amount": 5}}"#);
        assert_eq!(summary.rejected, 1);
        assert_eq!(lines[0]["rejected"]["kind"], "InvalidParams");
    }

    #[test]
    fn malformed_line_aborts() {
        let facade = facade();
        let mut out = Vec::new();
        let err = replay(&facade, "not json\n".as_bytes(), &mut out).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
