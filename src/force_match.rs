//! Manual force-match boundary operation.
//!
//! Force-match never mutates a prior run result. It validates the requested
//! records against the zero-difference rule and returns a delta group that
//! the orchestration layer merges into a new result, preserving the
//! append-only nature of run artifacts.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::matching::MatchGroup;
use crate::run_result::RunResult;
use crate::types::{DebitCredit, FeedSource, MatchStatus, ReconError, ReconResult};

/// Overlay produced by a successful force-match: a new group whose members
/// all move to `FORCE_MATCHED` status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceMatchDelta {
    pub group: MatchGroup,
    pub status: MatchStatus,
}

/// Validate and derive a force-match delta over records of an existing run.
///
/// Requires at least two records drawn from at least two distinct sources,
/// all present in the run result, and the zero-difference rule: the debit-leg
/// amounts must sum to exactly the credit-leg amounts.
pub fn force_match(result: &RunResult, record_ids: &[&str]) -> ReconResult<ForceMatchDelta> {
    if record_ids.len() < 2 {
        return Err(ReconError::ForceMatchCardinality);
    }

    let mut sources: HashSet<FeedSource> = HashSet::new();
    let mut debits = BigDecimal::from(0);
    let mut credits = BigDecimal::from(0);
    let mut member_ids = Vec::with_capacity(record_ids.len());

    for record_id in record_ids {
        let outcome = result
            .find_record(record_id)
            .ok_or_else(|| ReconError::RecordNotFound(record_id.to_string()))?;
        let amount = outcome
            .record
            .amount
            .clone()
            .ok_or_else(|| ReconError::ForceMatchMissingAmount(record_id.to_string()))?;

        sources.insert(outcome.record.source);
        match outcome.record.debit_credit {
            DebitCredit::Debit => debits += amount,
            DebitCredit::Credit => credits += amount,
        }
        member_ids.push(record_id.to_string());
    }

    if sources.len() < 2 {
        return Err(ReconError::ForceMatchCardinality);
    }

    if debits != credits {
        return Err(ReconError::ZeroDifferenceViolation { debits, credits });
    }

    Ok(ForceMatchDelta {
        group: MatchGroup {
            group_id: Uuid::new_v4(),
            round: None,
            member_record_ids: member_ids,
            tie_break_note: Some("force matched".to_string()),
        },
        status: MatchStatus::ForceMatched,
    })
}
