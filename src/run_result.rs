//! The immutable output artifact of one reconciliation run.
//!
//! A run result is assembled once at the end of the engine invocation and
//! never mutated afterwards; a rerun produces a new result rather than
//! patching a prior one. Force-match and rollback overlay deltas externally.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exception::ExceptionRecord;
use crate::matching::MatchGroup;
use crate::ttum::TtumCandidate;
use crate::types::{MatchStatus, TransactionRecord};

/// Per-status counts for one run. The counts always sum back to `total`
/// (conservation: no record is silently dropped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub partial_match: usize,
    pub partial_mismatch: usize,
    pub orphan: usize,
    pub hanging: usize,
    pub duplicate: usize,
    pub self_matched: usize,
    pub settlement_entry: usize,
    pub force_matched: usize,
    pub processing_error: usize,
}

impl RunSummary {
    /// Count one record under its status
    pub fn record(&mut self, status: MatchStatus) {
        self.total += 1;
        match status {
            MatchStatus::Matched => self.matched += 1,
            MatchStatus::PartialMatch => self.partial_match += 1,
            MatchStatus::PartialMismatch => self.partial_mismatch += 1,
            MatchStatus::Orphan => self.orphan += 1,
            MatchStatus::Hanging => self.hanging += 1,
            MatchStatus::Duplicate => self.duplicate += 1,
            MatchStatus::SelfMatched => self.self_matched += 1,
            MatchStatus::SettlementEntry => self.settlement_entry += 1,
            MatchStatus::ForceMatched => self.force_matched += 1,
            MatchStatus::ProcessingError => self.processing_error += 1,
        }
    }

    /// Sum of all per-status counts; equals `total` when conservation holds
    pub fn status_sum(&self) -> usize {
        self.matched
            + self.partial_match
            + self.partial_mismatch
            + self.orphan
            + self.hanging
            + self.duplicate
            + self.self_matched
            + self.settlement_entry
            + self.force_matched
            + self.processing_error
    }
}

/// One input record with its assigned status and group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub status: MatchStatus,
    pub group_id: Uuid,
}

/// Aggregated output of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub cycle_id: String,
    pub summary: RunSummary,
    pub records: Vec<RecordOutcome>,
    pub exceptions: Vec<ExceptionRecord>,
    pub ttum_candidates: Vec<TtumCandidate>,
    pub match_groups: Vec<MatchGroup>,
}

impl RunResult {
    /// Look up a record outcome by record id
    pub fn find_record(&self, record_id: &str) -> Option<&RecordOutcome> {
        self.records.iter().find(|r| r.record.record_id == record_id)
    }

    /// Records deferred at the cut-off, to be re-queued into the next
    /// cycle's pool by the orchestration layer
    pub fn hanging_records(&self) -> Vec<&TransactionRecord> {
        self.records
            .iter()
            .filter(|r| r.status == MatchStatus::Hanging)
            .map(|r| &r.record)
            .collect()
    }

    /// Whether every input record was assigned exactly one status
    pub fn is_conserved(&self) -> bool {
        self.summary.total == self.summary.status_sum()
            && self.summary.total == self.records.len()
    }
}
