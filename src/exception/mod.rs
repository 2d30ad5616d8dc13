//! Exception classification via a status-combination lookup matrix.
//!
//! Every match group that did not reconcile cleanly is mapped to an exception
//! type by looking up the per-source presence/response state of its members.
//! The matrix is total: a combination with no entry degrades to
//! [`ExceptionType::Unmatched`] for manual review instead of failing, so the
//! classifier can never reject novel input.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::ReconConfig;
use crate::matching::MatchGroup;
use crate::ttum::TtumType;
use crate::types::{DebitCredit, Direction, FeedSource, MatchStatus, TransactionRecord};

/// Observed state of one feed source within a match group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceState {
    /// No record from this feed
    Absent,
    /// Record present with a success response code
    Success,
    /// Record present with a failure (or missing) response code
    Failed,
}

impl SourceState {
    fn of(record: Option<&TransactionRecord>) -> SourceState {
        match record {
            None => SourceState::Absent,
            Some(r) if r.is_success() => SourceState::Success,
            Some(_) => SourceState::Failed,
        }
    }
}

/// Lookup key into the classification matrix: one state per feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCombo {
    pub ledger: SourceState,
    pub switch: SourceState,
    pub network: SourceState,
}

impl SourceCombo {
    pub fn new(ledger: SourceState, switch: SourceState, network: SourceState) -> Self {
        Self {
            ledger,
            switch,
            network,
        }
    }
}

/// Exception categories assigned to unreconciled groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    /// Customer was debited but the transaction never completed downstream;
    /// the remitter must be refunded
    RemitterRefund,
    /// Switch records disagree with ledger/network; switch-side data fix
    SwitchUpdate,
    /// Transaction settled at the network but was never posted to the ledger
    LedgerPosting,
    /// Discarded duplicate feed row
    DuplicateFeedEntry,
    /// Record was missing fields required for matching
    ProcessingDefect,
    /// No rule applies; routed to manual review
    Unmatched,
}

/// One entry of the classification matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    pub exception_type: ExceptionType,
    pub ttum_required: bool,
}

impl ExceptionRule {
    pub fn new(exception_type: ExceptionType, ttum_required: bool) -> Self {
        Self {
            exception_type,
            ttum_required,
        }
    }
}

/// A classified exception, denormalized for downstream display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    /// Match group this exception was derived from
    pub group_id: Uuid,
    /// RRN shared by the group members (empty when none carried one)
    pub rrn: String,
    pub exception_type: ExceptionType,
    pub ttum_required: bool,
    /// Remediation instruction type, when a TTUM rule is configured
    pub ttum_type: Option<TtumType>,
    /// Representative amount (ledger first, then first present source)
    pub amount: Option<BigDecimal>,
    pub direction: Direction,
    pub debit_credit: DebitCredit,
    pub txn_date: Option<NaiveDate>,
    pub cycle_id: String,
    /// Feeds that reported the transaction
    pub sources_present: Vec<FeedSource>,
    pub ledger_response: Option<String>,
    pub switch_response: Option<String>,
    pub network_response: Option<String>,
}

/// The built-in classification matrix.
///
/// "Present" rows of the business rules expand into both Success and Failed
/// states for that source.
pub fn default_exception_matrix() -> HashMap<SourceCombo, ExceptionRule> {
    use ExceptionType::*;
    use SourceState::*;

    let mut matrix = HashMap::new();

    // Ledger debit succeeded but the transaction died downstream: refund.
    matrix.insert(
        SourceCombo::new(Success, Success, Absent),
        ExceptionRule::new(RemitterRefund, true),
    );
    matrix.insert(
        SourceCombo::new(Success, Absent, Absent),
        ExceptionRule::new(RemitterRefund, true),
    );
    matrix.insert(
        SourceCombo::new(Success, Failed, Absent),
        ExceptionRule::new(RemitterRefund, true),
    );
    matrix.insert(
        SourceCombo::new(Success, Failed, Failed),
        ExceptionRule::new(RemitterRefund, true),
    );
    matrix.insert(
        SourceCombo::new(Success, Failed, Success),
        ExceptionRule::new(RemitterRefund, true),
    );

    // Network settled but the switch never saw it: switch-side data fix.
    matrix.insert(
        SourceCombo::new(Success, Absent, Success),
        ExceptionRule::new(SwitchUpdate, false),
    );
    matrix.insert(
        SourceCombo::new(Failed, Absent, Success),
        ExceptionRule::new(SwitchUpdate, false),
    );
    matrix.insert(
        SourceCombo::new(Absent, Success, Absent),
        ExceptionRule::new(SwitchUpdate, false),
    );

    // Settled at the network with no ledger posting: post via TTUM.
    matrix.insert(
        SourceCombo::new(Absent, Success, Success),
        ExceptionRule::new(LedgerPosting, true),
    );
    matrix.insert(
        SourceCombo::new(Absent, Absent, Success),
        ExceptionRule::new(LedgerPosting, true),
    );

    matrix
}

/// Classifies unreconciled match groups into exception records
pub struct ExceptionClassifier {
    matrix: HashMap<SourceCombo, ExceptionRule>,
    ttum_rules: HashMap<ExceptionType, TtumType>,
}

impl ExceptionClassifier {
    /// Build a classifier from the built-in matrix plus configuration overrides
    pub fn new(config: &ReconConfig) -> Self {
        let mut matrix = default_exception_matrix();
        for (combo, rule) in &config.exception_overrides {
            matrix.insert(*combo, *rule);
        }
        Self {
            matrix,
            ttum_rules: config.ttum_rules.clone(),
        }
    }

    /// Derive an exception record for a categorized group, if it warrants one.
    ///
    /// Matched groups never produce exceptions. Hanging records re-enter the
    /// next cycle, and self-matched / settlement-entry groups are resolved
    /// classifications, so none of those produce exceptions either.
    pub fn classify(
        &self,
        group: &MatchGroup,
        status: MatchStatus,
        records: &HashMap<String, TransactionRecord>,
    ) -> Option<ExceptionRecord> {
        let rule = match status {
            MatchStatus::Matched
            | MatchStatus::ForceMatched
            | MatchStatus::Hanging
            | MatchStatus::SelfMatched
            | MatchStatus::SettlementEntry => return None,
            MatchStatus::Duplicate => ExceptionRule::new(ExceptionType::DuplicateFeedEntry, false),
            MatchStatus::ProcessingError => {
                ExceptionRule::new(ExceptionType::ProcessingDefect, false)
            }
            MatchStatus::PartialMatch | MatchStatus::PartialMismatch | MatchStatus::Orphan => {
                let combo = self.combo_for(group, records);
                self.matrix
                    .get(&combo)
                    .copied()
                    .unwrap_or(ExceptionRule::new(ExceptionType::Unmatched, false))
            }
        };

        let members: Vec<&TransactionRecord> = group
            .member_record_ids
            .iter()
            .filter_map(|id| records.get(id))
            .collect();
        let representative = members
            .iter()
            .find(|r| r.source == FeedSource::Ledger)
            .or_else(|| members.first())?;

        let ttum_type = if rule.ttum_required {
            self.ttum_rules.get(&rule.exception_type).copied()
        } else {
            None
        };

        Some(ExceptionRecord {
            group_id: group.group_id,
            rrn: representative.rrn.clone().unwrap_or_default(),
            exception_type: rule.exception_type,
            ttum_required: rule.ttum_required,
            ttum_type,
            amount: representative.amount.clone(),
            direction: representative.direction,
            debit_credit: representative.debit_credit,
            txn_date: representative.txn_date(),
            cycle_id: representative.cycle_id.clone(),
            sources_present: members.iter().map(|r| r.source).collect(),
            ledger_response: Self::response_of(&members, FeedSource::Ledger),
            switch_response: Self::response_of(&members, FeedSource::Switch),
            network_response: Self::response_of(&members, FeedSource::Network),
        })
    }

    fn combo_for(
        &self,
        group: &MatchGroup,
        records: &HashMap<String, TransactionRecord>,
    ) -> SourceCombo {
        let member_for = |source: FeedSource| {
            group
                .member_record_ids
                .iter()
                .filter_map(|id| records.get(id))
                .find(|r| r.source == source)
        };
        SourceCombo::new(
            SourceState::of(member_for(FeedSource::Ledger)),
            SourceState::of(member_for(FeedSource::Switch)),
            SourceState::of(member_for(FeedSource::Network)),
        )
    }

    fn response_of(members: &[&TransactionRecord], source: FeedSource) -> Option<String> {
        members
            .iter()
            .find(|r| r.source == source)
            .and_then(|r| r.response_code.clone())
    }
}
