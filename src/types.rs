//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The independent feeds a transaction may be reported by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedSource {
    /// Core banking ledger feed
    Ledger,
    /// Payment switch feed
    Switch,
    /// Network settlement feed
    Network,
}

impl FeedSource {
    /// All feed sources in canonical order (ledger, switch, network)
    pub fn all() -> [FeedSource; 3] {
        [FeedSource::Ledger, FeedSource::Switch, FeedSource::Network]
    }
}

/// Direction of the payment relative to the institution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Funds coming in (beneficiary leg)
    Inward,
    /// Funds going out (remitter leg)
    Outward,
}

/// Debit/credit indicator on the feed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebitCredit {
    Debit,
    Credit,
}

impl DebitCredit {
    /// The opposite side, used when deriving refund postings
    pub fn opposite(&self) -> DebitCredit {
        match self {
            DebitCredit::Debit => DebitCredit::Credit,
            DebitCredit::Credit => DebitCredit::Debit,
        }
    }
}

/// A single normalized transaction record from one feed.
///
/// Produced once per cycle by the external normalizer and never mutated
/// afterwards. Optional fields reflect that a feed may deliver incomplete
/// rows; records missing fields required for matching are absorbed as
/// [`MatchStatus::ProcessingError`] rather than failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Normalizer-assigned identifier, unique within one cycle's pool
    pub record_id: String,
    /// Feed that reported this record
    pub source: FeedSource,
    /// Payment direction
    pub direction: Direction,
    /// Retrieval Reference Number assigned by the network
    pub rrn: Option<String>,
    /// Network transaction identifier, independent of the RRN
    pub network_txn_id: Option<String>,
    /// Transaction amount, fixed-point decimal with 2 dp
    pub amount: Option<BigDecimal>,
    /// When the transaction occurred
    pub txn_timestamp: Option<NaiveDateTime>,
    /// Feed response code ("00"/"0" denote success)
    pub response_code: Option<String>,
    /// Debit or credit leg
    pub debit_credit: DebitCredit,
    /// Settlement cycle this record belongs to
    pub cycle_id: String,
}

impl TransactionRecord {
    /// The transaction date, if a timestamp is present
    pub fn txn_date(&self) -> Option<NaiveDate> {
        self.txn_timestamp.map(|ts| ts.date())
    }

    /// Whether the feed reported this record as successful
    pub fn is_success(&self) -> bool {
        matches!(self.response_code.as_deref(), Some("00") | Some("0"))
    }
}

/// Final per-record status assigned by one reconciliation run.
///
/// Exactly one status is assigned to every input record; the run summary
/// counts must sum back to the pool size (conservation invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Present and consistent across feeds (round-1 match)
    Matched,
    /// Matched with a divergent secondary field (round 2/3)
    PartialMatch,
    /// Identifiers agree but amount or date disagree beyond tolerance
    PartialMismatch,
    /// Present in only one feed after all rounds
    Orphan,
    /// Too close to the cycle cut-off; deferred to the next cycle
    Hanging,
    /// Discarded same-source key collision
    Duplicate,
    /// Internal debit/credit reversal within one feed
    SelfMatched,
    /// Aggregate ledger settlement posting, not an individual transaction
    SettlementEntry,
    /// Manually matched via the force-match operation
    ForceMatched,
    /// Record missing fields required for matching
    ProcessingError,
}

/// The matching round that produced a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchRound {
    /// Exact (rrn, network_txn_id, date, amount) agreement
    Best,
    /// (network_txn_id, date, amount) agreement, rrn divergence tolerated
    RelaxedNetworkId,
    /// (rrn, date, amount) agreement, network_txn_id divergence tolerated
    RelaxedRrn,
}

/// Errors that can occur in the reconciliation engine.
///
/// Per-record defects never surface here; they are absorbed into the run
/// result as `ProcessingError` records. These variants cover configuration
/// defects (which abort the run before any result is produced) and invalid
/// force-match requests.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid record pool: {0}")]
    InvalidPool(String),
    #[error("Record {0} was not assigned a status")]
    UnassignedRecord(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("No TTUM rule configured for exception type {0:?}")]
    MissingTtumRule(crate::exception::ExceptionType),
    #[error("No GL account mapped for TTUM type {0:?}")]
    MissingGlAccount(crate::ttum::TtumType),
    #[error("Record not found in run result: {0}")]
    RecordNotFound(String),
    #[error("Force match requires at least two records from distinct sources")]
    ForceMatchCardinality,
    #[error("Force match violates zero-difference rule: debits = {debits}, credits = {credits}")]
    ZeroDifferenceViolation {
        debits: BigDecimal,
        credits: BigDecimal,
    },
    #[error("Force match member missing an amount: {0}")]
    ForceMatchMissingAmount(String),
    #[error("TTUM-required exception for rrn {0} has no amount")]
    MissingTtumAmount(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
