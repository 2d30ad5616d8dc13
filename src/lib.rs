//! # Recon Core
//!
//! The matching and exception-classification engine for daily payment
//! reconciliation across independent feeds (core ledger, payment switch,
//! network settlement).
//!
//! ## Features
//!
//! - **Tiered matching**: three rounds of decreasing strictness over
//!   (RRN, network transaction id, date, amount), with cut-off, self-match,
//!   and settlement-entry pre-passes
//! - **Deterministic categorization**: exactly one status per input record,
//!   with stable duplicate tie-breaks across reruns
//! - **Exception classification**: a total source-state lookup matrix that
//!   degrades to manual review instead of failing on novel combinations
//! - **TTUM derivation**: remediation instructions with GL-account mapping,
//!   at most one candidate per RRN per run
//! - **Force-match boundary**: zero-difference validation producing a delta
//!   that overlays a prior run result without mutating it
//! - **Storage abstraction**: trait-based seams for record feeds and run
//!   result persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use recon_core::{ReconConfig, ReconEngine};
//!
//! let engine = ReconEngine::new(ReconConfig::default()).unwrap();
//! let result = engine.run("CYCLE-1A", &[]).unwrap();
//! assert!(result.is_conserved());
//! ```

pub mod categorizer;
pub mod config;
pub mod engine;
pub mod exception;
pub mod force_match;
pub mod matching;
pub mod run_result;
pub mod traits;
pub mod ttum;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::ReconConfig;
pub use engine::ReconEngine;
pub use exception::{ExceptionRecord, ExceptionRule, ExceptionType, SourceCombo, SourceState};
pub use force_match::{force_match, ForceMatchDelta};
pub use matching::{MatchGroup, MatchingEngine};
pub use run_result::{RecordOutcome, RunResult, RunSummary};
pub use traits::{RecordFeed, RunResultStore};
pub use ttum::{TtumCandidate, TtumType};
pub use types::{
    DebitCredit, Direction, FeedSource, MatchRound, MatchStatus, ReconError, ReconResult,
    TransactionRecord,
};
