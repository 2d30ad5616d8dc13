//! Run configuration supplied by the orchestration layer.
//!
//! The engine never loads configuration itself; the caller hands a
//! [`ReconConfig`] to every invocation. Configuration defects abort the run
//! with [`ReconError::InvalidConfig`] before any run result is produced.

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::exception::{ExceptionRule, ExceptionType, SourceCombo};
use crate::ttum::TtumType;
use crate::types::{MatchRound, ReconError, ReconResult};

/// Configuration for one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Maximum absolute amount difference tolerated within a match group.
    /// Default is zero: amounts must agree exactly. A difference of exactly
    /// this value is accepted; anything beyond is rejected.
    pub amount_tolerance: BigDecimal,
    /// Width of the cut-off window in minutes before the cycle boundary.
    /// Records inside the window are deferred as HANGING. The window edge is
    /// inclusive: a record timestamped exactly `cutoff_window_minutes` before
    /// the boundary is deferred, and so is anything stamped at or after the
    /// boundary itself (those records belong to the next cycle).
    pub cutoff_window_minutes: i64,
    /// Cycle boundary timestamp. `None` disables cut-off detection.
    pub cycle_cutoff: Option<NaiveDateTime>,
    /// Ledger records with no RRN and an amount strictly above this threshold
    /// are classified as aggregate settlement entries.
    pub settlement_entry_threshold: BigDecimal,
    /// Matching rounds to run, strictest first. Duplicates are ignored.
    pub enabled_rounds: Vec<MatchRound>,
    /// Overrides merged over the built-in exception classification matrix
    pub exception_overrides: HashMap<SourceCombo, ExceptionRule>,
    /// Remediation rule table: which TTUM type fixes which exception
    pub ttum_rules: HashMap<ExceptionType, TtumType>,
    /// Static GL account mapping per TTUM type
    pub gl_account_map: HashMap<TtumType, String>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: BigDecimal::from(0),
            cutoff_window_minutes: 15,
            cycle_cutoff: None,
            settlement_entry_threshold: BigDecimal::from(1_000_000),
            enabled_rounds: vec![
                MatchRound::Best,
                MatchRound::RelaxedNetworkId,
                MatchRound::RelaxedRrn,
            ],
            exception_overrides: HashMap::new(),
            ttum_rules: crate::ttum::default_ttum_rules(),
            gl_account_map: crate::ttum::default_gl_account_map(),
        }
    }
}

impl ReconConfig {
    /// Validate the configuration before a run.
    ///
    /// A malformed configuration is worse than no run at all (it could route
    /// GL postings to the wrong account), so every defect found here aborts.
    pub fn validate(&self) -> ReconResult<()> {
        if self.amount_tolerance < BigDecimal::from(0) {
            return Err(ReconError::InvalidConfig(
                "amount_tolerance must not be negative".to_string(),
            ));
        }

        if self.settlement_entry_threshold < BigDecimal::from(0) {
            return Err(ReconError::InvalidConfig(
                "settlement_entry_threshold must not be negative".to_string(),
            ));
        }

        if self.cycle_cutoff.is_some() && self.cutoff_window_minutes <= 0 {
            return Err(ReconError::InvalidConfig(
                "cutoff_window_minutes must be positive when a cycle cut-off is set".to_string(),
            ));
        }

        for (ttum_type, account) in &self.gl_account_map {
            if account.trim().is_empty() {
                return Err(ReconError::InvalidConfig(format!(
                    "GL account for TTUM type {ttum_type:?} is empty"
                )));
            }
        }

        Ok(())
    }

    /// Rounds to execute, in canonical strictness order with duplicates removed
    pub fn rounds_in_order(&self) -> Vec<MatchRound> {
        let mut rounds: Vec<MatchRound> = self.enabled_rounds.clone();
        rounds.sort();
        rounds.dedup();
        rounds
    }
}
