//! TTUM candidate derivation.
//!
//! A TTUM is a settlement/GL remediation instruction derived from an
//! unresolved exception. The builder resolves each ttum-required exception
//! through the configured rule table and GL account mapping; a gap in either
//! table is a configuration defect that aborts the whole run, since silently
//! mis-posting GL entries is worse than stopping.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::config::ReconConfig;
use crate::exception::{ExceptionRecord, ExceptionType};
use crate::types::{DebitCredit, ReconError, ReconResult};

/// Kinds of remediation instructions the builder can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TtumType {
    /// Return a debited amount to the remitter
    CustomerRefund,
    /// Post a settled transaction that never reached the ledger
    GlPosting,
}

/// A single remediation instruction derived from an exception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtumCandidate {
    /// RRN of the transaction being remediated; candidates form a set keyed
    /// by RRN within one run
    pub rrn: String,
    pub ttum_type: TtumType,
    /// GL account the instruction posts to
    pub gl_account: String,
    pub amount: BigDecimal,
    /// Posting side: refunds reverse the original leg, GL postings repeat it
    pub direction: DebitCredit,
    /// Match group of the exception this candidate remediates
    pub exception_group_id: Uuid,
}

/// Built-in remediation rule table
pub fn default_ttum_rules() -> HashMap<ExceptionType, TtumType> {
    let mut rules = HashMap::new();
    rules.insert(ExceptionType::RemitterRefund, TtumType::CustomerRefund);
    rules.insert(ExceptionType::LedgerPosting, TtumType::GlPosting);
    rules
}

/// Built-in GL account mapping
pub fn default_gl_account_map() -> HashMap<TtumType, String> {
    let mut map = HashMap::new();
    map.insert(TtumType::CustomerRefund, "114001001".to_string());
    map.insert(TtumType::GlPosting, "489101001".to_string());
    map
}

/// Derives TTUM candidates from classified exceptions
pub struct TtumBuilder {
    rules: HashMap<ExceptionType, TtumType>,
    gl_accounts: HashMap<TtumType, String>,
}

impl TtumBuilder {
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            rules: config.ttum_rules.clone(),
            gl_accounts: config.gl_account_map.clone(),
        }
    }

    /// Build the candidate set for one run.
    ///
    /// Idempotent: at most one candidate per RRN, and running the builder
    /// twice over the same exceptions yields the identical set. An exception
    /// type with `ttum_required` but no rule, or a rule with no GL account,
    /// is a configuration error.
    pub fn build(&self, exceptions: &[ExceptionRecord]) -> ReconResult<Vec<TtumCandidate>> {
        let mut candidates = Vec::new();
        let mut seen_rrns: HashSet<String> = HashSet::new();

        for exception in exceptions {
            if !exception.ttum_required {
                continue;
            }

            let ttum_type = self
                .rules
                .get(&exception.exception_type)
                .copied()
                .ok_or(ReconError::MissingTtumRule(exception.exception_type))?;
            let gl_account = self
                .gl_accounts
                .get(&ttum_type)
                .cloned()
                .ok_or(ReconError::MissingGlAccount(ttum_type))?;

            // Defect-pass records never reach ttum-required classification;
            // if an amount is missing anyway, posting nothing silently would
            // be worse than stopping.
            let amount = exception
                .amount
                .clone()
                .ok_or_else(|| ReconError::MissingTtumAmount(exception.rrn.clone()))?;

            if !seen_rrns.insert(exception.rrn.clone()) {
                continue;
            }

            let direction = match ttum_type {
                TtumType::CustomerRefund => exception.debit_credit.opposite(),
                TtumType::GlPosting => exception.debit_credit,
            };

            candidates.push(TtumCandidate {
                rrn: exception.rrn.clone(),
                ttum_type,
                gl_account,
                amount,
                direction,
                exception_group_id: exception.group_id,
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn refund_exception(rrn: &str) -> ExceptionRecord {
        ExceptionRecord {
            group_id: Uuid::new_v4(),
            rrn: rrn.to_string(),
            exception_type: ExceptionType::RemitterRefund,
            ttum_required: true,
            ttum_type: Some(TtumType::CustomerRefund),
            amount: Some(BigDecimal::from(100)),
            direction: Direction::Outward,
            debit_credit: DebitCredit::Debit,
            txn_date: None,
            cycle_id: "1A".to_string(),
            sources_present: vec![],
            ledger_response: Some("00".to_string()),
            switch_response: None,
            network_response: None,
        }
    }

    #[test]
    fn test_refund_candidate_reverses_original_leg() {
        let builder = TtumBuilder::new(&ReconConfig::default());
        let candidates = builder.build(&[refund_exception("R1")]).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ttum_type, TtumType::CustomerRefund);
        assert_eq!(candidates[0].gl_account, "114001001");
        assert_eq!(candidates[0].direction, DebitCredit::Credit);
    }

    #[test]
    fn test_one_candidate_per_rrn() {
        let builder = TtumBuilder::new(&ReconConfig::default());
        let candidates = builder
            .build(&[refund_exception("R1"), refund_exception("R1")])
            .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = TtumBuilder::new(&ReconConfig::default());
        let exceptions = vec![refund_exception("R1"), refund_exception("R2")];
        let first = builder.build(&exceptions).unwrap();
        let second = builder.build(&exceptions).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_rule_fails_run() {
        let mut config = ReconConfig::default();
        config.ttum_rules.remove(&ExceptionType::RemitterRefund);
        let builder = TtumBuilder::new(&config);
        assert!(matches!(
            builder.build(&[refund_exception("R1")]),
            Err(ReconError::MissingTtumRule(ExceptionType::RemitterRefund))
        ));
    }

    #[test]
    fn test_missing_gl_account_fails_run() {
        let mut config = ReconConfig::default();
        config.gl_account_map.remove(&TtumType::CustomerRefund);
        let builder = TtumBuilder::new(&config);
        assert!(matches!(
            builder.build(&[refund_exception("R1")]),
            Err(ReconError::MissingGlAccount(TtumType::CustomerRefund))
        ));
    }

    #[test]
    fn test_required_exception_without_amount_fails_run() {
        let builder = TtumBuilder::new(&ReconConfig::default());
        let mut exception = refund_exception("R1");
        exception.amount = None;
        assert!(matches!(
            builder.build(&[exception]),
            Err(ReconError::MissingTtumAmount(rrn)) if rrn == "R1"
        ));
    }

    #[test]
    fn test_non_required_exception_emits_nothing() {
        let builder = TtumBuilder::new(&ReconConfig::default());
        let mut exception = refund_exception("R1");
        exception.ttum_required = false;
        assert!(builder.build(&[exception]).unwrap().is_empty());
    }
}
