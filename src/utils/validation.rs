//! Record-pool validation.
//!
//! Per-record field defects are absorbed by the matching pre-passes; the
//! checks here cover breaches of the normalizer contract that would corrupt
//! an entire run, and therefore abort it.

use std::collections::HashSet;

use crate::types::{ReconError, ReconResult, TransactionRecord};

/// Validate a pool before a run.
///
/// Record ids must be unique (a duplicate id would break the one-status-per-
/// record conservation invariant) and every record must carry the cycle id
/// the run was invoked for.
pub fn validate_pool(cycle_id: &str, pool: &[TransactionRecord]) -> ReconResult<()> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for record in pool {
        if !seen_ids.insert(record.record_id.as_str()) {
            return Err(ReconError::InvalidPool(format!(
                "duplicate record_id {}",
                record.record_id
            )));
        }
        if record.cycle_id != cycle_id {
            return Err(ReconError::InvalidPool(format!(
                "record {} belongs to cycle {}, not {}",
                record.record_id, record.cycle_id, cycle_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DebitCredit, Direction, FeedSource};

    fn record(id: &str, cycle_id: &str) -> TransactionRecord {
        TransactionRecord {
            record_id: id.to_string(),
            source: FeedSource::Ledger,
            direction: Direction::Outward,
            rrn: Some("R1".to_string()),
            network_txn_id: None,
            amount: None,
            txn_timestamp: None,
            response_code: None,
            debit_credit: DebitCredit::Debit,
            cycle_id: cycle_id.to_string(),
        }
    }

    #[test]
    fn test_unique_pool_accepted() {
        let pool = vec![record("r1", "1A"), record("r2", "1A")];
        assert!(validate_pool("1A", &pool).is_ok());
    }

    #[test]
    fn test_duplicate_record_id_rejected() {
        let pool = vec![record("r1", "1A"), record("r1", "1A")];
        assert!(matches!(
            validate_pool("1A", &pool),
            Err(ReconError::InvalidPool(_))
        ));
    }

    #[test]
    fn test_foreign_cycle_rejected() {
        let pool = vec![record("r1", "1B")];
        assert!(validate_pool("1A", &pool).is_err());
    }
}
