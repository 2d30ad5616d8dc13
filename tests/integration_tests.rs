//! Integration tests for recon-core

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use recon_core::{
    force_match, utils::MemoryRunStore, DebitCredit, Direction, ExceptionType, FeedSource,
    MatchStatus, ReconConfig, ReconEngine, ReconError, RunResultStore, TransactionRecord, TtumType,
};
use std::str::FromStr;
use uuid::Uuid;

fn ts(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

struct RecordBuilder {
    record: TransactionRecord,
}

impl RecordBuilder {
    fn new(id: &str, source: FeedSource, rrn: &str, amount: &str) -> Self {
        Self {
            record: TransactionRecord {
                record_id: id.to_string(),
                source,
                direction: Direction::Outward,
                rrn: Some(rrn.to_string()),
                network_txn_id: Some(format!("N-{rrn}")),
                amount: Some(BigDecimal::from_str(amount).unwrap()),
                txn_timestamp: Some(ts(10, 30, 0)),
                response_code: Some("00".to_string()),
                debit_credit: DebitCredit::Debit,
                cycle_id: "1A".to_string(),
            },
        }
    }

    fn timestamp(mut self, value: NaiveDateTime) -> Self {
        self.record.txn_timestamp = Some(value);
        self
    }

    fn no_rrn(mut self) -> Self {
        self.record.rrn = None;
        self
    }

    fn no_amount(mut self) -> Self {
        self.record.amount = None;
        self
    }

    fn credit(mut self) -> Self {
        self.record.debit_credit = DebitCredit::Credit;
        self
    }

    fn build(self) -> TransactionRecord {
        self.record
    }
}

fn engine() -> ReconEngine {
    ReconEngine::new(ReconConfig::default()).unwrap()
}

#[test]
fn test_three_way_match_produces_no_exception() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R2", "50.00").build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R2", "50.00").build(),
        RecordBuilder::new("n1", FeedSource::Network, "R2", "50.00").build(),
    ];
    let result = engine().run("1A", &pool).unwrap();

    assert_eq!(result.summary.matched, 3);
    assert!(result.exceptions.is_empty());
    assert!(result.ttum_candidates.is_empty());
    assert!(result.is_conserved());
    for outcome in &result.records {
        assert_eq!(outcome.status, MatchStatus::Matched);
    }
}

#[test]
fn test_network_absent_yields_remitter_refund_ttum() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R1", "100.00").build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R1", "100.00").build(),
    ];
    let result = engine().run("1A", &pool).unwrap();

    // Only two of three feeds saw the transaction: partially recorded.
    assert_eq!(result.summary.partial_match, 2);
    assert_eq!(result.exceptions.len(), 1);
    let exception = &result.exceptions[0];
    assert_eq!(exception.exception_type, ExceptionType::RemitterRefund);
    assert!(exception.ttum_required);
    assert_eq!(exception.ttum_type, Some(TtumType::CustomerRefund));
    assert_eq!(exception.rrn, "R1");

    assert_eq!(result.ttum_candidates.len(), 1);
    let candidate = &result.ttum_candidates[0];
    assert_eq!(candidate.rrn, "R1");
    assert_eq!(candidate.ttum_type, TtumType::CustomerRefund);
    assert_eq!(candidate.gl_account, "114001001");
    assert_eq!(candidate.amount, BigDecimal::from_str("100.00").unwrap());
}

#[test]
fn test_same_source_duplicate_is_discarded() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R3", "75.00").build(),
        RecordBuilder::new("l2", FeedSource::Ledger, "R3", "75.00").build(),
    ];
    let result = engine().run("1A", &pool).unwrap();

    assert_eq!(result.summary.duplicate, 1);
    assert_eq!(result.summary.orphan, 1);
    assert!(result.is_conserved());

    let duplicate = result.find_record("l2").unwrap();
    assert_eq!(duplicate.status, MatchStatus::Duplicate);
    let kept = result.find_record("l1").unwrap();
    assert_eq!(kept.status, MatchStatus::Orphan);
}

#[test]
fn test_cutoff_boundary_is_inclusive() {
    let config = ReconConfig {
        cycle_cutoff: Some(ts(23, 0, 0)),
        cutoff_window_minutes: 15,
        ..Default::default()
    };
    let engine = ReconEngine::new(config).unwrap();

    // Exactly on the window edge (22:45:00): deferred.
    let pool = vec![RecordBuilder::new("l1", FeedSource::Ledger, "R1", "10.00")
        .timestamp(ts(22, 45, 0))
        .build()];
    let result = engine.run("1A", &pool).unwrap();
    assert_eq!(result.find_record("l1").unwrap().status, MatchStatus::Hanging);

    // One second earlier: matched/orphaned normally.
    let pool = vec![RecordBuilder::new("l2", FeedSource::Ledger, "R1", "10.00")
        .timestamp(ts(22, 44, 59))
        .build()];
    let result = engine.run("1A", &pool).unwrap();
    assert_eq!(result.find_record("l2").unwrap().status, MatchStatus::Orphan);

    // After the boundary itself: belongs to the next cycle, also deferred.
    let pool = vec![RecordBuilder::new("l3", FeedSource::Ledger, "R1", "10.00")
        .timestamp(ts(23, 30, 0))
        .build()];
    let result = engine.run("1A", &pool).unwrap();
    assert_eq!(result.find_record("l3").unwrap().status, MatchStatus::Hanging);
}

#[test]
fn test_self_matched_pair_excluded_from_matching() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R5", "20.00").build(),
        RecordBuilder::new("l2", FeedSource::Ledger, "R5", "20.00")
            .credit()
            .build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R5", "20.00").build(),
    ];
    let result = engine().run("1A", &pool).unwrap();

    assert_eq!(result.summary.self_matched, 2);
    assert_eq!(result.find_record("s1").unwrap().status, MatchStatus::Orphan);
    assert!(result.is_conserved());
}

#[test]
fn test_settlement_entry_detection() {
    let pool = vec![RecordBuilder::new("l1", FeedSource::Ledger, "R1", "2500000.00")
        .no_rrn()
        .build()];
    let result = engine().run("1A", &pool).unwrap();
    assert_eq!(
        result.find_record("l1").unwrap().status,
        MatchStatus::SettlementEntry
    );
    assert!(result.exceptions.is_empty());
}

#[test]
fn test_defective_record_never_aborts_the_run() {
    let pool = vec![
        RecordBuilder::new("bad", FeedSource::Switch, "R1", "10.00")
            .no_amount()
            .build(),
        RecordBuilder::new("l1", FeedSource::Ledger, "R2", "30.00").build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R2", "30.00").build(),
    ];
    let result = engine().run("1A", &pool).unwrap();

    assert_eq!(result.summary.processing_error, 1);
    assert_eq!(result.summary.partial_match, 2);
    assert!(result.is_conserved());
    assert!(result
        .exceptions
        .iter()
        .any(|e| e.exception_type == ExceptionType::ProcessingDefect));
}

#[test]
fn test_missing_gl_mapping_aborts_run() {
    let mut config = ReconConfig::default();
    config.gl_account_map.remove(&TtumType::CustomerRefund);
    let engine = ReconEngine::new(config).unwrap();

    // Ledger-only success: classified RemitterRefund, TTUM required.
    let pool = vec![RecordBuilder::new("l1", FeedSource::Ledger, "R1", "10.00").build()];
    assert!(matches!(
        engine.run("1A", &pool),
        Err(ReconError::MissingGlAccount(TtumType::CustomerRefund))
    ));
}

#[test]
fn test_force_match_round_trip() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R1", "500.00").build(),
        RecordBuilder::new("n1", FeedSource::Network, "R2", "500.00")
            .credit()
            .build(),
        RecordBuilder::new("n2", FeedSource::Network, "R3", "499.99")
            .credit()
            .build(),
    ];
    let result = engine().run("1A", &pool).unwrap();
    assert_eq!(result.summary.orphan, 3);

    let delta = force_match(&result, &["l1", "n1"]).unwrap();
    assert_eq!(delta.status, MatchStatus::ForceMatched);

    assert!(matches!(
        force_match(&result, &["l1", "n2"]),
        Err(ReconError::ZeroDifferenceViolation { .. })
    ));
}

#[test]
fn test_run_result_json_contract() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R2", "50.00").build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R2", "50.00").build(),
        RecordBuilder::new("n1", FeedSource::Network, "R2", "50.00").build(),
    ];
    let result = engine()
        .run_with_id(Uuid::from_u128(42), "1A", &pool)
        .unwrap();
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();

    assert_eq!(json["cycle_id"], "1A");
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["matched"], 3);
    // Record fields are flattened next to the status.
    assert_eq!(json["records"][0]["rrn"], "R2");
    assert_eq!(json["records"][0]["status"], "MATCHED");
    assert!(json["match_groups"][0]["member_record_ids"].is_array());
}

#[tokio::test]
async fn test_store_round_trip_and_hanging_carry_over() {
    let config = ReconConfig {
        cycle_cutoff: Some(ts(23, 0, 0)),
        cutoff_window_minutes: 15,
        ..Default::default()
    };
    let engine = ReconEngine::new(config).unwrap();
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R1", "10.00")
            .timestamp(ts(22, 59, 0))
            .build(),
        RecordBuilder::new("l2", FeedSource::Ledger, "R2", "30.00").build(),
        RecordBuilder::new("s2", FeedSource::Switch, "R2", "30.00").build(),
    ];
    let result = engine
        .run_with_id(Uuid::from_u128(9), "1A", &pool)
        .unwrap();

    let mut store = MemoryRunStore::new();
    store.save_run(&result).await.unwrap();

    let fetched = store.get_run(result.run_id).await.unwrap().unwrap();
    assert_eq!(fetched, result);

    let carried = store.hanging_carry_over(result.run_id).await.unwrap();
    assert_eq!(carried.len(), 1);
    assert_eq!(carried[0].record_id, "l1");
}

#[test]
fn test_idempotent_rerun_is_identical() {
    let pool = vec![
        RecordBuilder::new("l1", FeedSource::Ledger, "R1", "100.00").build(),
        RecordBuilder::new("l2", FeedSource::Ledger, "R1", "100.00").build(),
        RecordBuilder::new("s1", FeedSource::Switch, "R1", "100.00").build(),
        RecordBuilder::new("n1", FeedSource::Network, "R7", "1.00").build(),
        RecordBuilder::new("bad", FeedSource::Switch, "R8", "1.00")
            .no_amount()
            .build(),
    ];
    let engine = engine();
    let run_id = Uuid::from_u128(11);
    let first = engine.run_with_id(run_id, "1A", &pool).unwrap();
    let second = engine.run_with_id(run_id, "1A", &pool).unwrap();
    assert_eq!(first, second);
}
