//! Pre-passes applied to the whole pool before any matching round.
//!
//! Order matters: field defects first (a record that cannot be keyed can
//! never match), then cut-off deferral, then settlement-entry and
//! self-match resolution. Everything a pre-pass claims is excluded from the
//! matching rounds.

use chrono::Duration;
use std::collections::BTreeMap;

use crate::config::ReconConfig;
use crate::matching::{GroupTag, TaggedGroup};
use crate::types::{DebitCredit, FeedSource, TransactionRecord};

pub(crate) struct PrepassOutcome<'a> {
    pub groups: Vec<TaggedGroup>,
    /// Records still eligible for the matching rounds
    pub remaining: Vec<&'a TransactionRecord>,
}

pub(crate) fn run_prepasses<'a>(
    pool: &'a [TransactionRecord],
    config: &ReconConfig,
) -> PrepassOutcome<'a> {
    let mut groups = Vec::new();
    let mut remaining: Vec<&TransactionRecord> = Vec::new();

    for record in pool {
        if let Some(defect) = field_defect(record) {
            groups.push(TaggedGroup::single(
                GroupTag::ProcessingError,
                record,
                Some(defect),
            ));
            continue;
        }

        if is_within_cutoff_window(record, config) {
            groups.push(TaggedGroup::single(GroupTag::Hanging, record, None));
            continue;
        }

        if is_settlement_entry(record, config) {
            groups.push(TaggedGroup::single(GroupTag::SettlementEntry, record, None));
            continue;
        }

        if record.rrn.is_none() {
            groups.push(TaggedGroup::single(
                GroupTag::ProcessingError,
                record,
                Some("missing rrn".to_string()),
            ));
            continue;
        }

        remaining.push(record);
    }

    let remaining = resolve_self_matches(remaining, &mut groups);

    PrepassOutcome { groups, remaining }
}

/// A defect that disqualifies the record from every round. A missing RRN is
/// not reported here because the settlement-entry pass expects absent RRNs;
/// it is checked after that pass has had its chance.
fn field_defect(record: &TransactionRecord) -> Option<String> {
    if record.amount.is_none() {
        return Some("missing amount".to_string());
    }
    if record.txn_timestamp.is_none() {
        return Some("missing txn_timestamp".to_string());
    }
    None
}

/// Cut-off window check. The window edge is inclusive: a record timestamped
/// exactly `cutoff_window_minutes` before the boundary is deferred. There is
/// deliberately no upper bound — a record stamped after the boundary itself
/// belongs to the next cycle and is deferred the same way.
fn is_within_cutoff_window(record: &TransactionRecord, config: &ReconConfig) -> bool {
    let (Some(cutoff), Some(ts)) = (config.cycle_cutoff, record.txn_timestamp) else {
        return false;
    };
    let window_start = cutoff - Duration::minutes(config.cutoff_window_minutes);
    ts >= window_start
}

/// Ledger-only aggregate postings: no RRN and amount strictly above the
/// configured threshold.
fn is_settlement_entry(record: &TransactionRecord, config: &ReconConfig) -> bool {
    record.source == FeedSource::Ledger
        && record.rrn.is_none()
        && record
            .amount
            .as_ref()
            .is_some_and(|a| a > &config.settlement_entry_threshold)
}

/// Pair opposite debit/credit legs sharing (rrn, network_txn_id, date,
/// amount) within one source: internal reversals that must not enter
/// cross-source matching. Unpaired records stay in the pool.
fn resolve_self_matches<'a>(
    records: Vec<&'a TransactionRecord>,
    groups: &mut Vec<TaggedGroup>,
) -> Vec<&'a TransactionRecord> {
    let mut buckets: BTreeMap<(FeedSource, String), Vec<&TransactionRecord>> = BTreeMap::new();
    for record in records {
        let key = format!(
            "{}\u{1f}{}\u{1f}{:?}",
            record.rrn.as_deref().unwrap_or_default(),
            record.network_txn_id.as_deref().unwrap_or_default(),
            record.txn_date(),
        );
        buckets.entry((record.source, key)).or_default().push(record);
    }

    let mut remaining = Vec::new();
    for (_, mut bucket) in buckets {
        bucket.sort_by(|a, b| {
            (a.txn_timestamp, &a.record_id).cmp(&(b.txn_timestamp, &b.record_id))
        });

        let (debits, credits): (Vec<&TransactionRecord>, Vec<&TransactionRecord>) = bucket
            .into_iter()
            .partition(|r| r.debit_credit == DebitCredit::Debit);

        let mut credit_taken = vec![false; credits.len()];
        for debit in debits {
            let partner = (0..credits.len())
                .find(|&i| !credit_taken[i] && credits[i].amount == debit.amount);
            match partner {
                Some(i) => {
                    credit_taken[i] = true;
                    groups.push(TaggedGroup::pair(GroupTag::SelfMatched, debit, credits[i]));
                }
                None => remaining.push(debit),
            }
        }
        for (i, credit) in credits.iter().enumerate() {
            if !credit_taken[i] {
                remaining.push(*credit);
            }
        }
    }

    // Bucket iteration reshuffles the pool; hand the rounds a stable order.
    remaining.sort_by(|a, b| a.record_id.cmp(&b.record_id));
    remaining
}
