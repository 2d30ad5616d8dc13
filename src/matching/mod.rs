//! Tiered matching engine.
//!
//! Partitions one cycle's record pool into match groups via pre-passes and
//! successive matching rounds of decreasing strictness, covering every input
//! record exactly once. The partition is deterministic: buckets are visited
//! in sorted key order and every tie-break is a total order, so reruns over
//! the same pool produce identical output.

pub mod prepass;
pub mod rounds;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::ReconConfig;
use crate::types::{FeedSource, MatchRound, TransactionRecord};

use prepass::{run_prepasses, PrepassOutcome};
use rounds::{amounts_agree, mismatch_key, round_key};

/// A set of records believed to represent the same real-world transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub group_id: Uuid,
    /// The round that produced the group; `None` for pre-pass and fallout
    /// groups
    pub round: Option<MatchRound>,
    /// Member record ids, at most one per source (self-match pairs excepted)
    pub member_record_ids: Vec<String>,
    /// Annotation for discarded duplicates and per-record defects
    pub tie_break_note: Option<String>,
}

/// How a group was produced; consumed by the categorizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTag {
    ProcessingError,
    Duplicate,
    Hanging,
    SelfMatched,
    SettlementEntry,
    Round(MatchRound),
    Mismatch,
    Orphan,
}

/// A match group plus its provenance tag
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedGroup {
    pub group: MatchGroup,
    pub tag: GroupTag,
    /// Whether every feed source is represented in the group. A round-1
    /// group missing a feed is only partially recorded and still raises an
    /// exception.
    pub complete: bool,
}

impl TaggedGroup {
    pub(crate) fn single(tag: GroupTag, record: &TransactionRecord, note: Option<String>) -> Self {
        Self {
            group: MatchGroup {
                group_id: Uuid::nil(),
                round: None,
                member_record_ids: vec![record.record_id.clone()],
                tie_break_note: note,
            },
            tag,
            complete: false,
        }
    }

    pub(crate) fn pair(tag: GroupTag, a: &TransactionRecord, b: &TransactionRecord) -> Self {
        Self {
            group: MatchGroup {
                group_id: Uuid::nil(),
                round: None,
                member_record_ids: vec![a.record_id.clone(), b.record_id.clone()],
                tie_break_note: None,
            },
            tag,
            complete: false,
        }
    }

    pub(crate) fn from_round(
        round: MatchRound,
        members: &[&TransactionRecord],
        note: Option<String>,
    ) -> Self {
        let sources: std::collections::BTreeSet<FeedSource> =
            members.iter().map(|r| r.source).collect();
        Self {
            group: MatchGroup {
                group_id: Uuid::nil(),
                round: Some(round),
                member_record_ids: members.iter().map(|r| r.record_id.clone()).collect(),
                tie_break_note: note,
            },
            tag: GroupTag::Round(round),
            complete: sources.len() == FeedSource::all().len(),
        }
    }

    pub(crate) fn mismatch(members: &[&TransactionRecord]) -> Self {
        Self {
            group: MatchGroup {
                group_id: Uuid::nil(),
                round: None,
                member_record_ids: members.iter().map(|r| r.record_id.clone()).collect(),
                tie_break_note: None,
            },
            tag: GroupTag::Mismatch,
            complete: false,
        }
    }
}

/// Partitions a record pool into tagged match groups
pub struct MatchingEngine {
    config: ReconConfig,
}

impl MatchingEngine {
    pub fn new(config: ReconConfig) -> Self {
        Self { config }
    }

    /// Partition the pool: every input record lands in exactly one group.
    ///
    /// Group ids are assigned sequentially over the deterministic group
    /// order, so identical input yields identical output.
    pub fn partition(&self, pool: &[TransactionRecord]) -> Vec<TaggedGroup> {
        let PrepassOutcome {
            mut groups,
            mut remaining,
        } = run_prepasses(pool, &self.config);

        for round in self.config.rounds_in_order() {
            remaining = self.run_round(round, remaining, &mut groups);
        }

        remaining = mismatch_sweep(remaining, &mut groups);

        for record in remaining {
            groups.push(TaggedGroup::single(GroupTag::Orphan, record, None));
        }

        for (i, tagged) in groups.iter_mut().enumerate() {
            tagged.group.group_id = Uuid::from_u128(i as u128 + 1);
        }
        groups
    }

    /// One matching round: bucket by the round key, discard same-source
    /// duplicates, and accept buckets where at least two sources agree on
    /// amount. Unmatched survivors carry into the next round.
    fn run_round<'a>(
        &self,
        round: MatchRound,
        remaining: Vec<&'a TransactionRecord>,
        groups: &mut Vec<TaggedGroup>,
    ) -> Vec<&'a TransactionRecord> {
        let mut carry: Vec<&TransactionRecord> = Vec::new();
        let mut buckets: BTreeMap<String, Vec<&TransactionRecord>> = BTreeMap::new();

        for record in remaining {
            match round_key(record, round) {
                Some(key) => buckets.entry(key).or_default().push(record),
                None => carry.push(record),
            }
        }

        for (_, bucket) in buckets {
            let (survivors, duplicate_note) = discard_duplicates(bucket, groups);

            if survivors.len() < 2 {
                carry.extend(survivors);
                continue;
            }

            // Anchor on the first source in canonical order and grow the
            // group greedily: a candidate joins only if the whole member
            // amount set stays within tolerance, so the spread of an
            // accepted group never exceeds it.
            let mut members: Vec<&TransactionRecord> = vec![survivors[0]];
            let mut rest: Vec<&TransactionRecord> = Vec::new();
            for candidate in survivors.into_iter().skip(1) {
                let Some(candidate_amount) = candidate.amount.as_ref() else {
                    rest.push(candidate);
                    continue;
                };
                let mut amounts: Vec<&BigDecimal> =
                    members.iter().filter_map(|r| r.amount.as_ref()).collect();
                amounts.push(candidate_amount);
                if amounts_agree(&amounts, &self.config.amount_tolerance) {
                    members.push(candidate);
                } else {
                    rest.push(candidate);
                }
            }

            if members.len() >= 2 {
                groups.push(TaggedGroup::from_round(round, &members, duplicate_note));
                carry.extend(rest);
            } else {
                carry.extend(members);
                carry.extend(rest);
            }
        }

        carry
    }
}

/// Keep one candidate per source in a bucket and mark the rest DUPLICATE.
///
/// The kept candidate is chosen by closest amount to the cross-source
/// reference, then earliest timestamp, then lowest record id, giving a total
/// order that keeps reruns stable. Returns the survivors sorted by canonical
/// source order and a note naming any discarded records.
fn discard_duplicates<'a>(
    bucket: Vec<&'a TransactionRecord>,
    groups: &mut Vec<TaggedGroup>,
) -> (Vec<&'a TransactionRecord>, Option<String>) {
    let mut by_source: BTreeMap<FeedSource, Vec<&TransactionRecord>> = BTreeMap::new();
    for record in bucket {
        by_source.entry(record.source).or_default().push(record);
    }
    for candidates in by_source.values_mut() {
        candidates.sort_by(|a, b| {
            (a.txn_timestamp, &a.record_id).cmp(&(b.txn_timestamp, &b.record_id))
        });
    }

    let mut survivors = Vec::new();
    let mut discarded: Vec<String> = Vec::new();
    let sources: Vec<FeedSource> = by_source.keys().copied().collect();

    for source in &sources {
        let reference_amount: Option<BigDecimal> = sources
            .iter()
            .find(|s| *s != source)
            .and_then(|s| by_source[s].first())
            .and_then(|r| r.amount.clone());

        let candidates = &by_source[source];
        let Some(kept) = candidates
            .iter()
            .min_by_key(|r| {
                let amount_distance = match (&reference_amount, &r.amount) {
                    (Some(reference), Some(amount)) => (amount - reference).abs(),
                    _ => BigDecimal::from(0),
                };
                (amount_distance, r.txn_timestamp, r.record_id.clone())
            })
            .copied()
        else {
            continue;
        };

        for candidate in candidates {
            if candidate.record_id != kept.record_id {
                groups.push(TaggedGroup::single(
                    GroupTag::Duplicate,
                    candidate,
                    Some(format!("duplicate of {}", kept.record_id)),
                ));
                discarded.push(candidate.record_id.clone());
            }
        }
        survivors.push(kept);
    }

    let note = if discarded.is_empty() {
        None
    } else {
        Some(format!("discarded duplicates: {}", discarded.join(", ")))
    };
    (survivors, note)
}

/// Post-round sweep: leftovers whose strong identifiers (rrn and network
/// transaction id) agree across sources but whose amount or date diverged
/// beyond tolerance are flagged for review rather than orphaned.
fn mismatch_sweep<'a>(
    remaining: Vec<&'a TransactionRecord>,
    groups: &mut Vec<TaggedGroup>,
) -> Vec<&'a TransactionRecord> {
    let mut carry: Vec<&TransactionRecord> = Vec::new();
    let mut buckets: BTreeMap<String, Vec<&TransactionRecord>> = BTreeMap::new();

    for record in remaining {
        match mismatch_key(record) {
            Some(key) => buckets.entry(key).or_default().push(record),
            None => carry.push(record),
        }
    }

    for (_, bucket) in buckets {
        let mut by_source: BTreeMap<FeedSource, Vec<&TransactionRecord>> = BTreeMap::new();
        for record in bucket {
            by_source.entry(record.source).or_default().push(record);
        }

        if by_source.len() < 2 {
            for candidates in by_source.into_values() {
                carry.extend(candidates);
            }
            continue;
        }

        let mut members = Vec::new();
        for candidates in by_source.values_mut() {
            candidates.sort_by(|a, b| {
                (a.txn_timestamp, &a.record_id).cmp(&(b.txn_timestamp, &b.record_id))
            });
            members.push(candidates[0]);
            carry.extend(candidates.iter().skip(1).copied());
        }
        groups.push(TaggedGroup::mismatch(&members));
    }

    carry
}
