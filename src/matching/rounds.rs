//! Matching-round key derivation.
//!
//! Each round buckets the remaining pool by an identity key of decreasing
//! strictness; amount agreement is checked separately against the configured
//! tolerance so the identity key stays exact.

use bigdecimal::BigDecimal;

use crate::types::{MatchRound, TransactionRecord};

const KEY_SEP: char = '\u{1f}';

/// Derive the bucket key a record contributes to in the given round.
///
/// Returns `None` when the record lacks a field the round keys on; such
/// records sit the round out and pass through to the next one.
pub fn round_key(record: &TransactionRecord, round: MatchRound) -> Option<String> {
    let date = record.txn_date()?;
    match round {
        MatchRound::Best => {
            let rrn = record.rrn.as_deref()?;
            let network_txn_id = record.network_txn_id.as_deref()?;
            Some(format!("{rrn}{KEY_SEP}{network_txn_id}{KEY_SEP}{date}"))
        }
        MatchRound::RelaxedNetworkId => {
            let network_txn_id = record.network_txn_id.as_deref()?;
            Some(format!("{network_txn_id}{KEY_SEP}{date}"))
        }
        MatchRound::RelaxedRrn => {
            let rrn = record.rrn.as_deref()?;
            Some(format!("{rrn}{KEY_SEP}{date}"))
        }
    }
}

/// Key for the post-round mismatch sweep: identity only, no date, so that
/// strong identifier agreement with amount or date divergence still surfaces
/// for review instead of orphaning.
pub fn mismatch_key(record: &TransactionRecord) -> Option<String> {
    let rrn = record.rrn.as_deref()?;
    let network_txn_id = record.network_txn_id.as_deref()?;
    Some(format!("{rrn}{KEY_SEP}{network_txn_id}"))
}

/// Whether a set of amounts agrees within the tolerance. A spread of exactly
/// the tolerance is accepted.
pub fn amounts_agree(amounts: &[&BigDecimal], tolerance: &BigDecimal) -> bool {
    let Some(min) = amounts.iter().min() else {
        return true;
    };
    let Some(max) = amounts.iter().max() else {
        return true;
    };
    &(*max - *min) <= tolerance
}
