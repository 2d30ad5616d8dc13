//! Final-status assignment for match groups.
//!
//! The categorizer is a total function from a group's provenance tag to its
//! [`MatchStatus`], honoring a fixed precedence: processing errors first,
//! then duplicates, then cut-off deferrals, then the pre-pass resolutions,
//! then the round outcome, and orphans last. The matching engine encodes the
//! precedence in which pre-pass claims a record first; the mapping here is
//! therefore one-to-one and deterministic.

use crate::matching::{GroupTag, TaggedGroup};
use crate::types::{MatchRound, MatchStatus};

/// Map a tagged group to its final status.
///
/// A group is fully MATCHED only when round 1 produced it with every feed
/// represented; a round-1 group missing a feed is partially recorded and
/// categorizes as PARTIAL_MATCH so the exception classifier sees it.
/// Relaxed-round groups carry a divergent secondary identifier and are
/// PARTIAL_MATCH as well. Mismatch-sweep groups agree on identifiers but not
/// on amount or date and categorize as PARTIAL_MISMATCH for review.
pub fn categorize(tagged: &TaggedGroup) -> MatchStatus {
    match tagged.tag {
        GroupTag::ProcessingError => MatchStatus::ProcessingError,
        GroupTag::Duplicate => MatchStatus::Duplicate,
        GroupTag::Hanging => MatchStatus::Hanging,
        GroupTag::SelfMatched => MatchStatus::SelfMatched,
        GroupTag::SettlementEntry => MatchStatus::SettlementEntry,
        GroupTag::Round(MatchRound::Best) if tagged.complete => MatchStatus::Matched,
        GroupTag::Round(_) => MatchStatus::PartialMatch,
        GroupTag::Mismatch => MatchStatus::PartialMismatch,
        GroupTag::Orphan => MatchStatus::Orphan,
    }
}
