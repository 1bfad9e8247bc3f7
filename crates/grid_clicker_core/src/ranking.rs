//! Competition ranking.
//!
//! Tied scores share a rank, and the next lower score ranks at one plus the
//! number of strictly higher scores, so ranks may skip (1, 1, 3).

use serde::{Serialize, Serializer};
use tracing::{instrument, trace};

/// A player's standing in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    /// Ranked at the given position, 1 being best.
    Ranked(u32),
    /// No entry in the category yet.
    Unranked,
}

impl Rank {
    /// The rank number, or `None` when unranked.
    pub fn position(self) -> Option<u32> {
        match self {
            Self::Ranked(position) => Some(position),
            Self::Unranked => None,
        }
    }

    /// Whether the player has an entry in the category.
    pub fn is_ranked(self) -> bool {
        matches!(self, Self::Ranked(_))
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.position().serialize(serializer)
    }
}

/// One scored key with its assigned rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedScore<K> {
    /// What was ranked (a player id in practice).
    pub key: K,
    /// The score it was ranked by.
    pub score: f64,
    /// Competition rank, 1 being best.
    pub rank: u32,
}

/// Assigns competition ranks to `scores`.
///
/// The result is ordered best first; ties are ordered by ascending key so the
/// output is deterministic. Runs in O(n log n).
#[instrument(skip(scores))]
pub fn competition_ranks<K, I>(scores: I) -> Vec<RankedScore<K>>
where
    K: Ord + Copy,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut sorted: Vec<(K, f64)> = scores.into_iter().collect();
    sorted.sort_by(|(a_key, a_score), (b_key, b_score)| {
        b_score.total_cmp(a_score).then_with(|| a_key.cmp(b_key))
    });

    let mut ranked: Vec<RankedScore<K>> = Vec::with_capacity(sorted.len());
    for (index, (key, score)) in sorted.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(previous) if previous.score == score => previous.rank,
            _ => u32::try_from(index + 1).unwrap_or(u32::MAX),
        };
        ranked.push(RankedScore { key, score, rank });
    }

    trace!(entries = ranked.len(), "Competition ranks assigned");
    ranked
}
