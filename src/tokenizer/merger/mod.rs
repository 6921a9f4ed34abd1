// src/tokenizer/merger/mod.rs

//! The merge loop's two interchangeable engines.
//!
//! [`BasicMerger`] recounts every pair before each merge and is kept as the
//! reference the incremental engine is tested against. [`FastMerger`] keeps
//! pair counts, a pair → words index and a lazily invalidated max-heap up to
//! date, so a merge only touches the words that contain the merged pair.

mod baseline;
mod fast;

pub use baseline::BasicMerger;
pub use fast::FastMerger;

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tokenizer::pair::Pair;
use crate::tokenizer::vocab::{PairKey, Vocabulary};
use crate::tokenizer::word::WordTable;

/// How pairs of equal frequency are ordered.
///
/// Both policies compare `(vocab[left], vocab[right])` as byte strings, so
/// the outcome depends only on the corpus, never on hashing, shard layout
/// or worker count. The ids only break ties between identical byte strings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexicographically smallest byte content wins.
    #[default]
    SmallestBytes,
    /// Lexicographically largest byte content wins.
    LargestBytes,
}

impl TieBreak {
    /// `Greater` when `a` should be merged before `b`.
    pub fn order(self, a: PairKey<'_>, b: PairKey<'_>) -> Ordering {
        match self {
            TieBreak::SmallestBytes => b.cmp(&a),
            TieBreak::LargestBytes => a.cmp(&b),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smallest" | "smallest_bytes" => Ok(Self::SmallestBytes),
            "largest" | "largest_bytes" => Ok(Self::LargestBytes),
            _ => Err(format!(
                "invalid tie-break: {s:?} (expected \"smallest\" or \"largest\")"
            )),
        }
    }
}

/// Which engine drives the merge loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    Baseline,
    #[default]
    Incremental,
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(Self::Baseline),
            "incremental" | "fast" => Ok(Self::Incremental),
            _ => Err(format!(
                "invalid strategy: {s:?} (expected \"baseline\" or \"incremental\")"
            )),
        }
    }
}

/// Knobs shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Pairs seen fewer times than this are never merged.
    pub min_frequency: u64,
    pub tie_break: TieBreak,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            min_frequency: 1,
            tie_break: TieBreak::default(),
        }
    }
}

impl MergeOptions {
    pub(crate) fn threshold(&self) -> u64 {
        self.min_frequency.max(1)
    }
}

/// One merge engine. The training session asks for the best pair, registers
/// the new id in the vocabulary, then hands it back through [`apply`].
///
/// [`apply`]: Merger::apply
pub trait Merger {
    /// Most frequent pair under the tie-break policy, with its count, or
    /// `None` once no pair reaches the minimum frequency.
    fn best_pair(&mut self, vocab: &Vocabulary) -> Option<(Pair, u64)>;

    /// Rewrites every word containing `pair`, returning how many symbol
    /// occurrences (weighted by word count) disappeared. `vocab` already
    /// contains `new_id`.
    fn apply(&mut self, pair: Pair, new_id: u32, vocab: &Vocabulary) -> u64;

    fn words(&self) -> &WordTable;
}

/// Picks the winner among `(pair, count)` candidates.
pub(crate) fn select_best<I>(candidates: I, vocab: &Vocabulary, options: &MergeOptions) -> Option<(Pair, u64)>
where
    I: IntoIterator<Item = (Pair, u64)>,
{
    let threshold = options.threshold();
    candidates
        .into_iter()
        .filter(|&(_, count)| count >= threshold)
        .max_by(|&(a, count_a), &(b, count_b)| {
            count_a
                .cmp(&count_b)
                .then_with(|| options.tie_break.order(vocab.pair_key(a), vocab.pair_key(b)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_compares_bytes_not_ids() {
        let mut vocab = Vocabulary::new();
        // "aa" sorts before "b" although its id is larger
        let aa = vocab.push_merge((b'a' as u32, b'a' as u32));
        let b = b'b' as u32;
        let c = b'c' as u32;

        let candidates = [((b, c), 3), ((aa, c), 3)];
        let smallest = select_best(candidates, &vocab, &MergeOptions::default());
        assert_eq!(smallest, Some(((aa, c), 3)));

        let largest = select_best(
            candidates,
            &vocab,
            &MergeOptions {
                tie_break: TieBreak::LargestBytes,
                ..MergeOptions::default()
            },
        );
        assert_eq!(largest, Some(((b, c), 3)));
    }

    #[test]
    fn count_dominates_tie_break() {
        let vocab = Vocabulary::new();
        let candidates = [((b'z' as u32, b'z' as u32), 5), ((b'a' as u32, b'a' as u32), 4)];
        assert_eq!(
            select_best(candidates, &vocab, &MergeOptions::default()),
            Some(((122, 122), 5))
        );
    }

    #[test]
    fn min_frequency_filters_candidates() {
        let vocab = Vocabulary::new();
        let options = MergeOptions {
            min_frequency: 3,
            ..MergeOptions::default()
        };
        assert_eq!(select_best([((1, 2), 2)], &vocab, &options), None);
        assert_eq!(select_best([((1, 2), 3)], &vocab, &options), Some(((1, 2), 3)));
    }

    #[test]
    fn parses_names() {
        assert_eq!("largest".parse::<TieBreak>(), Ok(TieBreak::LargestBytes));
        assert_eq!("baseline".parse::<MergeStrategy>(), Ok(MergeStrategy::Baseline));
        assert!("random".parse::<MergeStrategy>().is_err());
    }
}
