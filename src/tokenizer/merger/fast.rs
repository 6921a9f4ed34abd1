// src/tokenizer/merger/fast.rs

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::tokenizer::aggregator::Aggregate;
use crate::tokenizer::merger::{MergeOptions, Merger, TieBreak};
use crate::tokenizer::pair::{count_pairs, index_pairs, Pair, PairCounts, PairIndex};
use crate::tokenizer::vocab::{PairKey, Vocabulary};
use crate::tokenizer::word::{WordId, WordTable};

/// Heap entry. Carries the byte content of both sides so ties can be
/// ordered without looking at the vocabulary.
#[derive(Debug, Clone)]
struct Candidate {
    count: u64,
    pair: Pair,
    left: Arc<[u8]>,
    right: Arc<[u8]>,
    tie_break: TieBreak,
}

impl Candidate {
    fn new(pair: Pair, count: u64, vocab: &Vocabulary, tie_break: TieBreak) -> Self {
        Self {
            count,
            pair,
            left: Arc::clone(vocab.token(pair.0)),
            right: Arc::clone(vocab.token(pair.1)),
            tie_break,
        }
    }

    fn key(&self) -> PairKey<'_> {
        (&self.left[..], &self.right[..], self.pair.0, self.pair.1)
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.pair == other.pair
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.tie_break.order(self.key(), other.key()))
    }
}

/// Incremental merge engine.
///
/// Owns the word table together with three derived structures:
///
/// * `pair_counts`: pair → frequency, always equal to a full rescan;
/// * `index`: pair → ids of the words containing it at least once;
/// * `queue`: max-heap of `(count, pair)` snapshots. Entries are never
///   updated in place; a fresh one is pushed whenever a pair's count
///   changes and [`best_pair`](Merger::best_pair) drops any entry whose
///   count no longer matches `pair_counts`.
///
/// A merge therefore costs time proportional to the symbols of the words
/// that contain the pair, not to the corpus.
///
/// Debug builds rerun [`check_invariants`](Self::check_invariants) after
/// the 1st, 2nd, 4th, 8th, ... merge and panic on divergence.
#[derive(Debug)]
pub struct FastMerger {
    words: WordTable,
    pair_counts: PairCounts,
    index: PairIndex,
    queue: BinaryHeap<Candidate>,
    options: MergeOptions,
    applied: usize,
}

impl FastMerger {
    pub fn new(aggregate: Aggregate, vocab: &Vocabulary, options: MergeOptions) -> Self {
        let Aggregate {
            words,
            pair_counts,
            index,
        } = aggregate;

        let threshold = options.threshold();
        let candidates: Vec<Candidate> = pair_counts
            .iter()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(&pair, &count)| Candidate::new(pair, count, vocab, options.tie_break))
            .collect();

        Self {
            words,
            pair_counts,
            index,
            queue: BinaryHeap::from(candidates),
            options,
            applied: 0,
        }
    }

    pub fn pair_counts(&self) -> &PairCounts {
        &self.pair_counts
    }

    pub fn index(&self) -> &PairIndex {
        &self.index
    }

    /// Number of heap entries, stale ones included.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Compares the maintained tables against a full rescan of the words.
    pub fn check_invariants(&self) -> Result<(), String> {
        let expected_counts = count_pairs(&self.words);
        if expected_counts != self.pair_counts {
            let mut diff: Vec<_> = expected_counts
                .iter()
                .filter(|&(pair, count)| self.pair_counts.get(pair) != Some(count))
                .map(|(pair, count)| (*pair, *count, self.pair_counts.get(pair).copied()))
                .collect();
            diff.sort_unstable();
            let extra = self
                .pair_counts
                .keys()
                .filter(|pair| !expected_counts.contains_key(*pair))
                .count();
            return Err(format!(
                "pair counts diverge from rescan: {diff:?} (expected, got), {extra} extra pairs"
            ));
        }

        let expected_index = index_pairs(&self.words);
        if expected_index != self.index {
            let mut pairs: Vec<Pair> = expected_index
                .keys()
                .chain(self.index.keys())
                .filter(|pair| expected_index.get(*pair) != self.index.get(*pair))
                .copied()
                .collect();
            pairs.sort_unstable();
            pairs.dedup();
            return Err(format!("adjacency index diverges from rescan for {pairs:?}"));
        }
        Ok(())
    }

    fn push(&mut self, pair: Pair, vocab: &Vocabulary) {
        if let Some(&count) = self.pair_counts.get(&pair) {
            if count >= self.options.threshold() {
                self.queue
                    .push(Candidate::new(pair, count, vocab, self.options.tie_break));
            }
        }
    }
}

fn apply_delta(pair_counts: &mut PairCounts, pair: Pair, delta: i64) {
    match pair_counts.entry(pair) {
        Entry::Occupied(mut entry) => {
            let next = *entry.get() as i64 + delta;
            debug_assert!(next >= 0, "pair {pair:?} count went negative");
            if next <= 0 {
                entry.remove();
            } else {
                *entry.get_mut() = next as u64;
            }
        }
        Entry::Vacant(entry) => {
            debug_assert!(delta > 0, "pair {pair:?} decremented without being counted");
            if delta > 0 {
                entry.insert(delta as u64);
            }
        }
    }
}

impl Merger for FastMerger {
    fn best_pair(&mut self, _vocab: &Vocabulary) -> Option<(Pair, u64)> {
        while let Some(top) = self.queue.pop() {
            if self.pair_counts.get(&top.pair) == Some(&top.count) {
                return Some((top.pair, top.count));
            }
        }
        None
    }

    fn apply(&mut self, pair: Pair, new_id: u32, vocab: &Vocabulary) -> u64 {
        let Some(affected) = self.index.remove(&pair) else {
            return 0;
        };
        let mut affected: Vec<WordId> = affected.into_iter().collect();
        affected.sort_unstable();

        let mut touched: FxHashSet<Pair> = FxHashSet::default();
        let mut replaced = 0;

        for id in affected {
            let count = self.words.count(id);
            let word = self.words.word_mut(id);
            let before = word.len();
            let changes = word.merge(pair.0, pair.1, new_id);
            replaced += (before - word.len()) as u64 * count;

            // Changes of adjacent occurrences can cancel; only the net
            // difference per pair matters.
            let mut net: FxHashMap<Pair, i64> = FxHashMap::default();
            for (changed, delta) in changes {
                *net.entry(changed).or_insert(0) += i64::from(delta);
            }

            for (changed, delta) in net {
                if delta == 0 {
                    continue;
                }
                apply_delta(&mut self.pair_counts, changed, delta * count as i64);
                touched.insert(changed);

                if changed == pair {
                    continue;
                }
                if delta > 0 {
                    self.index.entry(changed).or_default().insert(id);
                } else if !self.words.word(id).contains_pair(changed) {
                    if let Entry::Occupied(mut words) = self.index.entry(changed) {
                        words.get_mut().remove(&id);
                        if words.get().is_empty() {
                            words.remove();
                        }
                    }
                }
            }
        }

        debug_assert!(
            !self.pair_counts.contains_key(&pair),
            "merged pair {pair:?} still counted"
        );

        touched.remove(&pair);
        for changed in touched {
            self.push(changed, vocab);
        }

        self.applied += 1;
        #[cfg(debug_assertions)]
        {
            if self.applied.is_power_of_two() {
                if let Err(msg) = self.check_invariants() {
                    panic!("after merging {pair:?} (merge #{}): {msg}", self.applied);
                }
            }
        }
        replaced
    }

    fn words(&self) -> &WordTable {
        &self.words
    }
}
