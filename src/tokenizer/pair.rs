// src/tokenizer/pair.rs

use rustc_hash::{FxHashMap, FxHashSet};

use crate::tokenizer::word::{WordId, WordTable};

/// Ordered pair of adjacent symbol ids `(left, right)`.
pub type Pair = (u32, u32);

/// Pair → frequency, weighted by word counts. Only positive entries are kept.
pub type PairCounts = FxHashMap<Pair, u64>;

/// Pair → ids of the words that currently contain it at least once.
pub type PairIndex = FxHashMap<Pair, FxHashSet<WordId>>;

/// Full rescan of the word table.
pub fn count_pairs(words: &WordTable) -> PairCounts {
    let mut pair_counts = PairCounts::default();
    for (_, word, count) in words.iter() {
        for pair in word.pairs() {
            *pair_counts.entry(pair).or_insert(0) += count;
        }
    }
    pair_counts
}

/// Full rescan of which words contain which pairs.
pub fn index_pairs(words: &WordTable) -> PairIndex {
    let mut index = PairIndex::default();
    for (id, word, _) in words.iter() {
        for pair in word.pairs() {
            index.entry(pair).or_default().insert(id);
        }
    }
    index
}
