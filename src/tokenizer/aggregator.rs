// src/tokenizer/aggregator.rs

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::tokenizer::counter::WordCounts;
use crate::tokenizer::pair::{PairCounts, PairIndex};
use crate::tokenizer::parallelism::MaybeParallelRefIterator;
use crate::tokenizer::word::WordTable;
use crate::tokenizer::{Error, Result};

/// Everything the incremental merger is seeded with: the word table plus
/// the pair statistics derived from it.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub words: WordTable,
    pub pair_counts: PairCounts,
    pub index: PairIndex,
}

/// Sums per-shard tables into one. Order of `shards` does not matter.
pub fn reduce_counts<I>(shards: I) -> WordCounts
where
    I: IntoIterator<Item = WordCounts>,
{
    let mut shards = shards.into_iter();
    let mut total = shards.next().unwrap_or_default();
    for shard in shards {
        for (word, count) in shard {
            *total.entry(word).or_insert(0) += count;
        }
    }
    total
}

/// Reduces shard tables into the global word table.
pub fn aggregate<I>(shards: I) -> Result<WordTable>
where
    I: IntoIterator<Item = WordCounts>,
{
    let total = reduce_counts(shards);
    if total.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    debug!("aggregated {} distinct words", total.len());
    Ok(WordTable::from_counts(total))
}

/// Derives the initial pair counts and adjacency index in one pass over the
/// words, optionally spread over the rayon pool.
pub fn build_statistics(words: WordTable, parallel: bool) -> Aggregate {
    let (pair_counts, index) = words
        .words()
        .maybe_par_iter(parallel)
        .enumerate()
        .map(|(i, word)| {
            let count = words.count(i);
            let mut pair_counts_local = PairCounts::default();
            let mut index_local: PairIndex = FxHashMap::default();
            for pair in word.pairs() {
                *pair_counts_local.entry(pair).or_insert(0) += count;
                index_local.entry(pair).or_default().insert(i);
            }
            (pair_counts_local, index_local)
        })
        .reduce(
            || (PairCounts::default(), PairIndex::default()),
            |(mut pair_counts, mut index), (pc_local, idx_local)| {
                for (pair, count) in pc_local {
                    *pair_counts.entry(pair).or_insert(0) += count;
                }
                for (pair, ids) in idx_local {
                    index
                        .entry(pair)
                        .or_insert_with(FxHashSet::default)
                        .extend(ids);
                }
                (pair_counts, index)
            },
        );

    Aggregate {
        words,
        pair_counts,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::counter::count_words;
    use crate::tokenizer::pair::{count_pairs, index_pairs};

    #[test]
    fn reduce_is_a_sum() {
        let total = reduce_counts(vec![
            count_words(["ab", "cd"]),
            count_words(["ab"]),
            WordCounts::default(),
        ]);
        assert_eq!(total[b"ab".as_slice()], 2);
        assert_eq!(total[b"cd".as_slice()], 1);
    }

    #[test]
    fn empty_shards_are_an_empty_corpus() {
        assert!(matches!(
            aggregate(vec![WordCounts::default(), WordCounts::default()]),
            Err(Error::EmptyCorpus)
        ));
        assert!(matches!(aggregate(Vec::new()), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn statistics_match_a_rescan() {
        let words = WordTable::from_words([
            (vec![1u8, 2, 3], 2),
            (vec![2u8, 3], 1),
            (b"aaaa".to_vec(), 3),
        ]);
        for parallel in [false, true] {
            let agg = build_statistics(words.clone(), parallel);
            assert_eq!(agg.pair_counts, count_pairs(&words));
            assert_eq!(agg.index, index_pairs(&words));
            assert_eq!(agg.pair_counts[&(1, 2)], 2);
            assert_eq!(agg.pair_counts[&(2, 3)], 3);
            assert_eq!(agg.pair_counts[&(97, 97)], 9);
        }
    }
}
