// src/tokenizer/counter.rs

use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::tokenizer::pre_tokenizer::PreTokenizer;
use crate::tokenizer::Result;

/// Distinct word (raw bytes) → occurrence count.
pub type WordCounts = FxHashMap<Vec<u8>, u64>;

/// Counts an already split shard of words.
pub fn count_words<I, W>(words: I) -> WordCounts
where
    I: IntoIterator<Item = W>,
    W: AsRef<[u8]>,
{
    let mut counts = WordCounts::default();
    for word in words {
        let word = word.as_ref();
        if word.is_empty() {
            continue;
        }
        match counts.get_mut(word) {
            Some(c) => *c += 1,
            None => {
                counts.insert(word.to_vec(), 1);
            }
        }
    }
    counts
}

/// Pre-tokenizes one shard of raw text and counts its words. Special-token
/// occurrences are dropped.
pub fn count_shard<P: PreTokenizer>(pre_tokenizer: &P, shard: &str) -> Result<WordCounts> {
    let mut counts = WordCounts::default();
    pre_tokenizer.for_each_word(shard, |word| match counts.get_mut(word.as_bytes()) {
        Some(c) => *c += 1,
        None => {
            counts.insert(word.as_bytes().to_vec(), 1);
        }
    })?;
    Ok(counts)
}

/// Counts every shard of `source` on the current rayon pool. Each task owns
/// its range and returns its own table; nothing is shared while counting.
pub fn count_shards<P>(
    pre_tokenizer: &P,
    source: &str,
    shards: &[Range<usize>],
) -> Result<Vec<WordCounts>>
where
    P: PreTokenizer + Sync,
{
    shards
        .par_iter()
        .map(|range| {
            let counts = count_shard(pre_tokenizer, &source[range.clone()])?;
            debug!(
                "shard {}..{}: {} distinct words",
                range.start,
                range.end,
                counts.len()
            );
            Ok(counts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::added_vocabulary::AddedVocabulary;
    use crate::tokenizer::pre_tokenizer::ByteLevel;

    #[test]
    fn counts_raw_words() {
        let counts = count_words(["ab", "cd", "ab", ""]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[b"ab".as_slice()], 2);
        assert_eq!(counts[b"cd".as_slice()], 1);
    }

    #[test]
    fn shard_counting_drops_special_tokens() {
        let pre = ByteLevel::new(AddedVocabulary::new(&["<|eot|>"]).unwrap()).unwrap();
        let counts = count_shard(&pre, "hi hi<|eot|>hi").unwrap();
        assert_eq!(counts[b"hi".as_slice()], 2);
        assert_eq!(counts[b" hi".as_slice()], 1);
        assert!(!counts.contains_key(b"<|eot|>".as_slice()));
    }

    #[test]
    fn shards_are_counted_independently() {
        let pre = ByteLevel::new(AddedVocabulary::default()).unwrap();
        let source = "low lower lowest";
        let shards = count_shards(&pre, source, &[0..3, 3..9, 9..source.len()]).unwrap();
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0][b"low".as_slice()], 1);
        assert_eq!(shards[1][b" lower".as_slice()], 1);
        assert_eq!(shards[2][b" lowest".as_slice()], 1);
    }
}
