// src/tokenizer/merger/baseline.rs

use crate::tokenizer::merger::{select_best, MergeOptions, Merger};
use crate::tokenizer::pair::{count_pairs, Pair};
use crate::tokenizer::vocab::Vocabulary;
use crate::tokenizer::word::WordTable;

/// Recounts every pair of every word before each merge. Quadratic in the
/// number of merges; used as the ground truth for [`FastMerger`].
///
/// [`FastMerger`]: super::FastMerger
#[derive(Debug, Clone)]
pub struct BasicMerger {
    words: WordTable,
    options: MergeOptions,
}

impl BasicMerger {
    pub fn new(words: WordTable, options: MergeOptions) -> Self {
        Self { words, options }
    }
}

impl Merger for BasicMerger {
    fn best_pair(&mut self, vocab: &Vocabulary) -> Option<(Pair, u64)> {
        select_best(count_pairs(&self.words), vocab, &self.options)
    }

    fn apply(&mut self, pair: Pair, new_id: u32, _vocab: &Vocabulary) -> u64 {
        let mut replaced = 0;
        for id in 0..self.words.len() {
            let count = self.words.count(id);
            let word = self.words.word_mut(id);
            if !word.contains_pair(pair) {
                continue;
            }
            let before = word.len();
            word.merge(pair.0, pair.1, new_id);
            replaced += (before - word.len()) as u64 * count;
        }
        replaced
    }

    fn words(&self) -> &WordTable {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_every_word_containing_the_pair() {
        let words = WordTable::from_words([(b"abab".as_slice(), 2), (b"ab".as_slice(), 1), (b"ba".as_slice(), 4)]);
        let mut vocab = Vocabulary::new();
        let mut merger = BasicMerger::new(words, MergeOptions::default());

        // (a, b): 2*2 + 1 = 5, (b, a): 2 + 4 = 6
        let (pair, count) = merger.best_pair(&vocab).unwrap();
        assert_eq!((pair, count), ((98, 97), 6));

        let id = vocab.push_merge(pair);
        assert_eq!(merger.apply(pair, id, &vocab), 6);
        assert_eq!(merger.words().word(0).symbols(), &[97, id, 98]);
        assert_eq!(merger.words().word(1).symbols(), &[97, 98]);
        assert_eq!(merger.words().word(2).symbols(), &[id]);
    }

    #[test]
    fn nothing_left_to_merge() {
        let words = WordTable::from_words([(b"a".as_slice(), 10)]);
        let mut merger = BasicMerger::new(words, MergeOptions::default());
        assert_eq!(merger.best_pair(&Vocabulary::new()), None);
    }
}
