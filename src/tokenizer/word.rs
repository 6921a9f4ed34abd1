// src/tokenizer/word.rs

use crate::tokenizer::pair::Pair;
use crate::tokenizer::counter::WordCounts;

/// Stable surrogate id of a word inside a [`WordTable`].
pub type WordId = usize;

/// A single distinct pre-token, stored as the ids of the symbols it is
/// currently made of. Starts as raw bytes and only ever gets shorter.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Word {
    symbols: Vec<u32>,
}

impl Word {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            symbols: bytes.iter().map(|&b| u32::from(b)).collect(),
        }
    }

    pub fn symbols(&self) -> &[u32] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Adjacent pairs in order, overlapping (`xxx` yields `(x, x)` twice).
    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        self.symbols.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn contains_pair(&self, pair: Pair) -> bool {
        self.pairs().any(|p| p == pair)
    }

    /// Replace every non-overlapping, left-to-right occurrence of `(a, b)`
    /// with `new_id`.
    ///
    /// Returns the pair-level changes as `(pair, ±1)` entries. Summed per
    /// pair they give the exact difference between the pair multiset of the
    /// word before and after the merge; individual entries may cancel out
    /// when occurrences are adjacent (`aaaa` briefly reports `(A, a)`).
    pub fn merge(&mut self, a: u32, b: u32, new_id: u32) -> Vec<(Pair, i32)> {
        let mut changes = Vec::new();
        let mut i = 0;
        let mut merged = Vec::with_capacity(self.symbols.len());

        while i < self.symbols.len() {
            if i + 1 < self.symbols.len() && self.symbols[i] == a && self.symbols[i + 1] == b {
                changes.push(((a, b), -1));

                if let Some(&prev) = merged.last() {
                    changes.push(((prev, a), -1));
                    changes.push(((prev, new_id), 1));
                }
                if let Some(&next) = self.symbols.get(i + 2) {
                    changes.push(((b, next), -1));
                    changes.push(((new_id, next), 1));
                }

                merged.push(new_id);
                i += 2;
            } else {
                merged.push(self.symbols[i]);
                i += 1;
            }
        }

        self.symbols = merged;
        changes
    }
}

/// Arena of distinct words with their corpus counts. Word ids are indices
/// into the arena and stay valid for the whole training run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WordTable {
    words: Vec<Word>,
    counts: Vec<u64>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from already deduplicated `(bytes, count)` entries,
    /// keeping their order as the word ids.
    pub fn from_words<I, W>(entries: I) -> Self
    where
        I: IntoIterator<Item = (W, u64)>,
        W: AsRef<[u8]>,
    {
        let mut table = Self::new();
        for (bytes, count) in entries {
            table.push(Word::from_bytes(bytes.as_ref()), count);
        }
        table
    }

    pub fn from_counts(counts: WordCounts) -> Self {
        Self::from_words(counts)
    }

    pub fn push(&mut self, word: Word, count: u64) -> WordId {
        debug_assert!(count > 0, "words are only tracked with a positive count");
        self.words.push(word);
        self.counts.push(count);
        self.words.len() - 1
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, id: WordId) -> &Word {
        &self.words[id]
    }

    pub(crate) fn word_mut(&mut self, id: WordId) -> &mut Word {
        &mut self.words[id]
    }

    pub fn count(&self, id: WordId) -> u64 {
        self.counts[id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordId, &Word, u64)> + '_ {
        self.words
            .iter()
            .zip(self.counts.iter())
            .enumerate()
            .map(|(id, (word, &count))| (id, word, count))
    }

    /// Sum of `count × len` over all words: the number of symbol
    /// occurrences in the corpus at the current point of training.
    pub fn total_symbols(&self) -> u64 {
        self.iter().map(|(_, word, count)| count * word.len() as u64).sum()
    }
}
