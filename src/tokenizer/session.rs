// src/tokenizer/session.rs

use bstr::ByteSlice;
use log::debug;

use crate::tokenizer::added_vocabulary::AddedVocabulary;
use crate::tokenizer::aggregator::Aggregate;
use crate::tokenizer::merger::{BasicMerger, FastMerger, MergeOptions, Merger};
use crate::tokenizer::vocab::{MergeRule, Vocabulary};
use crate::tokenizer::word::WordTable;

/// Why the merge loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested vocabulary size was reached.
    TargetReached,
    /// No pair reached the minimum frequency before the target size; the
    /// vocabulary is smaller than requested.
    Exhausted,
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOutput {
    pub vocab: Vocabulary,
    pub merges: Vec<MergeRule>,
    pub stop_reason: StopReason,
}

impl TrainOutput {
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.stop_reason == StopReason::Exhausted
    }
}

/// State of one training run: the merge engine plus everything learned so
/// far. Consistent after every [`step`](Self::step), so a caller may stop
/// at any point and still [`finish`](Self::finish).
#[derive(Debug)]
pub struct TrainingSession<M: Merger> {
    merger: M,
    vocab: Vocabulary,
    merges: Vec<MergeRule>,
    exhausted: bool,
}

impl TrainingSession<BasicMerger> {
    pub fn baseline(words: WordTable, options: MergeOptions) -> Self {
        Self::new(BasicMerger::new(words, options), Vocabulary::new())
    }
}

impl TrainingSession<FastMerger> {
    pub fn incremental(aggregate: Aggregate, options: MergeOptions) -> Self {
        let vocab = Vocabulary::new();
        let merger = FastMerger::new(aggregate, &vocab, options);
        Self::new(merger, vocab)
    }
}

impl<M: Merger> TrainingSession<M> {
    pub fn new(merger: M, vocab: Vocabulary) -> Self {
        Self {
            merger,
            vocab,
            merges: Vec::new(),
            exhausted: false,
        }
    }

    /// Learns one merge. `None` once nothing is left to merge.
    pub fn step(&mut self) -> Option<MergeRule> {
        if self.exhausted {
            return None;
        }
        let Some((pair, count)) = self.merger.best_pair(&self.vocab) else {
            self.exhausted = true;
            return None;
        };

        let new_id = self.vocab.push_merge(pair);
        let replaced = self.merger.apply(pair, new_id, &self.vocab);
        debug!(
            "merge #{}: {:?} + {:?} -> {} (count {}, {} symbols replaced)",
            self.merges.len() + 1,
            self.vocab.token(pair.0).as_bstr(),
            self.vocab.token(pair.1).as_bstr(),
            new_id,
            count,
            replaced
        );

        let rule = MergeRule { pair, new_id };
        self.merges.push(rule);
        Some(rule)
    }

    /// Steps until `max_merges` rules exist or nothing is left to merge,
    /// calling `on_merge` after each accepted rule.
    pub fn run<F>(&mut self, max_merges: usize, mut on_merge: F) -> StopReason
    where
        F: FnMut(&MergeRule),
    {
        while self.merges.len() < max_merges {
            match self.step() {
                Some(rule) => on_merge(&rule),
                None => return StopReason::Exhausted,
            }
        }
        StopReason::TargetReached
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &[MergeRule] {
        &self.merges
    }

    pub fn merger(&self) -> &M {
        &self.merger
    }

    pub fn words(&self) -> &WordTable {
        self.merger.words()
    }

    /// Appends the special tokens above the learned ids and releases the
    /// merge engine.
    pub fn finish(self, specials: &AddedVocabulary) -> TrainOutput {
        let Self {
            mut vocab,
            merges,
            exhausted,
            ..
        } = self;
        for token in specials.tokens() {
            vocab.push_special(token);
        }
        TrainOutput {
            vocab,
            merges,
            stop_reason: if exhausted {
                StopReason::Exhausted
            } else {
                StopReason::TargetReached
            },
        }
    }
}
