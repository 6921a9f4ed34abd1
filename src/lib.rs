// lib.rs

//! Byte-level BPE vocabulary training.
//!
//! Words are counted (optionally across shards on a rayon pool), reduced
//! into one table and merged greedily: the most frequent adjacent pair
//! becomes a new token until the requested vocabulary size is reached.
//! Ties between equally frequent pairs are broken on their byte content,
//! so the result never depends on hashing or on the number of workers.
//!
//! ```no_run
//! let output = bbpe_trainer::train_parallel("low lower lowest", 300, &["<|endoftext|>"], 4)?;
//! println!("{} tokens, {} merges", output.vocab.len(), output.merges.len());
//! # Ok::<(), bbpe_trainer::tokenizer::Error>(())
//! ```

pub mod tokenizer;

use tokenizer::{BpeTrainer, MergeStrategy, Result, TrainOutput};

/// Trains on already split words with the rescanning baseline engine.
pub fn train<I, W>(corpus_words: I, target_vocab_size: usize, special_tokens: &[&str]) -> Result<TrainOutput>
where
    I: IntoIterator<Item = W>,
    W: AsRef<[u8]>,
{
    BpeTrainer::builder()
        .vocab_size(target_vocab_size)
        .special_tokens(special_tokens.iter().copied())
        .strategy(MergeStrategy::Baseline)
        .show_progress(false)
        .build()
        .train_words(corpus_words)
}

/// Pre-tokenizes and counts `corpus_source` in `n_workers` shards, then
/// trains with the incremental engine.
pub fn train_parallel(
    corpus_source: &str,
    target_vocab_size: usize,
    special_tokens: &[&str],
    n_workers: usize,
) -> Result<TrainOutput> {
    BpeTrainer::builder()
        .vocab_size(target_vocab_size)
        .special_tokens(special_tokens.iter().copied())
        .strategy(MergeStrategy::Incremental)
        .workers(n_workers)
        .show_progress(false)
        .build()
        .train_parallel(corpus_source)
}
