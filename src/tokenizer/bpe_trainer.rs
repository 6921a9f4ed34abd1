// src/tokenizer/bpe_trainer.rs

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::tokenizer::added_vocabulary::AddedVocabulary;
use crate::tokenizer::aggregator::{aggregate, build_statistics};
use crate::tokenizer::chunker::split_for_parallel;
use crate::tokenizer::counter::{count_shard, count_shards, count_words};
use crate::tokenizer::merger::{MergeOptions, MergeStrategy, Merger, TieBreak};
use crate::tokenizer::pre_tokenizer::{ByteLevel, PreTokenizer};
use crate::tokenizer::progress::{ProgressBar, ProgressStyle};
use crate::tokenizer::session::{StopReason, TrainOutput, TrainingSession};
use crate::tokenizer::vocab::BASE_VOCAB_SIZE;
use crate::tokenizer::word::WordTable;
use crate::tokenizer::{Error, Result};

/// Everything a training run can be configured with. Loadable from JSON;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Final vocabulary size: 256 byte ids + merges + special tokens.
    pub vocab_size: usize,
    pub special_tokens: Vec<String>,
    pub min_frequency: u64,
    pub show_progress: bool,
    pub strategy: MergeStrategy,
    pub tie_break: TieBreak,
    /// Counting workers for the parallel pipeline. `None` uses the
    /// available hardware parallelism.
    pub workers: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 800,
            special_tokens: Vec::new(),
            min_frequency: 1,
            show_progress: true,
            strategy: MergeStrategy::default(),
            tie_break: TieBreak::default(),
            workers: None,
        }
    }
}

impl TrainerConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            min_frequency: self.min_frequency,
            tie_break: self.tie_break,
        }
    }

    /// How many merges fit in `vocab_size` once bytes and `specials` are
    /// reserved. At least one merge has to fit.
    pub fn merge_budget(&self, specials: &AddedVocabulary) -> Result<usize> {
        let minimum = BASE_VOCAB_SIZE + specials.len();
        if self.vocab_size <= minimum {
            return Err(Error::InvalidVocabSize {
                requested: self.vocab_size,
                minimum,
            });
        }
        Ok(self.vocab_size - minimum)
    }
}

#[derive(Debug, Default, Clone)]
pub struct BpeTrainerBuilder {
    config: TrainerConfig,
}

impl BpeTrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn vocab_size(mut self, size: usize) -> Self {
        self.config.vocab_size = size;
        self
    }

    #[must_use]
    pub fn special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.special_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn min_frequency(mut self, frequency: u64) -> Self {
        self.config.min_frequency = frequency;
        self
    }

    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    #[must_use]
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.tie_break = tie_break;
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn build(self) -> BpeTrainer {
        BpeTrainer {
            config: self.config,
        }
    }
}

/// Learns a byte-level BPE vocabulary.
///
/// Every entry point validates the size first, then builds the word table
/// (directly, from one text, or from shards counted in parallel) and runs
/// the configured merge strategy over it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpeTrainer {
    config: TrainerConfig,
}

impl From<TrainerConfig> for BpeTrainer {
    fn from(config: TrainerConfig) -> Self {
        Self { config }
    }
}

impl BpeTrainer {
    pub fn builder() -> BpeTrainerBuilder {
        BpeTrainerBuilder::new()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Worker count for [`train_parallel`](Self::train_parallel).
    pub fn workers(&self) -> usize {
        self.config
            .workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    fn specials(&self) -> Result<AddedVocabulary> {
        AddedVocabulary::new(&self.config.special_tokens)
    }

    fn setup_progress(&self) -> Option<ProgressBar> {
        if self.config.show_progress {
            let p = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos:>9!}/{len:<9!}")
            {
                p.set_style(style);
            }
            Some(p)
        } else {
            None
        }
    }

    fn update_progress(&self, p: &Option<ProgressBar>, len: usize, message: &'static str) {
        if let Some(p) = p {
            p.set_message(message);
            p.set_length(len as u64);
            p.reset();
        }
    }

    fn finalize_progress(&self, p: &Option<ProgressBar>, final_len: usize) {
        if let Some(p) = p {
            p.set_length(final_len as u64);
            p.finish();
        }
    }

    /// Trains on already split words. Words equal to a special token are
    /// skipped; specials only ever enter the vocabulary as whole tokens.
    pub fn train_words<I, W>(&self, words: I) -> Result<TrainOutput>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<[u8]>,
    {
        let specials = self.specials()?;
        let budget = self.config.merge_budget(&specials)?;

        let counts = count_words(words.into_iter().filter(|w| {
            let bytes: &[u8] = w.as_ref();
            !specials.contains(bytes)
        }));
        let table = aggregate([counts])?;
        Ok(self.merge(table, &specials, budget, false))
    }

    /// Pre-tokenizes `text` on the calling thread and trains on it.
    pub fn train_text(&self, text: &str) -> Result<TrainOutput> {
        let specials = self.specials()?;
        let budget = self.config.merge_budget(&specials)?;

        let pre_tokenizer = ByteLevel::new(specials)?;
        let table = aggregate([count_shard(&pre_tokenizer, text)?])?;
        Ok(self.merge(table, pre_tokenizer.special_tokens(), budget, false))
    }

    /// Splits `source` into one shard per worker, counts the shards on a
    /// dedicated rayon pool and trains on the reduced table.
    pub fn train_parallel(&self, source: &str) -> Result<TrainOutput> {
        let specials = self.specials()?;
        let budget = self.config.merge_budget(&specials)?;
        let workers = self.workers();

        let start = Instant::now();
        let shards = split_for_parallel(source, workers, &specials)?;
        let pre_tokenizer = ByteLevel::new(specials)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;

        let (table, words_elapsed) = pool.install(|| -> Result<_> {
            let counts = count_shards(&pre_tokenizer, source, &shards)?;
            let table = aggregate(counts)?;
            Ok((table, start.elapsed()))
        })?;
        info!(
            "counted {} distinct words in {} shards on {} workers ({:.2?})",
            table.len(),
            shards.len(),
            workers,
            words_elapsed
        );

        Ok(pool.install(|| self.merge(table, pre_tokenizer.special_tokens(), budget, workers > 1)))
    }

    /// Reads a UTF-8 file and trains on it with [`train_parallel`](Self::train_parallel).
    pub fn train_from_file(&self, path: impl AsRef<Path>) -> Result<TrainOutput> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        info!("read {} bytes from {}", text.len(), path.display());
        self.train_parallel(&text)
    }

    fn merge(
        &self,
        words: WordTable,
        specials: &AddedVocabulary,
        budget: usize,
        parallel: bool,
    ) -> TrainOutput {
        let options = self.config.merge_options();
        info!(
            "learning up to {} merges over {} words ({:?} strategy)",
            budget,
            words.len(),
            self.config.strategy
        );

        match self.config.strategy {
            MergeStrategy::Baseline => {
                self.drive(TrainingSession::baseline(words, options), specials, budget)
            }
            MergeStrategy::Incremental => {
                let aggregate = build_statistics(words, parallel);
                self.drive(TrainingSession::incremental(aggregate, options), specials, budget)
            }
        }
    }

    fn drive<M: Merger>(
        &self,
        mut session: TrainingSession<M>,
        specials: &AddedVocabulary,
        budget: usize,
    ) -> TrainOutput {
        let progress = self.setup_progress();
        self.update_progress(&progress, budget, "Compute merges");

        let start = Instant::now();
        let stop_reason = session.run(budget, |_| {
            if let Some(p) = &progress {
                p.inc(1);
            }
        });
        let learned = session.merges().len();
        self.finalize_progress(&progress, learned);

        if stop_reason == StopReason::Exhausted {
            warn!(
                "no mergeable pair left after {} of {} merges; vocabulary will have {} tokens instead of {}",
                learned,
                budget,
                BASE_VOCAB_SIZE + learned + specials.len(),
                self.config.vocab_size
            );
        }
        info!("learned {} merges in {:.2?}", learned, start.elapsed());

        session.finish(specials)
    }
}
