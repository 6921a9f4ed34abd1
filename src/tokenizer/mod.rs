// src/tokenizer/mod.rs

pub mod added_vocabulary;
pub mod aggregator;
pub mod bpe_trainer;
pub mod chunker;
pub mod counter;
pub mod merger;
pub mod pair;
pub mod parallelism;
pub mod persistence;
pub mod pre_tokenizer;
mod progress;
pub mod result;
pub mod session;
pub mod vocab;
pub mod word;

pub use added_vocabulary::AddedVocabulary;
pub use aggregator::{aggregate, build_statistics, Aggregate};
pub use bpe_trainer::{BpeTrainer, BpeTrainerBuilder, TrainerConfig};
pub use chunker::split_for_parallel;
pub use counter::WordCounts;
pub use merger::{BasicMerger, FastMerger, MergeOptions, MergeStrategy, Merger, TieBreak};
pub use pair::{Pair, PairCounts, PairIndex};
pub use persistence::{load_state, save_state};
pub use pre_tokenizer::{ByteLevel, Piece, PreTokenizer};
pub use result::{Error, Result};
pub use session::{StopReason, TrainOutput, TrainingSession};
pub use vocab::{MergeRule, Vocabulary, BASE_VOCAB_SIZE};
pub use word::{Word, WordId, WordTable};
