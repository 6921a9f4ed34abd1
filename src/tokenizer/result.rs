// src/tokenizer/result.rs

use thiserror::Error;

/// Everything that can stop a training run before it produces a vocabulary.
///
/// Running out of mergeable pairs is not in here: that ends training
/// successfully and is reported through [`StopReason`](super::StopReason).
#[derive(Debug, Error)]
pub enum Error {
    #[error("vocab_size must be > {minimum} (256 byte ids + special tokens), got {requested}")]
    InvalidVocabSize { requested: usize, minimum: usize },

    #[error("corpus contains no words after pre-tokenization")]
    EmptyCorpus,

    #[error("shard count must be at least 1")]
    InvalidShardCount,

    #[error("pattern error: {0}")]
    Pattern(String),

    #[error("invalid tokenizer state: {0}")]
    InvalidState(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<fancy_regex::Error> for Error {
    fn from(err: fancy_regex::Error) -> Self {
        Error::Pattern(err.to_string())
    }
}

impl From<aho_corasick::BuildError> for Error {
    fn from(err: aho_corasick::BuildError) -> Self {
        Error::Pattern(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
