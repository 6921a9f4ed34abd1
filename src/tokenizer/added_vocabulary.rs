// src/tokenizer/added_vocabulary.rs

use std::ops::Range;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::tokenizer::Result;

/// Caller-declared special tokens and the automaton that finds them.
///
/// Tokens are deduplicated (first occurrence wins the lower id) and empty
/// strings are ignored. Matching is leftmost-longest, so `<|a|>` and
/// `<|a|><|b|>` can coexist.
#[derive(Debug, Clone)]
pub struct AddedVocabulary {
    tokens: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl Default for AddedVocabulary {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            matcher: None,
        }
    }
}

impl AddedVocabulary {
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            if !token.is_empty() && !unique.iter().any(|t| t == token) {
                unique.push(token.to_owned());
            }
        }

        let matcher = if unique.is_empty() {
            None
        } else {
            Some(
                AhoCorasickBuilder::new()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&unique)?,
            )
        };

        Ok(Self {
            tokens: unique,
            matcher,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains(&self, token: &[u8]) -> bool {
        self.tokens.iter().any(|t| t.as_bytes() == token)
    }

    /// Byte ranges of all non-overlapping occurrences, in order.
    pub fn find_matches(&self, text: &str) -> Vec<Range<usize>> {
        match &self.matcher {
            Some(ac) => ac.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }
}
