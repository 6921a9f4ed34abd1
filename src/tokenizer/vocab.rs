// src/tokenizer/vocab.rs

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tokenizer::pair::Pair;

/// Number of ids reserved for raw bytes.
pub const BASE_VOCAB_SIZE: usize = 256;

/// `(pair, new_id)`, recorded in the order merges were accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRule {
    pub pair: Pair,
    pub new_id: u32,
}

/// Byte content of a pair as used for tie-breaking:
/// `(vocab[left], vocab[right], left, right)`.
pub type PairKey<'a> = (&'a [u8], &'a [u8], u32, u32);

/// Id → byte string table. Ids `0..256` are the raw bytes, learned merges
/// follow in acceptance order and special tokens sit directly above them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<Arc<[u8]>>,
    specials: usize,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self {
            tokens: (0..=u8::MAX).map(|b| Arc::from([b].as_slice())).collect(),
            specials: 0,
        }
    }

    /// Rebuilds a vocabulary from its dense id → bytes listing; the last
    /// `specials` entries are the special tokens.
    pub(crate) fn from_parts(tokens: Vec<Vec<u8>>, specials: usize) -> Self {
        Self {
            tokens: tokens.into_iter().map(Arc::from).collect(),
            specials,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&[u8]> {
        self.tokens.get(id as usize).map(|t| &t[..])
    }

    pub(crate) fn token(&self, id: u32) -> &Arc<[u8]> {
        &self.tokens[id as usize]
    }

    /// Number of learned (merged) ids.
    pub fn learned_len(&self) -> usize {
        self.tokens.len() - BASE_VOCAB_SIZE - self.specials
    }

    pub fn special_ids(&self) -> Range<u32> {
        let end = self.tokens.len() as u32;
        end - self.specials as u32..end
    }

    pub fn next_id(&self) -> u32 {
        self.tokens.len() as u32
    }

    /// Registers `vocab[left] + vocab[right]` under the next free id.
    pub fn push_merge(&mut self, pair: Pair) -> u32 {
        debug_assert_eq!(self.specials, 0, "merges must be learned before special tokens are added");
        let left = &self.tokens[pair.0 as usize];
        let right = &self.tokens[pair.1 as usize];
        let mut merged = Vec::with_capacity(left.len() + right.len());
        merged.extend_from_slice(left);
        merged.extend_from_slice(right);

        let id = self.next_id();
        self.tokens.push(Arc::from(merged));
        id
    }

    pub fn push_special(&mut self, token: &str) -> u32 {
        let id = self.next_id();
        self.tokens.push(Arc::from(token.as_bytes()));
        self.specials += 1;
        id
    }

    pub fn pair_key(&self, pair: Pair) -> PairKey<'_> {
        (&self.token(pair.0)[..], &self.token(pair.1)[..], pair.0, pair.1)
    }

    /// Concatenates the bytes of `ids`, or `None` if one is unknown.
    pub fn expand(&self, ids: &[u32]) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            out.extend_from_slice(self.get(id)?);
        }
        Some(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.tokens.iter().enumerate().map(|(id, t)| (id as u32, &t[..]))
    }
}
