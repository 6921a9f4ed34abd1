// src/tokenizer/chunker.rs

//! Cuts a corpus into shards that can be pre-tokenized independently.
//!
//! A cut is safe when pre-tokenizing both sides separately gives the same
//! words as pre-tokenizing the whole text. Two kinds of position qualify:
//!
//! * the start of a special-token occurrence (the pre-tokenizer splits
//!   there anyway);
//! * a non-whitespace char followed by a whitespace char, outside any
//!   special-token occurrence. No alternative of the split pattern matches
//!   across such a transition, and none of them looks behind.

use std::ops::Range;

use crate::tokenizer::added_vocabulary::AddedVocabulary;
use crate::tokenizer::{Error, Result};

/// Splits `source` into at most `n_shards` contiguous byte ranges that
/// cover it exactly. Ranges are never empty; a short or unbreakable source
/// yields fewer of them.
pub fn split_for_parallel(
    source: &str,
    n_shards: usize,
    specials: &AddedVocabulary,
) -> Result<Vec<Range<usize>>> {
    if n_shards == 0 {
        return Err(Error::InvalidShardCount);
    }
    if source.is_empty() {
        return Ok(Vec::new());
    }

    let occurrences = specials.find_matches(source);
    let step = source.len().div_ceil(n_shards);
    let mut cuts = vec![0];

    for k in 1..n_shards {
        let last = *cuts.last().unwrap_or(&0);
        let target = (k * step).max(last + 1);
        if target >= source.len() {
            break;
        }
        match next_safe_cut(source, target, &occurrences) {
            Some(cut) if cut > last && cut < source.len() => cuts.push(cut),
            Some(_) => {}
            None => break,
        }
    }
    cuts.push(source.len());

    Ok(cuts.windows(2).map(|w| w[0]..w[1]).collect())
}

/// First safe cut at or after `from`.
fn next_safe_cut(source: &str, from: usize, occurrences: &[Range<usize>]) -> Option<usize> {
    let mut start = from;
    while !source.is_char_boundary(start) {
        start += 1;
    }

    let next_special = occurrences
        .get(occurrences.partition_point(|r| r.start < start))
        .map(|r| r.start);
    let limit = next_special.unwrap_or(source.len());

    let mut prev = source[..start].chars().next_back();
    for (offset, ch) in source[start..limit].char_indices() {
        let pos = start + offset;
        let transition = prev.is_some_and(|p| !p.is_whitespace()) && ch.is_whitespace();
        if transition && !inside_occurrence(pos, occurrences) {
            return Some(pos);
        }
        prev = Some(ch);
    }
    next_special
}

fn inside_occurrence(pos: usize, occurrences: &[Range<usize>]) -> bool {
    occurrences
        .get(occurrences.partition_point(|r| r.end <= pos))
        .is_some_and(|r| r.start < pos)
}
