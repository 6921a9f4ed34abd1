// src/tokenizer/pre_tokenizer.rs

use fancy_regex::Regex;

use crate::tokenizer::added_vocabulary::AddedVocabulary;
use crate::tokenizer::Result;

/// GPT-2 split pattern. Needs look-ahead, hence `fancy_regex`.
pub const GPT2_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// One piece of pre-tokenized text. Concatenating the pieces of a text in
/// order gives the text back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Word(&'a str),
    Special(&'a str),
}

impl<'a> Piece<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Piece::Word(s) | Piece::Special(s) => s,
        }
    }
}

/// Turns raw text into the words BPE statistics are built from.
pub trait PreTokenizer {
    fn split<'a>(&self, text: &'a str) -> Result<Vec<Piece<'a>>>;

    /// Calls `f` for every word (special tokens skipped) without
    /// collecting the pieces first.
    fn for_each_word<F>(&self, text: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        for piece in self.split(text)? {
            if let Piece::Word(word) = piece {
                f(word);
            }
        }
        Ok(())
    }

    fn special_tokens(&self) -> &AddedVocabulary;
}

/// Regex pre-tokenizer that isolates special tokens first, then splits the
/// text between them. Words come out as UTF-8 strings whose bytes are the
/// initial symbols.
#[derive(Debug, Clone)]
pub struct ByteLevel {
    pattern: Regex,
    specials: AddedVocabulary,
}

impl ByteLevel {
    pub fn new(specials: AddedVocabulary) -> Result<Self> {
        Self::with_pattern(GPT2_PATTERN, specials)
    }

    pub fn with_pattern(pattern: &str, specials: AddedVocabulary) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            specials,
        })
    }

    fn split_words<'a>(&self, text: &'a str, out: &mut Vec<Piece<'a>>) -> Result<()> {
        for mat in self.pattern.find_iter(text) {
            out.push(Piece::Word(mat?.as_str()));
        }
        Ok(())
    }
}

impl PreTokenizer for ByteLevel {
    fn split<'a>(&self, text: &'a str) -> Result<Vec<Piece<'a>>> {
        let mut pieces = Vec::new();
        let mut last_end = 0;
        for range in self.specials.find_matches(text) {
            self.split_words(&text[last_end..range.start], &mut pieces)?;
            pieces.push(Piece::Special(&text[range.clone()]));
            last_end = range.end;
        }
        self.split_words(&text[last_end..], &mut pieces)?;
        Ok(pieces)
    }

    fn special_tokens(&self) -> &AddedVocabulary {
        &self.specials
    }
}
