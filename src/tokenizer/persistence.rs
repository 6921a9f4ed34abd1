// src/tokenizer/persistence.rs

//! Versioned JSON snapshot of a trained vocabulary:
//!
//! ```json
//! { "version": 1, "merges": [[97, 97], ...], "vocab": { "0": "00", ..., "256": "6161" } }
//! ```
//!
//! Vocabulary entries are hex encoded so arbitrary bytes survive the trip.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::tokenizer::session::TrainOutput;
use crate::tokenizer::vocab::{MergeRule, Vocabulary, BASE_VOCAB_SIZE};
use crate::tokenizer::{Error, Result};

pub const STATE_VERSION: u64 = 1;

#[derive(Serialize)]
struct StateOut {
    version: u64,
    merges: Vec<[u32; 2]>,
    vocab: BTreeMap<u32, String>,
}

#[derive(Deserialize)]
struct StateIn {
    #[serde(default)]
    version: Option<u64>,
    merges: Vec<[u32; 2]>,
    vocab: BTreeMap<String, String>,
}

/// `<folder>/<prefix>_tokenizer.json`, with `prefix` reduced to its final
/// path component.
pub fn state_path(folder: &Path, prefix: &str) -> Result<PathBuf> {
    let name = Path::new(prefix)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::InvalidState(format!("unusable file prefix {prefix:?}")))?;
    Ok(folder.join(format!("{name}_tokenizer.json")))
}

/// Writes the state next to its final location, then renames it into
/// place so a crash never leaves a half written file behind.
pub fn save_state(
    vocab: &Vocabulary,
    merges: &[MergeRule],
    folder: impl AsRef<Path>,
    prefix: &str,
) -> Result<PathBuf> {
    let folder = folder.as_ref();
    if folder.exists() && !folder.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{} exists but is not a directory", folder.display()),
        )));
    }
    fs::create_dir_all(folder)?;
    let target = state_path(folder, prefix)?;

    let state = StateOut {
        version: STATE_VERSION,
        merges: merges.iter().map(|m| [m.pair.0, m.pair.1]).collect(),
        vocab: vocab.iter().map(|(id, bytes)| (id, to_hex(bytes))).collect(),
    };

    let mut tmp = NamedTempFile::new_in(folder)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, &state)?;
        writer.flush()?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;

    info!("saved {} tokens and {} merges to {}", vocab.len(), merges.len(), target.display());
    Ok(target)
}

/// Reads a state written by [`save_state`]. Merge ids are reassigned as
/// `256 + position`; vocabulary entries past the merges are the special
/// tokens.
pub fn load_state(folder: impl AsRef<Path>, prefix: &str) -> Result<(Vocabulary, Vec<MergeRule>)> {
    let path = state_path(folder.as_ref(), prefix)?;
    let data = fs::read(&path)?;
    let state: StateIn = serde_json::from_slice(&data)?;

    if state.version != Some(STATE_VERSION) {
        return Err(Error::InvalidState(format!(
            "unsupported state version {:?}",
            state.version
        )));
    }

    let mut by_id = BTreeMap::new();
    for (key, hex) in &state.vocab {
        let id: u32 = key
            .parse()
            .map_err(|_| Error::InvalidState(format!("invalid token id {key:?}")))?;
        let bytes = from_hex(hex)
            .ok_or_else(|| Error::InvalidState(format!("invalid hex for token {id}: {hex:?}")))?;
        by_id.insert(id, bytes);
    }

    let tokens: Vec<Vec<u8>> = by_id.into_values().collect();
    if tokens.len() < BASE_VOCAB_SIZE + state.merges.len() {
        return Err(Error::InvalidState(format!(
            "{} tokens cannot hold 256 bytes and {} merges",
            tokens.len(),
            state.merges.len()
        )));
    }
    if state.vocab.keys().any(|k| k.parse::<usize>().map_or(true, |id| id >= tokens.len())) {
        return Err(Error::InvalidState("token ids are not contiguous from 0".into()));
    }
    if let Some(b) = (0..=u8::MAX).find(|&b| tokens[usize::from(b)] != [b]) {
        return Err(Error::InvalidState(format!(
            "token {b} must be the single byte {b:02x}"
        )));
    }

    let mut merges = Vec::with_capacity(state.merges.len());
    for (i, &[left, right]) in state.merges.iter().enumerate() {
        let new_id = (BASE_VOCAB_SIZE + i) as u32;
        if left >= new_id || right >= new_id {
            return Err(Error::InvalidState(format!(
                "merge #{i} ({left}, {right}) refers to an id not yet defined"
            )));
        }
        let expected = [&tokens[left as usize][..], &tokens[right as usize][..]].concat();
        if tokens[new_id as usize] != expected {
            return Err(Error::InvalidState(format!(
                "token {new_id} is not the concatenation of merge #{i}"
            )));
        }
        merges.push(MergeRule {
            pair: (left, right),
            new_id,
        });
    }

    let specials = tokens.len() - BASE_VOCAB_SIZE - merges.len();
    Ok((Vocabulary::from_parts(tokens, specials), merges))
}

impl TrainOutput {
    pub fn save(&self, folder: impl AsRef<Path>, prefix: &str) -> Result<PathBuf> {
        save_state(&self.vocab, &self.merges, folder, prefix)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
