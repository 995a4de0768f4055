//! File-backed JSONL journal with a SHA-256 hash chain for crash recovery.
//!
//! Line 1 is a header with `format_version`, `build_id` and `seed`. Every later line is
//! one accepted player action carrying `prev_sha256_hex` and `sha256_hex`, so any edit,
//! reorder or deletion breaks the chain. Each record is flushed as soon as it is written.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::journal::{InputJournal, InputRecord, JOURNAL_FORMAT_VERSION};
use crate::types::PlayerAction;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct FileHeader {
    format_version: u16,
    build_id: String,
    seed: u64,
}

/// The hashed part of a record, serialized and concatenated with `prev_sha256_hex`.
#[derive(Serialize)]
struct RecordBody<'a> {
    seq: u64,
    turn: u64,
    action: &'a PlayerAction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FileRecord {
    seq: u64,
    /// World turn at which the action was submitted.
    turn: u64,
    action: PlayerAction,
    prev_sha256_hex: String,
    sha256_hex: String,
}

/// Previous-hash of the first record in a chain.
const INITIAL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

fn compute_record_sha256(body_json: &str, prev_sha256_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body_json.as_bytes());
    hasher.update(prev_sha256_hex.as_bytes());
    format!("{:064x}", hasher.finalize())
}

/// Appends accepted actions to a JSONL file, extending the hash chain.
pub struct JournalWriter {
    writer: BufWriter<File>,
    last_sha256_hex: String,
    next_seq: u64,
}

impl JournalWriter {
    /// Creates (or truncates) the journal and writes the header line.
    pub fn create(path: &Path, seed: u64, build_id: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let header = FileHeader {
            format_version: JOURNAL_FORMAT_VERSION,
            build_id: build_id.to_string(),
            seed,
        };
        let header_json = serde_json::to_string(&header).map_err(io::Error::other)?;
        writeln!(writer, "{header_json}")?;
        writer.flush()?;
        Ok(Self { writer, last_sha256_hex: INITIAL_HASH.to_string(), next_seq: 0 })
    }

    /// Continues an existing journal. `last_sha256_hex` and `next_seq` come from [`LoadedJournal`].
    pub fn resume(path: &Path, last_sha256_hex: String, next_seq: u64) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { writer: BufWriter::new(file), last_sha256_hex, next_seq })
    }

    /// Appends one accepted action and flushes. Returns its sequence number.
    pub fn append(&mut self, turn: u64, action: &PlayerAction) -> io::Result<u64> {
        let seq = self.next_seq;
        let body_json =
            serde_json::to_string(&RecordBody { seq, turn, action }).map_err(io::Error::other)?;
        let sha256_hex = compute_record_sha256(&body_json, &self.last_sha256_hex);
        let record = FileRecord {
            seq,
            turn,
            action: action.clone(),
            prev_sha256_hex: self.last_sha256_hex.clone(),
            sha256_hex: sha256_hex.clone(),
        };
        let record_json = serde_json::to_string(&record).map_err(io::Error::other)?;
        writeln!(self.writer, "{record_json}")?;
        self.writer.flush()?;

        self.last_sha256_hex = sha256_hex;
        self.next_seq += 1;
        Ok(seq)
    }
}

/// A validated journal plus what a [`JournalWriter`] needs to keep appending.
#[derive(Debug)]
pub struct LoadedJournal {
    pub journal: InputJournal,
    /// Hash of the last valid record, or the initial hash when there are none.
    pub last_sha256_hex: String,
    pub next_seq: u64,
}

#[derive(Debug, Error)]
pub enum JournalLoadError {
    #[error("journal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("journal file is empty")]
    EmptyFile,
    #[error("invalid journal header at line {line}: {message}")]
    InvalidHeader { line: usize, message: String },
    #[error("unsupported journal version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("invalid journal record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
    /// The file ends without a trailing newline, typically after a crash mid-write.
    #[error("incomplete journal line at line {line}")]
    IncompleteLine { line: usize },
    #[error("SHA-256 hash chain broken at line {line}")]
    HashChainBroken { line: usize },
}

/// Loads and validates a JSONL journal, stopping at the first bad line.
pub fn load_journal_from_file(path: &Path) -> Result<LoadedJournal, JournalLoadError> {
    let content = fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let Some((&header_line, records)) = lines.split_first() else {
        return Err(JournalLoadError::EmptyFile);
    };
    if !content.ends_with('\n') {
        return Err(JournalLoadError::IncompleteLine { line: lines.len() });
    }

    let header: FileHeader = serde_json::from_str(header_line)
        .map_err(|e| JournalLoadError::InvalidHeader { line: 1, message: e.to_string() })?;
    if header.format_version != JOURNAL_FORMAT_VERSION {
        return Err(JournalLoadError::UnsupportedVersion {
            found: header.format_version,
            expected: JOURNAL_FORMAT_VERSION,
        });
    }

    let mut journal = InputJournal {
        format_version: header.format_version,
        build_id: header.build_id,
        seed: header.seed,
        inputs: Vec::with_capacity(records.len()),
    };
    let mut prev_sha256_hex = INITIAL_HASH.to_string();
    let mut next_seq: u64 = 0;

    for (index, line) in records.iter().enumerate() {
        // 1-indexed, after the header.
        let line_number = index + 2;
        let invalid = |message: String| JournalLoadError::InvalidRecord { line: line_number, message };
        if line.is_empty() {
            return Err(invalid("empty line".to_string()));
        }
        let record: FileRecord = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
        if record.seq != next_seq {
            return Err(invalid(format!("expected seq {next_seq}, found {}", record.seq)));
        }
        if record.prev_sha256_hex != prev_sha256_hex {
            return Err(JournalLoadError::HashChainBroken { line: line_number });
        }
        let body = RecordBody { seq: record.seq, turn: record.turn, action: &record.action };
        let body_json = serde_json::to_string(&body).map_err(|e| invalid(e.to_string()))?;
        if record.sha256_hex != compute_record_sha256(&body_json, &prev_sha256_hex) {
            return Err(JournalLoadError::HashChainBroken { line: line_number });
        }

        journal.inputs.push(InputRecord { seq: record.seq, action: record.action });
        prev_sha256_hex = record.sha256_hex;
        next_seq += 1;
    }

    debug!(seed = journal.seed, records = next_seq, "journal loaded");
    Ok(LoadedJournal { journal, last_sha256_hex: prev_sha256_hex, next_seq })
}

#[cfg(test)]
mod tests;
