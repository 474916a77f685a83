//! Record sink for extracted comments.
//!
//! Appends one JSON record per line in append-only mode for crash safety.
//! Each record carries the extracted fields, the campaign tag, and the
//! creation timestamp; once written, records are never updated or deleted.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One structured record per processed screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub username: String,
    pub comment: String,
    /// Derived value; `None` when the comment contained no numeric token.
    /// Never conflated with an extracted zero.
    pub transaction_value: Option<i64>,
    pub campaign_name: String,
    pub created_at: DateTime<Local>,
}

/// Single-record insert capability. Returns the assigned record id.
pub trait RecordSink {
    fn insert(&mut self, record: &CommentRecord) -> Result<u64>;
}

/// JSON-lines file sink. Opening validates the file is writable before any
/// image is processed; ids continue from existing content so reruns append.
pub struct JsonlSink {
    file: File,
    path: PathBuf,
    next_id: u64,
}

impl JsonlSink {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let existing = if path.exists() {
            let reader = BufReader::new(
                File::open(path).with_context(|| {
                    format!("Failed to open record sink {}", path.display())
                })?,
            );
            reader.lines().count() as u64
        } else {
            0
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open record sink {}", path.display()))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            next_id: existing + 1,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonlSink {
    fn insert(&mut self, record: &CommentRecord) -> Result<u64> {
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(self.file, "{}", line)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.file.flush()?;

        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}
