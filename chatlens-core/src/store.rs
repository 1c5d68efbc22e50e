//! In-memory record store for the active file selection.
//!
//! A [`RecordStore`] is built once from an ordered list of NDJSON files and
//! never changes afterwards; a new selection builds a new store.
//!
//! # Error Handling
//!
//! - **Malformed lines**: bad JSON, missing required fields or invalid values
//!   are skipped. Each skip is logged and counted in the [`LoadReport`].
//! - **Blank lines**: ignored, not counted.
//! - **Unreadable file**: the whole load fails with [`Error::Input`].
//! - **Nothing usable**: zero valid records across all files is an
//!   [`Error::Input`] as well.

use crate::error::{Error, Result};
use crate::types::{MessageRecord, RawRecord};
use chrono::FixedOffset;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Per-file outcome of a load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLoadStats {
    pub path: PathBuf,
    pub records: usize,
    pub skipped_lines: usize,
}

/// What happened while building a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileLoadStats>,
    /// Records kept across all files
    pub total_records: usize,
    /// Malformed lines skipped across all files
    pub skipped_lines: usize,
    /// Records whose id was already seen earlier in the load
    pub duplicate_ids: usize,
}

/// Immutable table of message records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<MessageRecord>,
    files: Vec<PathBuf>,
    skipped_lines: usize,
}

impl RecordStore {
    /// An empty store, used before anything is selected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store directly from records.
    pub fn from_records(records: Vec<MessageRecord>) -> Self {
        Self {
            records,
            files: Vec::new(),
            skipped_lines: 0,
        }
    }

    /// Load and concatenate NDJSON files, treating epoch timestamps as UTC+8.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<(Self, LoadReport)> {
        let offset = FixedOffset::east_opt(8 * 3600)
            .ok_or_else(|| Error::Config("invalid default utc offset".to_string()))?;
        Self::load_with_offset(paths, offset)
    }

    /// Load and concatenate NDJSON files in order.
    ///
    /// Records are not deduplicated: the same id in two files gives two
    /// records. Duplicates are only counted in the report.
    pub fn load_with_offset<P: AsRef<Path>>(
        paths: &[P],
        offset: FixedOffset,
    ) -> Result<(Self, LoadReport)> {
        if paths.is_empty() {
            return Err(Error::Input("no files to load".to_string()));
        }

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for path in paths {
            let path = path.as_ref();
            let before = records.len();
            let skipped = read_file(path, offset, &mut records)?;

            let kept = records.len() - before;
            tracing::info!(
                path = %path.display(),
                records = kept,
                skipped_lines = skipped,
                "Loaded archive file"
            );
            report.files.push(FileLoadStats {
                path: path.to_path_buf(),
                records: kept,
                skipped_lines: skipped,
            });
            report.skipped_lines += skipped;
        }

        if records.is_empty() {
            return Err(Error::Input(format!(
                "no valid records in {} file(s) ({} malformed lines skipped)",
                paths.len(),
                report.skipped_lines
            )));
        }

        let mut seen = HashSet::with_capacity(records.len());
        report.duplicate_ids = records
            .iter()
            .filter(|r| !seen.insert(r.id.as_str()))
            .count();
        if report.duplicate_ids > 0 {
            tracing::warn!(
                duplicates = report.duplicate_ids,
                "Duplicate record ids kept as separate messages"
            );
        }

        report.total_records = records.len();

        let store = Self {
            records,
            files: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            skipped_lines: report.skipped_lines,
        };
        Ok((store, report))
    }

    /// All records, in load order.
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Files the store was built from.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Malformed lines skipped while loading.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Read one file, appending valid records. Returns the number of skipped lines.
fn read_file(path: &Path, offset: FixedOffset, out: &mut Vec<MessageRecord>) -> Result<usize> {
    let file = File::open(path).map_err(|e| {
        Error::Input(format!("failed to open {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let mut skipped = 0;
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
            Error::Input(format!(
                "failed to read {} at line {}: {}",
                path.display(),
                line_number + 1,
                e
            ))
        })?;
        if read == 0 {
            break;
        }
        line_number += 1;

        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match parse_line(&buf, offset) {
            Ok(record) => out.push(record),
            Err(message) => {
                let err = Error::Parse {
                    path: path.to_path_buf(),
                    line: line_number,
                    message,
                };
                tracing::warn!(error = %err, "Skipping malformed record");
                skipped += 1;
            }
        }
    }

    Ok(skipped)
}

/// Parse one raw line; invalid UTF-8 is a parse failure like any other.
fn parse_line(line: &[u8], offset: FixedOffset) -> std::result::Result<MessageRecord, String> {
    let raw: RawRecord = serde_json::from_slice(line).map_err(|e| e.to_string())?;
    raw.normalize(offset)
}
