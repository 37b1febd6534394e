//! The evaluation dataset: a CSV file with `model` and `response` columns.
//!
//! The dataset is an explicitly owned handle loaded once at startup and
//! stored in `AppContext` — there is no lazy global cache.  A missing or
//! unreadable file degrades to an explicitly empty dataset; tool handlers
//! then report a structured "not loaded" error instead of crashing.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file has no header row")]
    EmptyFile,
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("unterminated quoted field starting in record {0}")]
    UnterminatedQuote(usize),
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// One dataset entry: the generating model's name and its story text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    pub model: String,
    pub response: String,
}

/// In-memory dataset handle.  Read-only after construction.
#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Load the dataset from `path`, degrading to an empty dataset (with a
    /// diagnostic) when the file is absent or unreadable.
    pub fn load_or_empty(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), err = %e, "dataset file not readable — starting with an empty dataset");
                return Self::default();
            }
        };
        match Self::from_csv(&text) {
            Ok(dataset) => {
                info!(path = %path.display(), entries = dataset.len(), "dataset loaded");
                dataset
            }
            Err(e) => {
                warn!(path = %path.display(), err = %e, "dataset file not parseable — starting with an empty dataset");
                Self::default()
            }
        }
    }

    /// Parse CSV text with a header row naming at least `model` and
    /// `response` columns.
    pub fn from_csv(text: &str) -> Result<Self, DatasetError> {
        let records = parse_csv(text)?;
        let mut iter = records.into_iter();
        let header = iter.next().ok_or(DatasetError::EmptyFile)?;

        let col = |name: &'static str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };
        let model_col = col("model")?;
        let response_col = col("response")?;

        let rows = iter
            .map(|record| DatasetRow {
                model: record.get(model_col).cloned().unwrap_or_default(),
                response: record.get(response_col).cloned().unwrap_or_default(),
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by 0-based index; `None` when out of range.
    pub fn row(&self, index: usize) -> Option<&DatasetRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }
}

// ─── CSV reader ───────────────────────────────────────────────────────────────

/// Minimal RFC-4180 reader: quoted fields, doubled-quote escapes, embedded
/// commas and newlines inside quotes, CRLF or LF record separators.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, DatasetError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // True once the current field consumed any character (so a bare quote
    // mid-field stays literal, and a closing quote ends quoted mode).
    let mut field_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
                // A lone trailing newline does not open an empty record.
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(DatasetError::UnterminatedQuote(records.len() + 1));
    }
    if field_started || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
