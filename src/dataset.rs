//! Dataset loading for evaluation sessions.
//!
//! A dataset is a JSONL file where every line is an object with at least
//! string `input` and `output` fields. Extra fields are ignored.
//!
//! ```text
//! {"input": "What is Rust?", "output": "A systems programming language."}
//! {"input": "Who created Python?", "output": "Guido van Rossum."}
//! ```

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single record to evaluate. Its identity is its position in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The question shown to the evaluator.
    pub input: String,
    /// The recorded response, used as ground truth.
    pub output: String,
}

impl EvaluationRecord {
    /// Create a new record.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// An ordered, read-only collection of evaluation records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// File the dataset was loaded from, if any.
    source: Option<PathBuf>,
    records: Vec<EvaluationRecord>,
}

impl Dataset {
    /// Build a dataset from in-memory records.
    pub fn new(records: Vec<EvaluationRecord>) -> Self {
        Self {
            source: None,
            records,
        }
    }

    /// Load a dataset from a JSONL file.
    ///
    /// The load is all-or-nothing: the first line that does not parse fails the
    /// whole load with [`EvalError::MalformedRecord`] carrying its 1-indexed line
    /// number. Invalid UTF-8 counts as a malformed line. Blank lines are
    /// skipped. An empty file is a valid, empty dataset.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EvalError::DatasetNotFound(path.to_path_buf()),
            _ => EvalError::io(path, e),
        })?;

        let malformed = |line: usize, message: String| EvalError::MalformedRecord {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut records = Vec::new();
        for (line_num, raw) in content.split(|&b| b == b'\n').enumerate() {
            let line = std::str::from_utf8(raw)
                .map_err(|e| malformed(line_num + 1, e.to_string()))?
                .trim();
            if line.is_empty() {
                continue;
            }

            let record: EvaluationRecord = serde_json::from_str(line)
                .map_err(|e| malformed(line_num + 1, e.to_string()))?;
            records.push(record);
        }

        info!(path = %path.display(), records = records.len(), "loaded dataset");

        Ok(Self {
            source: Some(path.to_path_buf()),
            records,
        })
    }

    /// File this dataset came from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record by zero-based index.
    pub fn get(&self, index: usize) -> Option<&EvaluationRecord> {
        self.records.get(index)
    }

    /// Iterate over records in order.
    pub fn iter(&self) -> impl Iterator<Item = &EvaluationRecord> {
        self.records.iter()
    }

    /// Number of distinct outputs. When this is lower than [`len`](Self::len),
    /// neighbour-derived alternatives can coincide with the ground truth.
    pub fn distinct_outputs(&self) -> usize {
        let mut outputs: Vec<&str> = self.records.iter().map(|r| r.output.as_str()).collect();
        outputs.sort_unstable();
        outputs.dedup();
        debug!(distinct = outputs.len(), total = self.len(), "counted outputs");
        outputs.len()
    }
}
