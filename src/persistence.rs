//! Persistence layer for evaluation results.
//!
//! Every save rewrites two sibling artifacts from the full result log:
//! a CSV file (for spreadsheets) and a JSONL file with the same stem
//! (for tooling, and for resuming a session later).

use crate::error::{EvalError, Result};
use crate::session::ResultRecord;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Column order of the CSV artifact. Matches [`ResultRecord`] field order.
pub const CSV_HEADER: [&str; 8] = [
    "question_index",
    "question",
    "ground_truth",
    "selected_option",
    "selected_response",
    "is_correct",
    "comments",
    "timestamp",
];

/// Format of the session start time embedded in artifact names.
pub const SESSION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths written by a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    /// Tabular artifact.
    pub csv_path: PathBuf,
    /// Newline-delimited JSON artifact.
    pub jsonl_path: PathBuf,
    /// Number of records written to each.
    pub records: usize,
}

/// Writes a session's result log to a fixed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultStore {
    csv_path: PathBuf,
    jsonl_path: PathBuf,
}

impl ResultStore {
    /// Create a store for `destination`. The JSONL sibling shares its stem.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        let csv_path = destination.with_extension("csv");
        let jsonl_path = destination.with_extension("jsonl");
        Self {
            csv_path,
            jsonl_path,
        }
    }

    /// Destination for a new session: `<output_dir>/<evaluator>_<YYYYmmdd_HHMMSS>.csv`.
    pub fn for_session(output_dir: &Path, evaluator: &str, started: NaiveDateTime) -> Self {
        let stem = format!("{}_{}", evaluator, started.format(SESSION_TIMESTAMP_FORMAT));
        Self::new(output_dir.join(format!("{stem}.csv")))
    }

    /// Path of the CSV artifact.
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Path of the JSONL artifact.
    pub fn jsonl_path(&self) -> &Path {
        &self.jsonl_path
    }

    /// Rewrite both artifacts from `results`.
    ///
    /// The CSV file is written first. If it succeeds and the JSONL write
    /// fails, the error is [`EvalError::PartialWrite`].
    pub fn persist(&self, results: &[ResultRecord]) -> Result<SavedArtifacts> {
        ensure_parent_dir(&self.csv_path)?;
        ensure_parent_dir(&self.jsonl_path)?;

        let csv = encode_csv(results);
        let jsonl = encode_jsonl(results)?;

        fs::write(&self.csv_path, csv).map_err(|e| EvalError::io(&self.csv_path, e))?;

        if let Err(e) = fs::write(&self.jsonl_path, jsonl) {
            warn!(path = %self.jsonl_path.display(), "JSONL write failed after CSV succeeded");
            return Err(EvalError::PartialWrite {
                written: self.csv_path.clone(),
                failed: self.jsonl_path.clone(),
                source: e,
            });
        }

        info!(
            csv = %self.csv_path.display(),
            records = results.len(),
            "saved results"
        );

        Ok(SavedArtifacts {
            csv_path: self.csv_path.clone(),
            jsonl_path: self.jsonl_path.clone(),
            records: results.len(),
        })
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!(dir = %parent.display(), "creating output directory");
            fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
    }
    Ok(())
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode results as CSV with a header row.
pub fn encode_csv(results: &[ResultRecord]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for r in results {
        let row = [
            r.index.to_string(),
            csv_escape(&r.question),
            csv_escape(&r.ground_truth),
            csv_escape(&r.selected_label),
            csv_escape(&r.selected_response),
            if r.is_correct { "True" } else { "False" }.to_string(),
            csv_escape(&r.comment),
            csv_escape(&r.timestamp),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Encode results as one JSON object per line.
pub fn encode_jsonl(results: &[ResultRecord]) -> Result<String> {
    let mut out = String::new();
    for r in results {
        out.push_str(&serde_json::to_string(r)?);
        out.push('\n');
    }
    Ok(out)
}

/// Read a JSONL result artifact back into records.
pub fn load_results(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_num, line)| {
            serde_json::from_str(line).map_err(|e| EvalError::MalformedRecord {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// A session found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    /// Evaluator name taken from the file name.
    pub evaluator: String,
    /// Session start time taken from the file name.
    pub started: NaiveDateTime,
    /// JSONL artifact.
    pub jsonl_path: PathBuf,
    /// CSV artifact (may be missing after a partial write).
    pub csv_path: PathBuf,
}

impl SavedSession {
    /// Parse `<evaluator>_<YYYYmmdd>_<HHMMSS>` from an artifact path.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let mut parts = stem.rsplitn(3, '_');
        let time = parts.next()?;
        let date = parts.next()?;
        let evaluator = parts.next()?;
        if evaluator.is_empty() {
            return None;
        }

        let started =
            NaiveDateTime::parse_from_str(&format!("{date}_{time}"), SESSION_TIMESTAMP_FORMAT)
                .ok()?;

        Some(Self {
            evaluator: evaluator.to_string(),
            started,
            jsonl_path: path.with_extension("jsonl"),
            csv_path: path.with_extension("csv"),
        })
    }
}

/// List saved sessions in `output_dir`, oldest first.
///
/// Files that don't follow the session naming scheme are ignored. A missing
/// directory yields an empty list.
pub fn list_sessions(output_dir: &Path) -> Result<Vec<SavedSession>> {
    if !output_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in WalkDir::new(output_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(output_dir).to_path_buf();
            EvalError::io(path, e.into())
        })?;

        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some("jsonl")
        {
            continue;
        }

        match SavedSession::from_path(path) {
            Some(session) => sessions.push(session),
            None => debug!(path = %path.display(), "skipping unrecognised result file"),
        }
    }

    sessions.sort_by(|a, b| {
        a.started
            .cmp(&b.started)
            .then_with(|| a.evaluator.cmp(&b.evaluator))
    });
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(index: usize, label: &str, response: &str, correct: bool) -> ResultRecord {
        ResultRecord {
            index,
            question: format!("Q{}", index + 1),
            ground_truth: format!("R{}", index + 1),
            selected_label: label.to_string(),
            selected_response: response.to_string(),
            is_correct: correct,
            comment: String::new(),
            timestamp: "2026-10-18T09:30:00.000000".to_string(),
        }
    }

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_session_destination_naming() {
        let store = ResultStore::for_session(Path::new("out"), "alice", started());
        assert_eq!(store.csv_path(), Path::new("out/alice_20261018_093005.csv"));
        assert_eq!(
            store.jsonl_path(),
            Path::new("out/alice_20261018_093005.jsonl")
        );
    }

    #[test]
    fn test_persist_creates_directory_and_both_files() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("nested/deeper/run.csv"));

        let saved = store
            .persist(&[record(0, "A", "R1", true), record(1, "B", "R1", false)])
            .unwrap();

        assert_eq!(saved.records, 2);
        assert!(saved.csv_path.exists());
        assert!(saved.jsonl_path.exists());

        let csv = fs::read_to_string(&saved.csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "question_index,question,ground_truth,selected_option,selected_response,is_correct,comments,timestamp"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0,Q1,R1,A,R1,True,,2026-10-18T09:30:00.000000"
        );
        assert!(lines.next().unwrap().starts_with("1,Q2,R2,B,R1,False,"));
    }

    #[test]
    fn test_persist_overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("run.csv"));

        store
            .persist(&[record(0, "A", "R1", true), record(1, "A", "R2", true)])
            .unwrap();
        store.persist(&[record(0, "B", "R2", false)]).unwrap();

        let loaded = load_results(store.jsonl_path()).unwrap();
        assert_eq!(loaded, vec![record(0, "B", "R2", false)]);

        let csv = fs::read_to_string(store.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_round_trip_through_jsonl() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("run.csv"));

        let mut tricky = record(0, "A", "line one\nline \"two\", three", true);
        tricky.comment = "ünïcode, commas and \"quotes\"".to_string();
        let results = vec![tricky, record(1, "B", "R1", false)];

        store.persist(&results).unwrap();
        assert_eq!(load_results(store.jsonl_path()).unwrap(), results);
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_jsonl_uses_artifact_field_names() {
        let line = encode_jsonl(&[record(0, "A", "R1", true)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        for key in CSV_HEADER {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_persist_fails_when_directory_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = ResultStore::new(blocker.join("run.csv"));
        let err = store.persist(&[record(0, "A", "R1", true)]).unwrap_err();
        assert!(matches!(err, EvalError::Io { .. }));
    }

    #[test]
    fn test_partial_write_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("run.csv"));
        // A directory squatting on the JSONL path makes only the second write fail.
        fs::create_dir(store.jsonl_path()).unwrap();

        let err = store.persist(&[record(0, "A", "R1", true)]).unwrap_err();
        match err {
            EvalError::PartialWrite { written, failed, .. } => {
                assert_eq!(written, store.csv_path());
                assert_eq!(failed, store.jsonl_path());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.csv_path().exists());
    }

    #[test]
    fn test_load_results_reports_bad_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{\"question_index\": 0}\n").unwrap();

        let err = load_results(&path).unwrap_err();
        assert!(matches!(err, EvalError::MalformedRecord { line: 1, .. }));
    }

    #[test]
    fn test_list_sessions() {
        let dir = TempDir::new().unwrap();
        let later = ResultStore::new(dir.path().join("bob_20261019_080000.csv"));
        let earlier = ResultStore::new(dir.path().join("alice_smith_20261018_093005.csv"));
        later.persist(&[]).unwrap();
        earlier.persist(&[record(0, "A", "R1", true)]).unwrap();
        fs::write(dir.path().join("notes.jsonl"), "").unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();

        let sessions = list_sessions(dir.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].evaluator, "alice_smith");
        assert_eq!(sessions[0].started, started());
        assert_eq!(sessions[1].evaluator, "bob");
    }

    #[test]
    fn test_list_sessions_missing_dir() {
        let sessions = list_sessions(Path::new("/nonexistent/results")).unwrap();
        assert!(sessions.is_empty());
    }
}
