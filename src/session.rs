//! Evaluation session state machine.
//!
//! A [`SessionState`] walks an evaluator through a dataset one question at a
//! time. Moving forward always records the current selection as a
//! [`ResultRecord`] and rewrites the result artifacts; moving backward is pure
//! navigation and drops whatever was selected but not yet recorded. Each
//! question is recorded at most once.

use crate::dataset::{Dataset, EvaluationRecord};
use crate::error::{EvalError, Result};
use crate::options::{OptionGenerator, ResponseOption, find_option};
use crate::persistence::{ResultStore, SavedArtifacts};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Format of [`ResultRecord::timestamp`] (local time, microsecond precision).
pub const RESULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One recorded judgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Zero-based dataset index of the question.
    #[serde(rename = "question_index")]
    pub index: usize,
    /// The question text.
    pub question: String,
    /// The record's own output.
    pub ground_truth: String,
    /// Label of the chosen option.
    #[serde(rename = "selected_option")]
    pub selected_label: String,
    /// Response text of the chosen option.
    pub selected_response: String,
    /// Whether the chosen response equals the ground truth.
    pub is_correct: bool,
    /// Free-text comment, possibly empty.
    #[serde(rename = "comments")]
    pub comment: String,
    /// When the judgement was recorded.
    pub timestamp: String,
}

/// The pending, not yet recorded, choice for the current question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_label: Option<String>,
    pub comment: String,
}

/// Position within the dataset, 1-indexed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Current question number (1-indexed), 0 when nothing is loaded.
    pub current: usize,
    /// Number of questions.
    pub total: usize,
}

impl Progress {
    /// Fraction of the way through the dataset, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Totals over a result log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSummary {
    pub total: usize,
    pub correct: usize,
}

impl ResultSummary {
    /// Tally `results`.
    pub fn from_results(results: &[ResultRecord]) -> Self {
        Self {
            total: results.len(),
            correct: results.iter().filter(|r| r.is_correct).count(),
        }
    }

    /// Share of correct selections, `None` when nothing was recorded.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }
}

/// Navigation, selection and result log for one evaluator.
#[derive(Debug)]
pub struct SessionState {
    dataset: Dataset,
    generator: OptionGenerator,
    store: ResultStore,
    current: Option<usize>,
    selection: Selection,
    results: Vec<ResultRecord>,
    /// Number of leading `results` known to be on disk.
    persisted: usize,
}

impl SessionState {
    /// Create an unloaded session that will save to `store`.
    pub fn new(generator: OptionGenerator, store: ResultStore) -> Self {
        Self {
            dataset: Dataset::default(),
            generator,
            store,
            current: None,
            selection: Selection::default(),
            results: Vec::new(),
            persisted: 0,
        }
    }

    /// Create a session positioned on the first question of `dataset`.
    pub fn with_dataset(dataset: Dataset, generator: OptionGenerator, store: ResultStore) -> Self {
        let mut session = Self::new(generator, store);
        session.reset(dataset);
        session
    }

    /// Restore a session from a previously saved result log.
    ///
    /// The session continues at the first question without a result (or the
    /// last question if all are answered) and keeps saving to `store`.
    pub fn resume(
        dataset: Dataset,
        generator: OptionGenerator,
        store: ResultStore,
        results: Vec<ResultRecord>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for r in &results {
            if r.index >= dataset.len() {
                return Err(EvalError::InvalidResults(format!(
                    "result for question {} but dataset has {} records",
                    r.index,
                    dataset.len()
                )));
            }
            if !seen.insert(r.index) {
                return Err(EvalError::InvalidResults(format!(
                    "question {} recorded more than once",
                    r.index
                )));
            }
        }

        let mut session = Self::with_dataset(dataset, generator, store);
        session.current = (0..session.dataset.len())
            .find(|i| !seen.contains(i))
            .or_else(|| session.dataset.len().checked_sub(1));
        session.persisted = results.len();
        session.results = results;

        info!(
            recorded = session.results.len(),
            position = ?session.current,
            "resumed session"
        );
        Ok(session)
    }

    /// Replace the dataset, clearing position, selection and results.
    pub fn reset(&mut self, dataset: Dataset) {
        self.current = if dataset.is_empty() { None } else { Some(0) };
        self.dataset = dataset;
        self.selection = Selection::default();
        self.results.clear();
        self.persisted = 0;
        debug!(records = self.dataset.len(), "session reset");
    }

    /// Load a dataset from `path` and start over, saving to `store`.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load_dataset(&mut self, path: &Path, store: ResultStore) -> Result<()> {
        let dataset = Dataset::load(path)?;
        self.reset(dataset);
        self.store = store;
        Ok(())
    }

    /// The loaded dataset.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Where results are saved.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Current zero-based index, `None` when no records are loaded.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Record at the current position.
    pub fn current_record(&self) -> Option<&EvaluationRecord> {
        self.current.and_then(|i| self.dataset.get(i))
    }

    /// Options for the current question.
    pub fn current_options(&self) -> Vec<ResponseOption> {
        match self.current {
            Some(index) => self.generator.options_for(index, &self.dataset),
            None => Vec::new(),
        }
    }

    /// The pending selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select the option with `label` on the current question.
    ///
    /// Returns `false` and leaves the selection alone if no such option exists.
    pub fn select(&mut self, label: &str) -> bool {
        let options = self.current_options();
        match find_option(&options, label) {
            Some(option) => {
                self.selection.selected_label = Some(option.label.clone());
                true
            }
            None => {
                debug!(label, "ignoring selection of unknown option");
                false
            }
        }
    }

    /// Set the comment for the current question.
    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.selection.comment = text.into();
    }

    /// Record the current selection.
    ///
    /// If the current question already has a result, nothing is appended and
    /// the existing record is returned. Position and selection are unchanged.
    pub fn commit(&mut self) -> Result<ResultRecord> {
        let index = self.current.ok_or(EvalError::NoDataset)?;
        let label = self
            .selection
            .selected_label
            .as_deref()
            .ok_or(EvalError::NoSelectionMade { index })?;

        if let Some(existing) = self.result_for(index) {
            warn!(index, "question already recorded, keeping first result");
            return Ok(existing.clone());
        }

        let record = self.current_record().ok_or(EvalError::NoDataset)?;
        let options = self.current_options();
        let option = find_option(&options, label).ok_or(EvalError::NoSelectionMade { index })?;

        let result = ResultRecord {
            index,
            question: record.input.clone(),
            ground_truth: record.output.clone(),
            selected_label: option.label.clone(),
            selected_response: option.response.clone(),
            is_correct: option.response == record.output,
            comment: self.selection.comment.clone(),
            timestamp: chrono::Local::now()
                .format(RESULT_TIMESTAMP_FORMAT)
                .to_string(),
        };

        debug!(index, label = %result.selected_label, correct = result.is_correct, "committed");
        self.results.push(result.clone());
        Ok(result)
    }

    /// Record the current selection, save all results and move to the next
    /// question.
    ///
    /// If the save fails the record stays in memory and the position does not
    /// change, so calling this again retries the save.
    pub fn advance(&mut self) -> Result<ResultRecord> {
        let index = self.current.ok_or(EvalError::NoDataset)?;
        if index + 1 >= self.dataset.len() {
            return Err(EvalError::AtLast { index });
        }

        let result = self.commit()?;
        self.persist()?;
        self.selection = Selection::default();
        self.current = Some(index + 1);
        Ok(result)
    }

    /// Move to the previous question without recording anything.
    pub fn retreat(&mut self) -> Result<()> {
        let index = self.current.ok_or(EvalError::NoDataset)?;
        if index == 0 {
            return Err(EvalError::AtFirst);
        }

        if self.selection.selected_label.is_some() {
            debug!(index, "discarding unsaved selection");
        }
        self.selection = Selection::default();
        self.current = Some(index - 1);
        Ok(())
    }

    /// Record the current selection and write all results to the store.
    ///
    /// Does not move. When the write fails the results stay in memory, so
    /// calling this again retries the save.
    pub fn save_and_finish(&mut self) -> Result<SavedArtifacts> {
        self.commit()?;
        self.persist()
    }

    fn persist(&mut self) -> Result<SavedArtifacts> {
        let artifacts = self.store.persist(&self.results)?;
        self.persisted = artifacts.records;
        Ok(artifacts)
    }

    /// Number of recorded results not yet written to the store.
    pub fn unsaved(&self) -> usize {
        self.results.len().saturating_sub(self.persisted)
    }

    /// Recorded results in commit order.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// Result recorded for `index`, if any.
    pub fn result_for(&self, index: usize) -> Option<&ResultRecord> {
        self.results.iter().find(|r| r.index == index)
    }

    /// Whether `index` already has a result.
    pub fn is_committed(&self, index: usize) -> bool {
        self.result_for(index).is_some()
    }

    /// True on the last question once it has been recorded.
    pub fn is_finished(&self) -> bool {
        match self.current {
            Some(index) => index + 1 == self.dataset.len() && self.is_committed(index),
            None => false,
        }
    }

    /// Totals over the recorded results.
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    /// Share of correct selections, `None` before anything is recorded.
    pub fn accuracy(&self) -> Option<f64> {
        self.summary().accuracy()
    }

    /// Position for display.
    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current.map_or(0, |i| i + 1),
            total: self.dataset.len(),
        }
    }
}
