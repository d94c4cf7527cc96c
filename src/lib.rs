//! Response Evaluator - a human-in-the-loop annotation tool for AI responses.
//!
//! An evaluator is shown each question of a dataset together with labeled
//! candidate responses, picks the best one, optionally leaves a comment, and
//! the choices are saved as a resumable result log.
//!
//! # Quick Start
//!
//! ```no_run
//! use response_evaluator::{
//!     dataset::Dataset,
//!     options::OptionGenerator,
//!     persistence::ResultStore,
//!     session::SessionState,
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let dataset = Dataset::load(Path::new("eval_dataset.jsonl"))?;
//!     let store = ResultStore::new("evaluation_results/alice.csv");
//!     let mut session = SessionState::with_dataset(dataset, OptionGenerator::new(true), store);
//!
//!     for option in session.current_options() {
//!         println!("{}: {}", option.label, option.response);
//!     }
//!
//!     session.select("A");
//!     session.set_comment("matches the reference");
//!     session.save_and_finish()?;
//!
//!     println!("accuracy: {:?}", session.accuracy());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Dataset**: ordered, read-only `{input, output}` records loaded from JSONL
//! - **OptionGenerator**: deterministic labeled options per question
//! - **SessionState**: position, pending selection and the result log
//! - **ResultStore**: writes the log as CSV and JSONL, rewriting both on every save
//! - **console**: line-oriented front end used by the `response-eval` binary

pub mod config;
pub mod console;
pub mod dataset;
pub mod error;
pub mod options;
pub mod persistence;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{Dataset, EvaluationRecord};
pub use error::{ErrorKind, EvalError, Result};
pub use options::{AlternativeStrategy, NextRecordAlternative, OptionGenerator, ResponseOption};
pub use persistence::{ResultStore, SavedArtifacts, list_sessions, load_results};
pub use session::{Progress, ResultRecord, ResultSummary, Selection, SessionState};
