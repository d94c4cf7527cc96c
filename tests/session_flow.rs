use response_evaluator::{
    Dataset, EvalError, OptionGenerator, ResponseOption, ResultStore, SessionState, list_sessions,
    load_results,
};
use std::fs;
use tempfile::TempDir;

fn write_dataset(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("eval_dataset.jsonl");
    fs::write(
        &path,
        "{\"input\": \"Q1\", \"output\": \"R1\"}\n{\"input\": \"Q2\", \"output\": \"R2\"}\n",
    )
    .unwrap();
    path
}

#[test]
fn two_question_walkthrough() {
    let dir = TempDir::new().unwrap();
    let dataset = Dataset::load(&write_dataset(&dir)).unwrap();
    let store = ResultStore::new(dir.path().join("results/alice_20261018_093005.csv"));
    let mut session = SessionState::with_dataset(dataset, OptionGenerator::new(true), store);

    assert_eq!(
        session.current_options(),
        vec![ResponseOption::new("A", "R1"), ResponseOption::new("B", "R2")]
    );
    assert!(session.select("A"));
    let first = session.advance().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.selected_label, "A");
    assert!(first.is_correct);
    assert_eq!(session.current_index(), Some(1));

    assert_eq!(
        session.current_options(),
        vec![ResponseOption::new("A", "R2"), ResponseOption::new("B", "R1")]
    );
    assert!(session.select("B"));
    let saved = session.save_and_finish().unwrap();

    let results = session.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], first);
    assert_eq!(results[1].index, 1);
    assert_eq!(results[1].selected_label, "B");
    assert_eq!(results[1].selected_response, "R1");
    assert!(!results[1].is_correct);
    assert_eq!(session.accuracy(), Some(0.5));

    // The JSONL artifact reads back field for field.
    assert_eq!(load_results(&saved.jsonl_path).unwrap(), results);

    let csv = fs::read_to_string(&saved.csv_path).unwrap();
    assert_eq!(csv.lines().count(), 3);

    let sessions = list_sessions(&dir.path().join("results")).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].evaluator, "alice");
}

#[test]
fn resume_after_restart() {
    let dir = TempDir::new().unwrap();
    let dataset_path = write_dataset(&dir);
    let store = ResultStore::new(dir.path().join("results/bob_20261018_100000.csv"));

    let mut session = SessionState::with_dataset(
        Dataset::load(&dataset_path).unwrap(),
        OptionGenerator::new(true),
        store.clone(),
    );
    session.select("B");
    session.save_and_finish().unwrap();

    let restored = load_results(store.jsonl_path()).unwrap();
    let mut resumed = SessionState::resume(
        Dataset::load(&dataset_path).unwrap(),
        OptionGenerator::new(true),
        ResultStore::new(store.jsonl_path()),
        restored,
    )
    .unwrap();

    assert_eq!(resumed.current_index(), Some(1));
    assert!(matches!(
        resumed.save_and_finish(),
        Err(EvalError::NoSelectionMade { index: 1 })
    ));

    resumed.select("A");
    let saved = resumed.save_and_finish().unwrap();
    assert_eq!(saved.csv_path, store.csv_path());
    assert_eq!(load_results(store.jsonl_path()).unwrap().len(), 2);
}

#[test]
fn alternatives_disabled() {
    let dir = TempDir::new().unwrap();
    let mut session = SessionState::with_dataset(
        Dataset::load(&write_dataset(&dir)).unwrap(),
        OptionGenerator::new(false),
        ResultStore::new(dir.path().join("r.csv")),
    );

    assert_eq!(session.current_options().len(), 1);
    assert!(!session.select("B"));
    assert!(matches!(
        session.advance(),
        Err(EvalError::NoSelectionMade { index: 0 })
    ));
}
