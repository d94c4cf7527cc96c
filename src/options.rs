//! Option generation for comparison tasks.
//!
//! Every question shows the record's own output as option `A` (the ground
//! truth candidate), followed by zero or more alternatives produced by an
//! [`AlternativeStrategy`]. Labels are assigned in generation order and never
//! shuffled, so revisiting a question reproduces the exact same options.

use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest number of options a single question can carry (`A` through `Z`).
pub const MAX_OPTIONS: usize = 26;

/// A labeled candidate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    /// Single uppercase letter, `A` first.
    pub label: String,
    /// The candidate response text.
    pub response: String,
}

impl ResponseOption {
    /// Create a new option.
    pub fn new(label: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            response: response.into(),
        }
    }
}

/// Label for the option at `position` (0 -> `A`, 1 -> `B`, ...).
pub fn option_label(position: usize) -> Option<String> {
    if position >= MAX_OPTIONS {
        return None;
    }
    let letter = (b'A' + position as u8) as char;
    Some(letter.to_string())
}

/// Find the option labeled exactly `label`.
pub fn find_option<'a>(options: &'a [ResponseOption], label: &str) -> Option<&'a ResponseOption> {
    options.iter().find(|o| o.label == label)
}

/// Source of comparison responses for a question.
///
/// Implementations must be deterministic: the same index and dataset must
/// always yield the same alternatives in the same order.
pub trait AlternativeStrategy {
    /// Short name shown in logs and `info` output.
    fn name(&self) -> &str;

    /// Alternative responses for the record at `index`.
    fn alternatives(&self, index: usize, dataset: &Dataset) -> Vec<String>;
}

/// Uses the next record's output as the single alternative, wrapping from the
/// last record to the first.
///
/// This is a placeholder, not a curated distractor. If the dataset contains
/// duplicate outputs the alternative can be identical to the ground truth.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextRecordAlternative;

impl AlternativeStrategy for NextRecordAlternative {
    fn name(&self) -> &str {
        "next-record"
    }

    fn alternatives(&self, index: usize, dataset: &Dataset) -> Vec<String> {
        if dataset.len() < 2 {
            return Vec::new();
        }
        let alt_index = (index + 1) % dataset.len();
        dataset
            .get(alt_index)
            .map(|r| vec![r.output.clone()])
            .unwrap_or_default()
    }
}

/// Derives the ordered option list for each question.
pub struct OptionGenerator {
    include_alternative: bool,
    strategy: Box<dyn AlternativeStrategy>,
}

impl OptionGenerator {
    /// Create a generator using [`NextRecordAlternative`].
    pub fn new(include_alternative: bool) -> Self {
        Self::with_strategy(include_alternative, NextRecordAlternative)
    }

    /// Create a generator with a custom alternative strategy.
    pub fn with_strategy(
        include_alternative: bool,
        strategy: impl AlternativeStrategy + 'static,
    ) -> Self {
        Self {
            include_alternative,
            strategy: Box::new(strategy),
        }
    }

    /// Whether alternatives are generated at all.
    pub fn include_alternative(&self) -> bool {
        self.include_alternative
    }

    /// Name of the alternative strategy in use.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Options for the record at `index`.
    ///
    /// Returns an empty list when `index` is out of range. Otherwise option `A`
    /// is always the record's own output, followed by the strategy's
    /// alternatives when enabled.
    pub fn options_for(&self, index: usize, dataset: &Dataset) -> Vec<ResponseOption> {
        let Some(record) = dataset.get(index) else {
            return Vec::new();
        };

        let mut responses = vec![record.output.clone()];
        if self.include_alternative {
            responses.extend(self.strategy.alternatives(index, dataset));
        }

        responses
            .into_iter()
            .enumerate()
            .map_while(|(position, response)| {
                option_label(position).map(|label| ResponseOption { label, response })
            })
            .collect()
    }
}

impl Default for OptionGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for OptionGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionGenerator")
            .field("include_alternative", &self.include_alternative)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EvaluationRecord;

    fn sample(n: usize) -> Dataset {
        Dataset::new(
            (1..=n)
                .map(|i| EvaluationRecord::new(format!("Q{i}"), format!("R{i}")))
                .collect(),
        )
    }

    #[test]
    fn test_two_options_with_alternative() {
        let dataset = sample(3);
        let generator = OptionGenerator::new(true);

        for index in 0..dataset.len() {
            let options = generator.options_for(index, &dataset);
            assert_eq!(options.len(), 2);
            assert_eq!(options[0].label, "A");
            assert_eq!(options[1].label, "B");
            assert_eq!(options[0].response, dataset.get(index).unwrap().output);
        }
    }

    #[test]
    fn test_alternative_wraps_around() {
        let dataset = sample(3);
        let generator = OptionGenerator::new(true);

        let options = generator.options_for(2, &dataset);
        assert_eq!(options[1].response, "R1");
    }

    #[test]
    fn test_single_option_without_alternative() {
        let dataset = sample(3);
        let generator = OptionGenerator::new(false);

        let options = generator.options_for(1, &dataset);
        assert_eq!(options, vec![ResponseOption::new("A", "R2")]);
    }

    #[test]
    fn test_single_record_dataset() {
        let dataset = sample(1);
        let generator = OptionGenerator::new(true);

        let options = generator.options_for(0, &dataset);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "A");
    }

    #[test]
    fn test_out_of_range_index() {
        let generator = OptionGenerator::default();
        assert!(generator.options_for(5, &sample(2)).is_empty());
        assert!(generator.options_for(0, &Dataset::default()).is_empty());
    }

    #[test]
    fn test_options_are_stable_across_calls() {
        let dataset = sample(4);
        let generator = OptionGenerator::new(true);
        assert_eq!(
            generator.options_for(1, &dataset),
            generator.options_for(1, &dataset)
        );
    }

    struct EveryOther;

    impl AlternativeStrategy for EveryOther {
        fn name(&self) -> &str {
            "every-other"
        }

        fn alternatives(&self, index: usize, dataset: &Dataset) -> Vec<String> {
            dataset
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, r)| r.output.clone())
                .collect()
        }
    }

    #[test]
    fn test_custom_strategy_labels_in_order() {
        let dataset = sample(4);
        let generator = OptionGenerator::with_strategy(true, EveryOther);

        let labels: Vec<_> = generator
            .options_for(0, &dataset)
            .into_iter()
            .map(|o| o.label)
            .collect();
        assert_eq!(labels, vec!["A", "B", "C", "D"]);
        assert_eq!(generator.strategy_name(), "every-other");
    }

    #[test]
    fn test_labels_stop_at_z() {
        let dataset = sample(30);
        let generator = OptionGenerator::with_strategy(true, EveryOther);

        let options = generator.options_for(0, &dataset);
        assert_eq!(options.len(), MAX_OPTIONS);
        assert_eq!(options.last().unwrap().label, "Z");
    }

    #[test]
    fn test_find_option_exact_label() {
        let options = vec![ResponseOption::new("A", "x"), ResponseOption::new("B", "y")];
        assert_eq!(find_option(&options, "B").unwrap().response, "y");
        assert!(find_option(&options, "b").is_none());
        assert!(find_option(&options, "C").is_none());
    }
}
