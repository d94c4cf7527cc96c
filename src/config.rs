//! Configuration for evaluation sessions.
//!
//! Supports both environment variables and a YAML config file.
//! Environment variables take precedence over config file values, and
//! command-line flags (applied by the binary) take precedence over both.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Settings for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// JSONL dataset to evaluate.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Directory receiving result artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Evaluator name, used in result file names.
    #[serde(default = "default_evaluator_name")]
    pub evaluator_name: String,

    /// Show an alternative response next to the ground truth.
    #[serde(default = "default_include_alternative")]
    pub include_alternative: bool,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("eval_dataset.jsonl")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("evaluation_results")
}

fn default_evaluator_name() -> String {
    "Evaluator".to_string()
}

fn default_include_alternative() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            output_dir: default_output_dir(),
            evaluator_name: default_evaluator_name(),
            include_alternative: default_include_alternative(),
        }
    }
}

/// Configuration file structure (YAML format).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    dataset_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    evaluator_name: Option<String>,
    include_alternative: Option<bool>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (EVAL_DATASET_PATH, EVAL_OUTPUT_DIR, EVAL_EVALUATOR,
    ///    EVAL_INCLUDE_ALTERNATIVE)
    /// 2. Config file (~/.config/response-evaluator/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: Option<ConfigFile> = serde_yaml::from_str(content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;
        let file_config = file_config.unwrap_or_default();

        let mut config = Config::default();
        if let Some(dataset_path) = file_config.dataset_path {
            config.dataset_path = dataset_path;
        }
        if let Some(output_dir) = file_config.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(evaluator_name) = file_config.evaluator_name {
            config.evaluator_name = evaluator_name;
        }
        if let Some(include_alternative) = file_config.include_alternative {
            config.include_alternative = include_alternative;
        }

        Ok(config)
    }

    /// Override values from environment-style lookups.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dataset_path) = lookup("EVAL_DATASET_PATH") {
            self.dataset_path = PathBuf::from(dataset_path);
        }

        if let Some(output_dir) = lookup("EVAL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(evaluator_name) = lookup("EVAL_EVALUATOR") {
            self.evaluator_name = evaluator_name;
        }

        if let Some(flag) = lookup("EVAL_INCLUDE_ALTERNATIVE") {
            self.include_alternative = parse_bool(&flag).ok_or_else(|| {
                EvalError::Config(format!(
                    "EVAL_INCLUDE_ALTERNATIVE must be true or false, got '{}'",
                    flag
                ))
            })?;
        }

        Ok(())
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "response-evaluator")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate values before starting a session.
    pub fn validate(&self) -> Result<()> {
        let name = self.evaluator_name.trim();
        if name.is_empty() {
            return Err(EvalError::Config(
                "Evaluator name is required. Set EVAL_EVALUATOR or pass --evaluator.".to_string(),
            ));
        }

        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(EvalError::Config(format!(
                "Evaluator name '{}' cannot be used in a file name",
                self.evaluator_name
            )));
        }

        if self.dataset_path.as_os_str().is_empty() {
            return Err(EvalError::Config("Dataset path is required.".to_string()));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
