//! Response Evaluator CLI
//!
//! Presents pairs of candidate responses to a human evaluator and records
//! their choices.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use response_evaluator::{
    config::Config,
    console,
    dataset::Dataset,
    options::OptionGenerator,
    persistence::{ResultStore, list_sessions, load_results},
    session::{ResultSummary, SessionState},
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Response Evaluator - human-in-the-loop comparison of AI responses
#[derive(Parser)]
#[command(name = "response-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive evaluation session
    Run {
        /// Path to the JSONL dataset
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Directory for result files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Evaluator name (part of the result file name)
        #[arg(short, long)]
        evaluator: Option<String>,

        /// Only show the ground truth response
        #[arg(long)]
        no_alternative: bool,

        /// Continue a session from its saved JSONL results
        #[arg(long)]
        resume: Option<PathBuf>,
    },

    /// Show information about a dataset
    Info {
        /// Path to the JSONL dataset
        dataset: PathBuf,

        /// Only show the ground truth response
        #[arg(long)]
        no_alternative: bool,
    },

    /// List saved sessions
    Sessions {
        /// Directory holding result files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Summarize a saved result log
    Summary {
        /// Path to a JSONL results file
        results: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dataset,
            output_dir,
            evaluator,
            no_alternative,
            resume,
        } => cmd_run(dataset, output_dir, evaluator, no_alternative, resume),
        Commands::Info {
            dataset,
            no_alternative,
        } => cmd_info(dataset, no_alternative),
        Commands::Sessions { output_dir } => cmd_sessions(output_dir),
        Commands::Summary { results } => cmd_summary(results),
    }
}

fn cmd_run(
    dataset: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    evaluator: Option<String>,
    no_alternative: bool,
    resume: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dataset) = dataset {
        config.dataset_path = dataset;
    }
    if let Some(output_dir) = output_dir {
        config.output_dir = output_dir;
    }
    if let Some(evaluator) = evaluator {
        config.evaluator_name = evaluator;
    }
    if no_alternative {
        config.include_alternative = false;
    }
    config.validate().context("Invalid configuration")?;

    let data = Dataset::load(&config.dataset_path).context("Failed to load dataset")?;
    let generator = OptionGenerator::new(config.include_alternative);

    let mut session = match resume {
        Some(results_path) => {
            let results = load_results(&results_path).context("Failed to load saved results")?;
            println!(
                "Resuming {} with {} recorded answer(s)",
                results_path.display(),
                results.len()
            );
            SessionState::resume(data, generator, ResultStore::new(results_path), results)
                .context("Saved results do not match the dataset")?
        }
        None => {
            let started = chrono::Local::now().naive_local();
            let store = ResultStore::for_session(
                &config.output_dir,
                config.evaluator_name.trim(),
                started,
            );
            SessionState::with_dataset(data, generator, store)
        }
    };

    println!("Evaluator:  {}", config.evaluator_name);
    println!("Dataset:    {}", config.dataset_path.display());
    println!("Saving to:  {}", session.store().csv_path().display());
    println!("Type 'help' for commands.");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    console::run(&mut session, stdin.lock(), stdout.lock()).context("Console I/O failed")?;

    Ok(())
}

fn cmd_info(dataset_path: PathBuf, no_alternative: bool) -> Result<()> {
    let dataset = Dataset::load(&dataset_path).context("Failed to load dataset")?;
    let generator = OptionGenerator::new(!no_alternative);

    println!("Dataset Information");
    println!("{}", "─".repeat(40));
    println!("  Path:             {}", dataset_path.display());
    println!("  Records:          {}", dataset.len());
    println!("  Distinct outputs: {}", dataset.distinct_outputs());
    println!(
        "  Alternatives:     {}",
        if generator.include_alternative() {
            generator.strategy_name()
        } else {
            "disabled"
        }
    );

    if dataset.distinct_outputs() < dataset.len() && generator.include_alternative() {
        println!("  Note: duplicate outputs mean some alternatives equal the ground truth.");
    }

    if let Some(first) = dataset.get(0) {
        println!();
        println!("First question: {}", first.input);
        for option in generator.options_for(0, &dataset) {
            println!("  Option {}: {}", option.label, option.response);
        }
    }

    Ok(())
}

fn cmd_sessions(output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => Config::load().context("Failed to load configuration")?.output_dir,
    };

    let sessions = list_sessions(&output_dir).context("Failed to list sessions")?;
    if sessions.is_empty() {
        println!("No saved sessions in {}", output_dir.display());
        return Ok(());
    }

    println!(
        "{:<20} {:<20} {:>8}  {}",
        "Evaluator", "Started", "Answers", "Results"
    );
    println!("{}", "─".repeat(72));
    for session in sessions {
        let answers = load_results(&session.jsonl_path)
            .map(|r| r.len().to_string())
            .unwrap_or_else(|_| "?".to_string());
        println!(
            "{:<20} {:<20} {:>8}  {}",
            session.evaluator,
            session.started.format("%Y-%m-%d %H:%M:%S"),
            answers,
            session.jsonl_path.display()
        );
    }

    Ok(())
}

fn cmd_summary(results_path: PathBuf) -> Result<()> {
    let results = load_results(&results_path).context("Failed to load results")?;
    let summary = ResultSummary::from_results(&results);

    let mut by_option: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &results {
        *by_option.entry(r.selected_label.as_str()).or_default() += 1;
    }

    println!("Evaluation Summary");
    println!("{}", "─".repeat(40));
    println!("  Results file:     {}", results_path.display());
    println!("  Total evaluated:  {}", summary.total);
    match summary.accuracy() {
        Some(accuracy) => println!(
            "  Correct:          {} ({:.1}%)",
            summary.correct,
            accuracy * 100.0
        ),
        None => println!("  Correct:          n/a"),
    }
    for (label, count) in by_option {
        println!("  Option {}:         {}", label, count);
    }

    let commented = results.iter().filter(|r| !r.comment.is_empty()).count();
    println!("  With comments:    {}", commented);

    Ok(())
}
