//! Line-oriented terminal front end for a [`SessionState`].
//!
//! Reads one command per line. Single letters are reserved for option labels,
//! so every other command is a word or a symbol:
//!
//! | Input            | Action                              |
//! |------------------|-------------------------------------|
//! | `A`, `b`, ...    | select that option                  |
//! | `comment <text>` | set the comment (`# <text>` also)   |
//! | `next`, `>`      | record and move to the next question |
//! | `prev`, `<`      | go back without recording           |
//! | `save`           | record and write all results        |
//! | `help`, `?`      | list commands                       |
//! | `quit`           | leave                               |

use crate::error::{ErrorKind, EvalError};
use crate::session::{ResultSummary, SessionState};
use std::io::{self, BufRead, Write};

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(String),
    Comment(String),
    Next,
    Previous,
    Save,
    Help,
    Quit,
}

impl Command {
    /// Parse a line of input. Returns `None` for blank or unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(text) = line.strip_prefix('#') {
            return Some(Command::Comment(text.trim().to_string()));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => None,
            "comment" => Some(Command::Comment(rest.to_string())),
            "next" | ">" if rest.is_empty() => Some(Command::Next),
            "prev" | "previous" | "<" if rest.is_empty() => Some(Command::Previous),
            "save" if rest.is_empty() => Some(Command::Save),
            "help" | "?" if rest.is_empty() => Some(Command::Help),
            "quit" | "exit" if rest.is_empty() => Some(Command::Quit),
            w if rest.is_empty() && w.len() == 1 && w.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(Command::Select(w.to_ascii_uppercase()))
            }
            _ => None,
        }
    }
}

const HELP: &str = "Commands: <letter> select option | comment <text> | next | prev | save | help | quit";

/// Drive `session` from `input` until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    session: &mut SessionState,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    if session.current_index().is_none() {
        writeln!(output, "No data loaded or empty dataset.")?;
        return Ok(());
    }

    let mut line = String::new();

    render(session, &mut output)?;
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let Some(command) = Command::parse(&line) else {
            if !line.trim().is_empty() {
                writeln!(output, "Unknown command. {}", HELP)?;
            }
            continue;
        };

        match command {
            Command::Select(label) => {
                if session.select(&label) {
                    render(session, &mut output)?;
                } else {
                    writeln!(output, "There is no option {} for this question.", label)?;
                }
            }
            Command::Comment(text) => {
                session.set_comment(text);
                writeln!(output, "Comment updated.")?;
            }
            Command::Next => match session.advance() {
                Ok(_) => render(session, &mut output)?,
                Err(e) => report(&e, "proceeding", &mut output)?,
            },
            Command::Previous => match session.retreat() {
                Ok(()) => render(session, &mut output)?,
                Err(e) => report(&e, "going back", &mut output)?,
            },
            Command::Save => match session.save_and_finish() {
                Ok(artifacts) => {
                    writeln!(output, "Evaluation saved!")?;
                    writeln!(output, "Results saved to: {}", artifacts.csv_path.display())?;
                    write_summary(&session.summary(), &mut output)?;
                }
                Err(e) => report(&e, "saving", &mut output)?,
            },
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Quit => break,
        }
    }

    let unsaved = session.unsaved();
    if unsaved > 0 {
        writeln!(
            output,
            "Warning: {} recorded answer(s) were not saved. Use 'save' before quitting.",
            unsaved
        )?;
    }

    Ok(())
}

fn render<W: Write>(session: &SessionState, output: &mut W) -> io::Result<()> {
    let Some(record) = session.current_record() else {
        return Ok(());
    };
    let progress = session.progress();
    let selected = session.selection().selected_label.as_deref();

    writeln!(output)?;
    writeln!(output, "Question {} of {}", progress.current, progress.total)?;
    writeln!(output, "{}", "─".repeat(60))?;
    writeln!(output, "{}", record.input)?;
    writeln!(output)?;
    writeln!(output, "Select the best answer:")?;

    for option in session.current_options() {
        let marker = if selected == Some(option.label.as_str()) {
            "[x]"
        } else {
            "[ ]"
        };
        writeln!(output, "{} Option {}: {}", marker, option.label, option.response)?;
    }

    if let Some(index) = session.current_index() {
        if let Some(result) = session.result_for(index) {
            writeln!(output, "(already recorded: option {})", result.selected_label)?;
        }
    }

    let comment = &session.selection().comment;
    if !comment.is_empty() {
        writeln!(output, "Comment: {}", comment)?;
    }

    Ok(())
}

fn report<W: Write>(err: &EvalError, action: &str, output: &mut W) -> io::Result<()> {
    match err.kind() {
        ErrorKind::Validation => {
            writeln!(output, "Please select an option before {}.", action)
        }
        ErrorKind::Io => writeln!(output, "Save failed, try again: {}", err),
        _ => writeln!(output, "{}", err),
    }
}

fn write_summary<W: Write>(summary: &ResultSummary, output: &mut W) -> io::Result<()> {
    writeln!(output, "Evaluation Summary")?;
    writeln!(output, "  Total questions evaluated: {}", summary.total)?;
    if let Some(accuracy) = summary.accuracy() {
        writeln!(
            output,
            "  Correct selections: {} ({:.1}%)",
            summary.correct,
            accuracy * 100.0
        )?;
    }
    Ok(())
}
