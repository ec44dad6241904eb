//! Line input for terminal prompts.
//!
//! Prompts and the simulated system dialog share one [`Console`], so answers
//! are read in the order the questions are shown.

use crate::error::CliError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A source of answer lines.
pub trait LineReader {
    /// Read one line. `None` means the input is closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, CliError>;
}

/// Reads lines from the terminal through rustyline.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self, CliError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl+C and Ctrl+D both close the current question
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Answers from a fixed list, for scripted runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    lines: VecDeque<String>,
}

impl ScriptedReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, CliError> {
        Ok(self.lines.pop_front())
    }
}

/// Shared handle to the line reader.
///
/// Prompts block the negotiation's thread, so the handle is single-threaded.
#[derive(Clone)]
pub struct Console {
    reader: Rc<RefCell<Box<dyn LineReader>>>,
}

impl Console {
    pub fn new(reader: impl LineReader + 'static) -> Self {
        Self {
            reader: Rc::new(RefCell::new(Box::new(reader))),
        }
    }

    /// Ask until one of `choices` is typed.
    ///
    /// Each choice is a list of accepted spellings; the index of the matched
    /// choice is returned. Empty lines are skipped. `None` means the input
    /// closed before a valid answer.
    pub fn choose(&self, prompt: &str, choices: &[&[&str]]) -> Result<Option<usize>, CliError> {
        let mut reader = self.reader.borrow_mut();
        loop {
            let Some(line) = reader.read_line(prompt)? else {
                return Ok(None);
            };
            let answer = line.trim().to_lowercase();
            if answer.is_empty() {
                continue;
            }
            if let Some(index) = choices.iter().position(|c| c.contains(&answer.as_str())) {
                return Ok(Some(index));
            }
            let valid: Vec<&str> = choices.iter().filter_map(|c| c.first().copied()).collect();
            println!("\x1b[31mInvalid choice. Use {}\x1b[0m", valid.join("/"));
        }
    }

    /// Ask a yes/no question. A closed input answers no.
    pub fn confirm(&self, prompt: &str) -> Result<bool, CliError> {
        let choice = self.choose(prompt, &[&["y", "yes"], &["n", "no"]])?;
        Ok(choice == Some(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_yes_and_no() {
        let console = Console::new(ScriptedReader::new(["y", "NO"]));
        assert!(console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
    }

    #[test]
    fn test_confirm_skips_blank_and_invalid_lines() {
        let console = Console::new(ScriptedReader::new(["", "maybe", " yes "]));
        assert!(console.confirm("? ").unwrap());
    }

    #[test]
    fn test_closed_input_declines() {
        let console = Console::new(ScriptedReader::default());
        assert!(!console.confirm("? ").unwrap());
        assert_eq!(console.choose("? ", &[&["a"]]).unwrap(), None);
    }

    #[test]
    fn test_choose_returns_index() {
        let console = Console::new(ScriptedReader::new(["never"]));
        let choice = console
            .choose("? ", &[&["a", "allow"], &["d", "deny"], &["n", "never"]])
            .unwrap();
        assert_eq!(choice, Some(2));
    }
}
