//! Operator prompts used in interactive mode.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Prompts give up after this many invalid answers.
pub const MAX_PROMPT_ATTEMPTS: usize = 10;

const YES: [&str; 4] = ["y", "yes", "true", "1"];
const NO: [&str; 4] = ["n", "no", "false", "0"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed")]
    Closed,

    #[error("no valid answer after {0} attempts")]
    AttemptsExhausted(usize),

    #[error("prompt I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Line-oriented conversation with the operator.
pub trait Prompter: Send {
    /// Show a message.
    fn say(&mut self, message: &str);

    /// Show `prompt` and read one line. `None` when input is closed.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Prompter on the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn say(&mut self, message: &str) {
        println!("{}", message);
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Prompter that replays canned answers. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Every message and prompt shown so far.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn say(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Entries of the manual identification menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualChoice {
    ImdbMovie,
    TmdbMovie,
    TvEpisode,
    ConvertOnly,
    Skip,
}

impl ManualChoice {
    fn from_selection(selection: &str) -> Option<Self> {
        match selection.parse::<u8>().ok()? {
            1 => Some(Self::ImdbMovie),
            2 => Some(Self::TmdbMovie),
            3 => Some(Self::TvEpisode),
            4 => Some(Self::ConvertOnly),
            5 => Some(Self::Skip),
            _ => None,
        }
    }
}

const MENU: [&str; 6] = [
    "Select media type:",
    "1. Movie (via IMDB ID)",
    "2. Movie (via TMDB ID)",
    "3. TV",
    "4. Convert without tagging",
    "5. Skip file",
];

/// Trim surrounding spaces and double quotes from an answer. Backslashes
/// are dropped too, except on Windows where they separate path components.
pub fn clean_value(raw: &str) -> String {
    raw.trim_matches([' ', '"'])
        .chars()
        .filter(|c| cfg!(windows) || *c != '\\')
        .collect()
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Ask until `accept` yields a value, up to [`MAX_PROMPT_ATTEMPTS`] times.
fn ask_until<T>(
    prompter: &mut dyn Prompter,
    prompt: &str,
    invalid: &str,
    mut accept: impl FnMut(&str) -> Option<T>,
) -> Result<T, PromptError> {
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        let Some(raw) = prompter.ask(prompt)? else {
            return Err(PromptError::Closed);
        };
        if let Some(value) = accept(&clean_value(&raw)) {
            return Ok(value);
        }
        prompter.say(invalid);
    }
    Err(PromptError::AttemptsExhausted(MAX_PROMPT_ATTEMPTS))
}

/// Ask a yes/no question.
pub fn ask_yes_no(prompter: &mut dyn Prompter) -> Result<bool, PromptError> {
    ask_until(prompter, "# [y/n]: ", "Invalid selection", |answer| {
        let answer = answer.to_lowercase();
        if YES.contains(&answer.as_str()) {
            Some(true)
        } else if NO.contains(&answer.as_str()) {
            Some(false)
        } else {
            None
        }
    })
}

/// Show the manual identification menu and read a choice.
pub fn ask_choice(prompter: &mut dyn Prompter) -> Result<ManualChoice, PromptError> {
    for line in MENU {
        prompter.say(line);
    }
    ask_until(
        prompter,
        "#: ",
        "Invalid selection",
        ManualChoice::from_selection,
    )
}

/// Ask for a non-empty value. With `numeric`, only digits are accepted.
pub fn ask_value(
    prompter: &mut dyn Prompter,
    prompt: &str,
    numeric: bool,
) -> Result<String, PromptError> {
    prompter.say(&format!("{}:", prompt));
    let invalid = if numeric {
        "Must be a numerical value"
    } else {
        "Value must not be empty"
    };
    ask_until(prompter, "#: ", invalid, |answer| {
        let valid = if numeric {
            is_digits(answer)
        } else {
            !answer.is_empty()
        };
        valid.then(|| answer.to_string())
    })
}

/// Ask for a number.
pub fn ask_number(prompter: &mut dyn Prompter, prompt: &str) -> Result<u32, PromptError> {
    prompter.say(&format!("{}:", prompt));
    ask_until(prompter, "#: ", "Must be a numerical value", |answer| {
        if is_digits(answer) {
            answer.parse().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value(" \"tt1375666\" "), "tt1375666");
        assert_eq!(clean_value("  27205"), "27205");
        #[cfg(not(windows))]
        assert_eq!(clean_value("a\\b"), "ab");
    }

    #[test]
    fn test_yes_no_sets() {
        for answer in ["y", "YES", "True", "1"] {
            let mut p = ScriptedPrompter::new([answer]);
            assert!(ask_yes_no(&mut p).unwrap());
        }
        for answer in ["n", "No", "false", "0"] {
            let mut p = ScriptedPrompter::new([answer]);
            assert!(!ask_yes_no(&mut p).unwrap());
        }
    }

    #[test]
    fn test_yes_no_reprompts() {
        let mut p = ScriptedPrompter::new(["maybe", "", "y"]);
        assert!(ask_yes_no(&mut p).unwrap());
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn test_attempts_are_bounded() {
        let mut p = ScriptedPrompter::new(vec!["x"; MAX_PROMPT_ATTEMPTS + 2]);
        let err = ask_yes_no(&mut p).unwrap_err();
        assert!(matches!(err, PromptError::AttemptsExhausted(MAX_PROMPT_ATTEMPTS)));
        assert_eq!(p.remaining(), 2);
    }

    #[test]
    fn test_closed_input() {
        let mut p = ScriptedPrompter::new(Vec::<String>::new());
        assert!(matches!(ask_choice(&mut p), Err(PromptError::Closed)));
    }

    #[test]
    fn test_choice_range() {
        let mut p = ScriptedPrompter::new(["0", "6", "three", "3"]);
        assert_eq!(ask_choice(&mut p).unwrap(), ManualChoice::TvEpisode);
        assert!(p.transcript().iter().any(|l| l == "5. Skip file"));
    }

    #[test]
    fn test_numeric_value() {
        let mut p = ScriptedPrompter::new(["abc", "12a", "27205"]);
        assert_eq!(ask_number(&mut p, "Enter TMDB ID").unwrap(), 27205);

        let mut p = ScriptedPrompter::new(["", "tt1375666"]);
        assert_eq!(ask_value(&mut p, "Enter IMDB ID", false).unwrap(), "tt1375666");
    }
}
