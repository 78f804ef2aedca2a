//! Identification of media files.
//!
//! A filename is parsed into a [`RawGuess`], matched against TMDB or TheTVDB
//! and, in interactive mode, confirmed or replaced by the operator.

mod guesser;
mod matcher;
mod prompt;
mod resolver;
mod types;

pub use guesser::{FilenameGuesser, FilenameParser, GuessError, HeuristicParser};
pub use matcher::{normalize_title, select_first_match, CandidateMatcher, MOVIE_SEARCH_LIMIT};
pub use prompt::{
    ask_choice, ask_number, ask_value, ask_yes_no, clean_value, ManualChoice, PromptError,
    Prompter, ScriptedPrompter, StdinPrompter, MAX_PROMPT_ATTEMPTS,
};
pub use resolver::{Mode, ResolveRequest, Resolver};
pub use types::{EpisodeNumber, ExplicitIds, Identification, MatchOutcome, MediaKind, RawGuess};
