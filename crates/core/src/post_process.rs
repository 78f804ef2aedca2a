//! Post-processing scripts.
//!
//! Every executable in the scripts directory runs once per finished file,
//! in name order, with the file list and identification passed through the
//! environment:
//!
//! | Variable     | Value                                  |
//! |--------------|----------------------------------------|
//! | `MH_FILES`   | JSON array of the file's final paths   |
//! | `MH_TVDBID`  | series ID (TV)                         |
//! | `MH_SEASON`  | season number (TV)                     |
//! | `MH_EPISODE` | episode number (TV)                    |
//! | `MH_IMDBID`  | IMDB ID (movie identified by IMDB)     |
//! | `MH_TMDBID`  | TMDB ID (movie identified by TMDB)     |

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::identify::Identification;

#[derive(Debug, Error)]
pub enum PostProcessError {
    #[error("Failed to read scripts directory {path}: {source}")]
    ScriptsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode file list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What happened when the scripts ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcessReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Runs post-processing for a finished file.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn run(
        &self,
        files: &[PathBuf],
        identification: &Identification,
    ) -> Result<PostProcessReport, PostProcessError>;
}

/// Environment passed to every script.
pub fn script_env(
    files: &[PathBuf],
    identification: &Identification,
) -> Result<Vec<(String, String)>, PostProcessError> {
    let mut env = vec![("MH_FILES".to_string(), serde_json::to_string(files)?)];
    match identification {
        Identification::TvEpisode {
            tvdb_id,
            season,
            episode,
        } => {
            env.push(("MH_TVDBID".to_string(), tvdb_id.to_string()));
            env.push(("MH_SEASON".to_string(), season.to_string()));
            env.push(("MH_EPISODE".to_string(), episode.to_string()));
        }
        Identification::MovieByImdbId { imdb_id } => {
            env.push(("MH_IMDBID".to_string(), imdb_id.clone()));
        }
        Identification::MovieByTmdbId { tmdb_id } => {
            env.push(("MH_TMDBID".to_string(), tmdb_id.to_string()));
        }
        Identification::Skip | Identification::Untagged => {}
    }
    Ok(env)
}

/// [`PostProcessor`] that runs the executables in a directory.
pub struct ScriptPostProcessor {
    scripts_dir: PathBuf,
}

impl ScriptPostProcessor {
    pub fn new(scripts_dir: PathBuf) -> Self {
        Self { scripts_dir }
    }

    /// Executables in the scripts directory, sorted by name.
    pub fn scripts(&self) -> Result<Vec<PathBuf>, PostProcessError> {
        if !self.scripts_dir.is_dir() {
            debug!(dir = %self.scripts_dir.display(), "No scripts directory");
            return Ok(Vec::new());
        }

        let entries =
            std::fs::read_dir(&self.scripts_dir).map_err(|e| PostProcessError::ScriptsDir {
                path: self.scripts_dir.clone(),
                source: e,
            })?;

        let mut scripts: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_executable(path))
            .collect();
        scripts.sort();
        Ok(scripts)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[async_trait]
impl PostProcessor for ScriptPostProcessor {
    async fn run(
        &self,
        files: &[PathBuf],
        identification: &Identification,
    ) -> Result<PostProcessReport, PostProcessError> {
        let env = script_env(files, identification)?;
        let mut report = PostProcessReport::default();

        for script in self.scripts()? {
            info!(script = %script.display(), "Running post-processing script");
            let result = Command::new(&script)
                .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .output()
                .await;

            match result {
                Ok(output) if output.status.success() => {
                    debug!(
                        script = %script.display(),
                        stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                        "Script finished"
                    );
                    report.succeeded.push(script);
                }
                Ok(output) => {
                    warn!(
                        script = %script.display(),
                        code = ?output.status.code(),
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "Script failed"
                    );
                    report.failed.push(script);
                }
                Err(e) => {
                    warn!(script = %script.display(), error = %e, "Could not start script");
                    report.failed.push(script);
                }
            }
        }

        Ok(report)
    }
}
