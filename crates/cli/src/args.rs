//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

use reeltag_core::{ExplicitIds, Mode, Overrides};

/// Convert and tag movie and TV episode files
#[derive(Parser, Debug)]
#[command(name = "reeltag")]
#[command(version)]
pub struct Args {
    /// File or directory to process. Asked for when missing.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Alternate configuration file
    #[arg(short, long, env = "REELTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never prompt; accept guessed identifications or leave files untagged
    #[arg(short, long)]
    pub auto: bool,

    /// TVDB series ID
    #[arg(long = "tvdbid", visible_alias = "tv")]
    pub tvdb_id: Option<u32>,

    /// Season number
    #[arg(short, long)]
    pub season: Option<u32>,

    /// Episode number
    #[arg(short, long)]
    pub episode: Option<u32>,

    /// IMDB ID of a movie
    #[arg(long = "imdbid", visible_alias = "imdb")]
    pub imdb_id: Option<String>,

    /// TMDB ID of a movie
    #[arg(long = "tmdbid", visible_alias = "tmdb")]
    pub tmdb_id: Option<u32>,

    /// Disable the output directory and move-to destination
    #[arg(long = "nomove")]
    pub no_move: bool,

    /// Disable copy-to destinations
    #[arg(long = "nocopy")]
    pub no_copy: bool,

    /// Keep original files
    #[arg(long = "nodelete")]
    pub no_delete: bool,

    /// Disable tagging
    #[arg(long = "notag")]
    pub no_tag: bool,

    /// Disable post-processing scripts
    #[arg(long = "nopost")]
    pub no_post: bool,

    /// Recreate sub-directories of the input under each destination
    #[arg(long = "preserve-relative", visible_alias = "preserveRelative")]
    pub preserve_relative: bool,

    /// Reprocess files already in the output format
    #[arg(long = "convertmp4")]
    pub convert_mp4: bool,

    /// Override the move-to destination
    #[arg(short = 'm', long = "moveto")]
    pub move_to: Option<PathBuf>,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.auto {
            Mode::Silent
        } else {
            Mode::Interactive
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            no_move: self.no_move,
            move_to: self.move_to.clone(),
            no_copy: self.no_copy,
            no_delete: self.no_delete,
            no_tag: self.no_tag,
            no_post: self.no_post,
            process_same_extension: self.convert_mp4,
        }
    }

    pub fn explicit_ids(&self) -> ExplicitIds {
        ExplicitIds {
            imdb_id: self.imdb_id.as_deref().map(normalize_imdb_id),
            tmdb_id: self.tmdb_id,
            tvdb_id: self.tvdb_id,
            season: self.season,
            episode: self.episode,
        }
    }
}

/// IMDB IDs are accepted with or without their `tt` prefix.
fn normalize_imdb_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("tt") {
        raw.to_string()
    } else {
        format!("tt{}", raw)
    }
}
