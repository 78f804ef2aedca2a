//! Placer module for replicating finished files to library folders.
//!
//! A file is copied into every `copy_to` directory and then moved into
//! `move_to`. Moves use a rename when possible and fall back to copy and
//! delete across filesystems.
//!
//! # Example
//!
//! ```ignore
//! use reeltag_core::placer::{FsPlacer, Placer, PlacerConfig};
//!
//! let placer = FsPlacer::new(PlacerConfig::default().with_move_to("/library/tv".into()));
//! let paths = placer.replicate(Path::new("/tmp/Show - S01E01 - Pilot.mp4"), None).await?;
//! ```

mod config;
mod error;
mod fs_placer;
mod traits;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::FsPlacer;
pub use traits::Placer;
