//! Container tag store: atom-level access to a file's `ilst`.

use lofty::config::{ParseOptions, WriteOptions};
use lofty::error::{ErrorKind, LoftyError};
use lofty::file::AudioFile;
use lofty::mp4::{Atom, AtomData, AtomIdent, Ilst, Mp4File};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::TagExt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::types::{key_name, ImageFormat, TagAtom, TagSet, TagValue};
use crate::converter::{extension_of, is_tag_eligible};

/// Errors from a [`TagStore`].
#[derive(Debug, Error)]
pub enum TagStoreError {
    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file or the tag data is malformed.
    #[error("Malformed container or tag: {0}")]
    Format(String),

    /// The file is not a container this store can tag.
    #[error("Unsupported file: {0}")]
    Unsupported(String),
}

impl TagStoreError {
    /// Only I/O faults are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Atom-level tag access on a single file.
pub trait TagStore: Send + Sync {
    /// Number of atoms currently in the file's tag.
    fn read(&self, path: &Path) -> Result<usize, TagStoreError>;

    /// Remove the file's tag entirely.
    fn delete_all(&self, path: &Path) -> Result<(), TagStoreError>;

    /// Write `tags` as the file's tag, replacing what was there.
    fn save(&self, path: &Path, tags: &TagSet) -> Result<(), TagStoreError>;
}

/// [`TagStore`] for MP4 containers, backed by lofty.
#[derive(Debug, Clone, Default)]
pub struct LoftyTagStore;

impl LoftyTagStore {
    pub fn new() -> Self {
        Self
    }

    fn check_container(path: &Path) -> Result<(), TagStoreError> {
        if is_tag_eligible(&extension_of(path)) {
            Ok(())
        } else {
            Err(TagStoreError::Unsupported(path.display().to_string()))
        }
    }

    fn to_atom(atom: &TagAtom) -> Atom<'static> {
        let data = match &atom.value {
            TagValue::Text(s) => AtomData::UTF8(s.clone()),
            TagValue::Integer(n) => AtomData::SignedInteger(*n),
            // Well-known type 21: big-endian signed integer
            TagValue::Byte(b) => AtomData::Unknown {
                code: 21,
                data: vec![*b],
            },
            TagValue::Disk(n) => {
                let [hi, lo] = n.to_be_bytes();
                AtomData::Unknown {
                    code: 0,
                    data: vec![0, 0, hi, lo, 0, 0],
                }
            }
            TagValue::Cover(bytes, format) => {
                let mime = match format {
                    ImageFormat::Jpeg => MimeType::Jpeg,
                    ImageFormat::Png => MimeType::Png,
                };
                AtomData::Picture(Picture::new_unchecked(
                    PictureType::CoverFront,
                    Some(mime),
                    None,
                    bytes.clone(),
                ))
            }
        };
        Atom::new(AtomIdent::Fourcc(atom.key), data)
    }
}

fn map_lofty(err: LoftyError) -> TagStoreError {
    match err.kind() {
        ErrorKind::Io(io) => TagStoreError::Io(std::io::Error::new(io.kind(), err.to_string())),
        ErrorKind::UnknownFormat | ErrorKind::UnsupportedTag => {
            TagStoreError::Unsupported(err.to_string())
        }
        _ => TagStoreError::Format(err.to_string()),
    }
}

impl TagStore for LoftyTagStore {
    fn read(&self, path: &Path) -> Result<usize, TagStoreError> {
        Self::check_container(path)?;
        let mut file = std::fs::File::open(path)?;
        let options = ParseOptions::new().read_properties(false);
        let mp4 = Mp4File::read_from(&mut file, options).map_err(map_lofty)?;
        Ok(mp4.ilst().map(|ilst| ilst.len()).unwrap_or(0))
    }

    fn delete_all(&self, path: &Path) -> Result<(), TagStoreError> {
        Self::check_container(path)?;
        Ilst::default().remove_from_path(path).map_err(map_lofty)
    }

    fn save(&self, path: &Path, tags: &TagSet) -> Result<(), TagStoreError> {
        Self::check_container(path)?;
        let mut ilst = Ilst::default();
        for atom in tags.iter() {
            debug!(key = %key_name(&atom.key), "Adding atom");
            ilst.insert(Self::to_atom(atom));
        }
        ilst.save_to_path(path, WriteOptions::default())
            .map_err(map_lofty)
    }
}
