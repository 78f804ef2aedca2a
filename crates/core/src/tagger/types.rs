//! In-memory representation of MP4 `ilst` tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-character atom codes used by the taggers.
pub mod keys {
    pub const TITLE: [u8; 4] = *b"\xa9nam";
    pub const DATE: [u8; 4] = *b"\xa9day";
    pub const ALBUM: [u8; 4] = *b"\xa9alb";
    pub const GENRE: [u8; 4] = *b"\xa9gen";
    pub const SHOW: [u8; 4] = *b"tvsh";
    pub const EPISODE_TITLE: [u8; 4] = *b"tven";
    pub const SEASON: [u8; 4] = *b"tvsn";
    pub const EPISODE: [u8; 4] = *b"tves";
    pub const NETWORK: [u8; 4] = *b"tvnn";
    pub const DISK: [u8; 4] = *b"disk";
    pub const MEDIA_KIND: [u8; 4] = *b"stik";
    pub const HD_VIDEO: [u8; 4] = *b"hdvd";
    pub const DESCRIPTION: [u8; 4] = *b"desc";
    pub const LONG_DESCRIPTION: [u8; 4] = *b"ldes";
    pub const COVER: [u8; 4] = *b"covr";
}

/// `stik` value for movies.
pub const MEDIA_KIND_MOVIE: u8 = 9;

/// `stik` value for TV shows.
pub const MEDIA_KIND_TV_SHOW: u8 = 10;

/// Encoding of embedded cover art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the format from the first bytes of an image.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG") {
            Some(Self::Png)
        } else {
            None
        }
    }
}

/// Value of a single atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Integer(i32),
    /// One-byte integer, as used by `stik` and `hdvd`.
    Byte(u8),
    /// Disk number with no total.
    Disk(u16),
    Cover(Vec<u8>, ImageFormat),
}

impl TagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One atom: four-character code plus value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAtom {
    pub key: [u8; 4],
    pub value: TagValue,
}

impl TagAtom {
    /// Printable form of the key. `©` stands in for byte 0xA9.
    pub fn key_name(&self) -> String {
        key_name(&self.key)
    }
}

/// Printable form of an atom code.
pub fn key_name(key: &[u8; 4]) -> String {
    key.iter()
        .map(|&b| if b == 0xA9 { '©' } else { b as char })
        .collect()
}

/// Ordered set of atoms, at most one per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    atoms: Vec<TagAtom>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any existing value.
    pub fn set(&mut self, key: [u8; 4], value: TagValue) -> &mut Self {
        match self.atoms.iter_mut().find(|a| a.key == key) {
            Some(atom) => atom.value = value,
            None => self.atoms.push(TagAtom { key, value }),
        }
        self
    }

    pub fn set_text(&mut self, key: [u8; 4], value: impl Into<String>) -> &mut Self {
        self.set(key, TagValue::Text(value.into()))
    }

    pub fn get(&self, key: &[u8; 4]) -> Option<&TagValue> {
        self.atoms.iter().find(|a| &a.key == key).map(|a| &a.value)
    }

    pub fn text(&self, key: &[u8; 4]) -> Option<&str> {
        self.get(key).and_then(TagValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagAtom> {
        self.atoms.iter()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.atoms.iter().map(TagAtom::key_name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
