//! Tagging of converted files.
//!
//! The metadata writer is tried first. When it fails, the fallback tagger
//! derives a minimal tag set from the output filename and writes it with
//! bounded retries.

mod fallback;
mod metadata;
mod store;
mod types;

pub use fallback::{
    movie_tags, parse_movie_filename, parse_tv_filename, tv_tags, FallbackError, FallbackTagger,
    MovieFileName, RetryPolicy, TvFileName,
};
pub use metadata::{
    hd_flag, Metadata, MetadataTagWriter, MetadataTagWriterFactory, TagError, TagWriter,
    TagWriterFactory,
};
pub use store::{LoftyTagStore, TagStore, TagStoreError};
pub use types::{
    key_name, keys, ImageFormat, TagAtom, TagSet, TagValue, MEDIA_KIND_MOVIE, MEDIA_KIND_TV_SHOW,
};
