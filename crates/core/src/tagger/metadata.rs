//! Metadata-driven tag writer.
//!
//! Looks the identification up in TMDB or TheTVDB and writes a full tag set,
//! including cover art, into the converted file.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::{TagStore, TagStoreError};
use super::types::{keys, ImageFormat, TagSet, TagValue, MEDIA_KIND_MOVIE, MEDIA_KIND_TV_SHOW};
use crate::external_catalog::{
    ExternalCatalog, ExternalCatalogError, TmdbMovie, TvdbEpisode, TvdbSeries,
};
use crate::identify::Identification;

/// Errors from the metadata-driven writer.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Metadata lookup failed: {0}")]
    Lookup(#[from] ExternalCatalogError),

    #[error("Identification '{0}' carries no metadata")]
    NotTaggable(String),

    #[error("Tag store error: {0}")]
    Store(#[from] TagStoreError),
}

/// The `hdvd` value for a resolution: 2 for 1080p, 1 for 720p, else 0.
pub fn hd_flag(width: u32, height: u32) -> u8 {
    if width >= 1900 || height >= 1060 {
        2
    } else if width >= 1260 || height >= 700 {
        1
    } else {
        0
    }
}

/// Writes tags for one identified file.
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Record the video resolution, used for the HD flag.
    fn set_resolution(&mut self, width: u32, height: u32);

    /// Human-readable name of what is being tagged.
    fn describe(&self) -> String;

    /// Write the tags into `path`.
    async fn write_tags(&self, path: &Path, artwork: bool, thumbnail: bool)
        -> Result<(), TagError>;
}

/// Builds a [`TagWriter`] for an identification.
#[async_trait]
pub trait TagWriterFactory: Send + Sync {
    async fn create(&self, identification: &Identification)
        -> Result<Box<dyn TagWriter>, TagError>;
}

/// Metadata fetched for a writer.
#[derive(Debug, Clone)]
pub enum Metadata {
    Movie(TmdbMovie),
    Episode {
        series: TvdbSeries,
        episode: TvdbEpisode,
    },
}

/// [`TagWriterFactory`] backed by the external catalogs.
pub struct MetadataTagWriterFactory {
    catalog: Arc<dyn ExternalCatalog>,
    store: Arc<dyn TagStore>,
    http: reqwest::Client,
}

impl MetadataTagWriterFactory {
    pub fn new(catalog: Arc<dyn ExternalCatalog>, store: Arc<dyn TagStore>) -> Self {
        Self {
            catalog,
            store,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TagWriterFactory for MetadataTagWriterFactory {
    async fn create(
        &self,
        identification: &Identification,
    ) -> Result<Box<dyn TagWriter>, TagError> {
        let metadata = match identification {
            Identification::MovieByImdbId { imdb_id } => {
                Metadata::Movie(self.catalog.find_movie_by_imdb(imdb_id).await?)
            }
            Identification::MovieByTmdbId { tmdb_id } => {
                Metadata::Movie(self.catalog.get_movie(*tmdb_id).await?)
            }
            Identification::TvEpisode {
                tvdb_id,
                season,
                episode,
            } => {
                let series = self.catalog.get_series(*tvdb_id).await?;
                let episode = self.catalog.get_episode(*tvdb_id, *season, *episode).await?;
                Metadata::Episode { series, episode }
            }
            Identification::Skip | Identification::Untagged => {
                return Err(TagError::NotTaggable(identification.to_string()))
            }
        };

        Ok(Box::new(MetadataTagWriter {
            metadata,
            width: 0,
            height: 0,
            store: self.store.clone(),
            http: self.http.clone(),
        }))
    }
}

/// Writer holding fetched metadata for one file.
pub struct MetadataTagWriter {
    metadata: Metadata,
    width: u32,
    height: u32,
    store: Arc<dyn TagStore>,
    http: reqwest::Client,
}

impl MetadataTagWriter {
    pub fn new(metadata: Metadata, store: Arc<dyn TagStore>) -> Self {
        Self {
            metadata,
            width: 0,
            height: 0,
            store,
            http: reqwest::Client::new(),
        }
    }

    /// The full tag set, with `cover` as artwork when given.
    pub fn tag_set(&self, cover: Option<(Vec<u8>, ImageFormat)>) -> TagSet {
        let mut tags = TagSet::new();

        match &self.metadata {
            Metadata::Movie(movie) => {
                tags.set_text(keys::TITLE, &movie.title);
                if let Some(date) = &movie.release_date {
                    tags.set_text(keys::DATE, date);
                }
                if let Some(short) = movie.tagline.as_ref().or(movie.overview.as_ref()) {
                    tags.set_text(keys::DESCRIPTION, short);
                }
                if let Some(overview) = &movie.overview {
                    tags.set_text(keys::LONG_DESCRIPTION, overview);
                }
                if let Some(genre) = movie.genres.first() {
                    tags.set_text(keys::GENRE, genre);
                }
                tags.set(keys::MEDIA_KIND, TagValue::Byte(MEDIA_KIND_MOVIE));
            }
            Metadata::Episode { series, episode } => {
                let title = episode
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Episode {}", episode.episode_number));
                tags.set_text(keys::SHOW, &series.name)
                    .set_text(keys::TITLE, &title)
                    .set_text(keys::EPISODE_TITLE, &title)
                    .set(keys::SEASON, TagValue::Integer(episode.season_number as i32))
                    .set(keys::DISK, TagValue::Disk(episode.season_number as u16))
                    .set_text(
                        keys::ALBUM,
                        format!("{}, Season {}", series.name, episode.season_number),
                    )
                    .set(keys::EPISODE, TagValue::Integer(episode.episode_number as i32));
                if let Some(network) = &series.network {
                    tags.set_text(keys::NETWORK, network);
                }
                if let Some(overview) = &episode.overview {
                    tags.set_text(keys::DESCRIPTION, overview)
                        .set_text(keys::LONG_DESCRIPTION, overview);
                }
                if let Some(aired) = &episode.aired {
                    tags.set_text(keys::DATE, aired);
                }
                if let Some(genre) = series.genres.first() {
                    tags.set_text(keys::GENRE, genre);
                }
                tags.set(keys::MEDIA_KIND, TagValue::Byte(MEDIA_KIND_TV_SHOW));
            }
        }

        tags.set(keys::HD_VIDEO, TagValue::Byte(hd_flag(self.width, self.height)));

        if let Some((bytes, format)) = cover {
            tags.set(keys::COVER, TagValue::Cover(bytes, format));
        }
        tags
    }

    fn artwork_url(&self, thumbnail: bool) -> Option<&str> {
        match &self.metadata {
            Metadata::Movie(movie) => movie.poster_url.as_deref(),
            Metadata::Episode { series, episode } => {
                let still = episode.still_url.as_deref().filter(|_| thumbnail);
                still.or(series.poster_url.as_deref())
            }
        }
    }

    async fn fetch_artwork(&self, url: &str) -> Option<(Vec<u8>, ImageFormat)> {
        let response = match self.http.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(url = %url, status = %r.status(), "Artwork download failed");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Artwork download failed");
                return None;
            }
        };
        let bytes = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                warn!(url = %url, error = %e, "Artwork download failed");
                return None;
            }
        };
        match ImageFormat::sniff(&bytes) {
            Some(format) => Some((bytes, format)),
            None => {
                warn!(url = %url, "Artwork is not JPEG or PNG, skipping");
                None
            }
        }
    }
}

#[async_trait]
impl TagWriter for MetadataTagWriter {
    fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn describe(&self) -> String {
        match &self.metadata {
            Metadata::Movie(movie) => match movie.year() {
                Some(year) => format!("{} ({})", movie.title, year),
                None => movie.title.clone(),
            },
            Metadata::Episode { series, episode } => format!(
                "{} Season {:02} Episode {:02} - {}",
                series.name,
                episode.season_number,
                episode.episode_number,
                episode.name.as_deref().unwrap_or("")
            ),
        }
    }

    async fn write_tags(
        &self,
        path: &Path,
        artwork: bool,
        thumbnail: bool,
    ) -> Result<(), TagError> {
        info!(path = %path.display(), target = %self.describe(), "Tagging file");

        let cover = match self.artwork_url(thumbnail).filter(|_| artwork) {
            Some(url) => self.fetch_artwork(url).await,
            None => None,
        };
        debug!(has_cover = cover.is_some(), "Artwork resolved");

        let tags = self.tag_set(cover);
        self.store.save(path, &tags)?;
        info!(atoms = tags.len(), "Tags written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockExternalCatalog, MockTagStore};

    #[test]
    fn test_hd_flag() {
        assert_eq!(hd_flag(1920, 1080), 2);
        assert_eq!(hd_flag(1900, 800), 2);
        assert_eq!(hd_flag(1440, 1060), 2);
        assert_eq!(hd_flag(1280, 720), 1);
        assert_eq!(hd_flag(960, 700), 1);
        assert_eq!(hd_flag(720, 480), 0);
        assert_eq!(hd_flag(0, 0), 0);
    }

    #[tokio::test]
    async fn test_movie_writer() {
        let catalog = Arc::new(MockExternalCatalog::new());
        catalog
            .add_movie(fixtures::tmdb_movie(27205, "Inception", 2010))
            .await;
        let store = Arc::new(MockTagStore::new());
        let factory = MetadataTagWriterFactory::new(catalog, store.clone());

        let mut writer = factory
            .create(&Identification::MovieByTmdbId { tmdb_id: 27205 })
            .await
            .unwrap();
        writer.set_resolution(1280, 536);
        assert_eq!(writer.describe(), "Inception (2010)");

        writer
            .write_tags(Path::new("/out/Inception (2010).mp4"), false, false)
            .await
            .unwrap();

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        let tags = &saved[0].1;
        assert_eq!(tags.text(&keys::TITLE), Some("Inception"));
        assert_eq!(tags.get(&keys::MEDIA_KIND), Some(&TagValue::Byte(9)));
        assert_eq!(tags.get(&keys::HD_VIDEO), Some(&TagValue::Byte(1)));
        assert!(tags.get(&keys::COVER).is_none());
    }

    #[tokio::test]
    async fn test_movie_by_imdb_id() {
        let catalog = Arc::new(MockExternalCatalog::new());
        let mut movie = fixtures::tmdb_movie(27205, "Inception", 2010);
        movie.imdb_id = Some("tt1375666".to_string());
        catalog.add_movie(movie).await;

        let factory = MetadataTagWriterFactory::new(catalog, Arc::new(MockTagStore::new()));
        let writer = factory
            .create(&Identification::MovieByImdbId {
                imdb_id: "tt1375666".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(writer.describe(), "Inception (2010)");
    }

    #[tokio::test]
    async fn test_episode_tag_set() {
        let mut series = fixtures::tvdb_series(81189, "Breaking Bad");
        series.network = Some("AMC".to_string());
        let episode = fixtures::tvdb_episode(2, 5, "Breakage");
        let writer = MetadataTagWriter::new(
            Metadata::Episode { series, episode },
            Arc::new(MockTagStore::new()),
        );

        let tags = writer.tag_set(Some((vec![0xFF, 0xD8, 0xFF], ImageFormat::Jpeg)));
        assert_eq!(tags.text(&keys::SHOW), Some("Breaking Bad"));
        assert_eq!(tags.text(&keys::TITLE), Some("Breakage"));
        assert_eq!(tags.text(&keys::ALBUM), Some("Breaking Bad, Season 2"));
        assert_eq!(tags.text(&keys::NETWORK), Some("AMC"));
        assert_eq!(tags.get(&keys::EPISODE), Some(&TagValue::Integer(5)));
        assert_eq!(tags.get(&keys::MEDIA_KIND), Some(&TagValue::Byte(10)));
        assert_eq!(tags.get(&keys::HD_VIDEO), Some(&TagValue::Byte(0)));
        assert!(matches!(tags.get(&keys::COVER), Some(TagValue::Cover(_, ImageFormat::Jpeg))));
        assert_eq!(
            writer.describe(),
            "Breaking Bad Season 02 Episode 05 - Breakage"
        );
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let factory = MetadataTagWriterFactory::new(
            Arc::new(MockExternalCatalog::new()),
            Arc::new(MockTagStore::new()),
        );
        let result = factory
            .create(&Identification::TvEpisode {
                tvdb_id: 1,
                season: 1,
                episode: 1,
            })
            .await;
        assert!(matches!(result, Err(TagError::Lookup(_))));

        let result = factory.create(&Identification::Untagged).await;
        assert!(matches!(result, Err(TagError::NotTaggable(_))));
    }
}
