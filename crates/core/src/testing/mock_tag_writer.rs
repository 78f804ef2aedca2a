//! Mock tag writers for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::ExternalCatalogError;
use crate::identify::Identification;
use crate::tagger::{TagError, TagStoreError, TagWriter, TagWriterFactory};

/// A tag write recorded by [`MockTagWriterFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTagWrite {
    pub path: PathBuf,
    pub identification: Identification,
    pub width: u32,
    pub height: u32,
    pub artwork: bool,
    pub thumbnail: bool,
}

/// Mock implementation of the TagWriterFactory trait.
///
/// Writers record what they would have written. Creation or writing can be
/// made to fail to drive the fallback path.
#[derive(Debug, Default)]
pub struct MockTagWriterFactory {
    writes: Arc<RwLock<Vec<RecordedTagWrite>>>,
    fail_create: Arc<RwLock<bool>>,
    fail_write: Arc<RwLock<bool>>,
}

impl MockTagWriterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create` fail with a lookup error.
    pub async fn set_fail_create(&self, fail: bool) {
        *self.fail_create.write().await = fail;
    }

    /// Make created writers fail when writing.
    pub async fn set_fail_write(&self, fail: bool) {
        *self.fail_write.write().await = fail;
    }

    /// Every successful write, in order.
    pub async fn recorded_writes(&self) -> Vec<RecordedTagWrite> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl TagWriterFactory for MockTagWriterFactory {
    async fn create(
        &self,
        identification: &Identification,
    ) -> Result<Box<dyn TagWriter>, TagError> {
        if !identification.should_tag() {
            return Err(TagError::NotTaggable(identification.to_string()));
        }
        if *self.fail_create.read().await {
            return Err(TagError::Lookup(ExternalCatalogError::NotFound(
                identification.to_string(),
            )));
        }

        Ok(Box::new(MockTagWriter {
            identification: identification.clone(),
            width: 0,
            height: 0,
            fail: *self.fail_write.read().await,
            writes: self.writes.clone(),
        }))
    }
}

struct MockTagWriter {
    identification: Identification,
    width: u32,
    height: u32,
    fail: bool,
    writes: Arc<RwLock<Vec<RecordedTagWrite>>>,
}

#[async_trait]
impl TagWriter for MockTagWriter {
    fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn describe(&self) -> String {
        self.identification.to_string()
    }

    async fn write_tags(&self, path: &Path, artwork: bool, thumbnail: bool) -> Result<(), TagError> {
        if self.fail {
            return Err(TagError::Store(TagStoreError::Io(std::io::Error::other(
                "mock write failure",
            ))));
        }

        self.writes.write().await.push(RecordedTagWrite {
            path: path.to_path_buf(),
            identification: self.identification.clone(),
            width: self.width,
            height: self.height,
            artwork,
            thumbnail,
        });
        Ok(())
    }
}
