//! File system placer implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info};

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Placer;

/// File system based placer implementation.
pub struct FsPlacer {
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    /// Attempts to move a file atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file, returning its SHA-256 when `calculate_checksum` is set.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<Option<String>, PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let mut hasher = if calculate_checksum {
            Some(Sha256::new())
        } else {
            None
        };

        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok(hasher.map(|h| format!("{:x}", h.finalize())))
    }

    async fn sha256_of(&self, path: &Path) -> Result<String, PlacerError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Sha256::new();
        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Copy with optional verification of the written file.
    async fn copy_verified(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let expected = self
            .copy_file(source, destination, self.config.verify_checksums)
            .await?;

        if let Some(expected) = expected {
            let actual = self.sha256_of(destination).await?;
            if actual != expected {
                let _ = fs::remove_file(destination).await;
                return Err(PlacerError::ChecksumMismatch {
                    path: destination.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    async fn ensure_dir(path: &Path) -> Result<(), PlacerError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Whether `a` and `b` name the same existing file.
    async fn same_file(a: &Path, b: &Path) -> bool {
        match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Destination directory for `base`, with the relative part appended.
    fn target_dir(base: &Path, relative: Option<&Path>) -> PathBuf {
        match relative {
            Some(rel) if !rel.as_os_str().is_empty() => base.join(rel),
            _ => base.to_path_buf(),
        }
    }

    async fn move_file(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let moved = Self::try_atomic_move(source, destination)
            .await
            .map_err(|e| PlacerError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;

        if !moved {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Rename crossed filesystems, copying instead"
            );
            self.copy_verified(source, destination).await?;
            fs::remove_file(source).await.map_err(|e| {
                PlacerError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn replicate(
        &self,
        file: &Path,
        relative: Option<&Path>,
    ) -> Result<Vec<PathBuf>, PlacerError> {
        if !file.exists() {
            return Err(PlacerError::SourceNotFound {
                path: file.to_path_buf(),
            });
        }

        let file_name = file
            .file_name()
            .ok_or_else(|| PlacerError::SourceNotFound {
                path: file.to_path_buf(),
            })?
            .to_owned();

        let mut copies = Vec::with_capacity(self.config.copy_to.len());
        // Set when a copy target is the file itself, which must then stay put.
        let mut keep_source = false;
        for base in &self.config.copy_to {
            let dir = Self::target_dir(base, relative);
            Self::ensure_dir(&dir).await?;
            let destination = dir.join(&file_name);
            if Self::same_file(file, &destination).await {
                debug!(destination = %destination.display(), "Copy target is the source, skipping");
                keep_source = true;
                continue;
            }
            self.copy_verified(file, &destination).await?;
            info!(destination = %destination.display(), "Copied");
            copies.push(destination);
        }

        let primary = match &self.config.move_to {
            Some(base) => {
                let dir = Self::target_dir(base, relative);
                Self::ensure_dir(&dir).await?;
                let destination = dir.join(&file_name);
                if Self::same_file(file, &destination).await {
                    file.to_path_buf()
                } else if keep_source {
                    self.copy_verified(file, &destination).await?;
                    info!(destination = %destination.display(), "Copied, source kept as a copy target");
                    destination
                } else {
                    self.move_file(file, &destination).await?;
                    info!(destination = %destination.display(), "Moved");
                    destination
                }
            }
            None => file.to_path_buf(),
        };
        if keep_source && primary != file {
            copies.push(file.to_path_buf());
        }

        let mut placed = vec![primary];
        placed.extend(copies);
        Ok(placed)
    }
}
