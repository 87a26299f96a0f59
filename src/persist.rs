//! Inbound blob persistence
//!
//! Media delivered by the bridge is written into the client's watched
//! working directory so the client can pick it up.

use crate::error::{Error, Result};
use crate::record::BlobData;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Lowercase hex MD5 of the content, used when a blob arrives unnamed
pub fn content_name(binary: &[u8]) -> String {
    hex::encode(md5::compute(binary).0)
}

/// Filename a blob will be written under. Only the last component of a
/// supplied name is used so a name cannot point outside the directory.
pub fn file_name_for(blob: &BlobData) -> Result<String> {
    if blob.name.is_empty() {
        return Ok(content_name(&blob.binary));
    }

    let name = Path::new(&blob.name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::InvalidPath(blob.name.clone()))?;
    Ok(name)
}

/// Writes inbound blobs into one directory
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `blob` atomically, returning where it landed. An existing file
    /// of the same name is replaced.
    pub fn write(&self, blob: &BlobData) -> Result<PathBuf> {
        let path = self.dir.join(file_name_for(blob)?);

        fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(&blob.binary)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        Ok(path)
    }

    /// Decode a bridge blob description and write it. `None` means the blob
    /// was not persisted.
    pub fn persist(&self, json: &[u8]) -> Option<PathBuf> {
        let blob: BlobData = match serde_json::from_slice(json) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "undecodable blob description");
                return None;
            }
        };

        match self.write(&blob) {
            Ok(path) => {
                info!(path = %path.display(), bytes = blob.binary.len(), "blob persisted");
                Some(path)
            }
            Err(e) => {
                warn!(name = %blob.name, error = %e, "failed to persist blob");
                None
            }
        }
    }
}
