//! File-backed store: one checksummed JSON envelope per key.
//!
//! Each key maps to `<dir>/<key>.json` holding an [`Envelope`] whose
//! SHA-256 checksum covers the serialized payload. Writes go to a temp
//! file, fsync, then an atomic rename, so a crash leaves either the old
//! file or the new one, never a torn write. Corrupt or tampered files
//! read as `None` with a warning.

use std::fs::{rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::KvStore;

pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    data: Value,
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers from `store::keys`; safe as filenames
        self.dir.join(format!("{}.json", key))
    }

    fn checksum(data: &Value) -> Result<String, StoreError> {
        let bytes = serde_json::to_vec(data)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn read_envelope(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        if envelope.version > ENVELOPE_VERSION {
            return Err(StoreError::UnsupportedVersion(envelope.version));
        }
        if Self::checksum(&envelope.data)? != envelope.checksum {
            return Err(StoreError::ChecksumMismatch);
        }

        Ok(Some(envelope.data))
    }

    fn write_envelope(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            checksum: Self::checksum(value)?,
            data: value.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let path = self.key_path(key);
        let temp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.flush()?;

            // sync_all ensures data is written to disk (portable fsync)
            file.sync_all()?;
        }

        // Atomic rename
        rename(&temp_path, &path)?;

        log::debug!("Persisted {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.read_envelope(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Unreadable store entry '{}', using defaults: {}", key, err);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &Value) {
        if let Err(err) = self.write_envelope(key, value) {
            log::warn!("Failed to persist '{}': {}", key, err);
        }
    }
}
