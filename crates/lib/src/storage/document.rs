//! Versioned JSON documents with atomic replacement.
//!
//! Every persisted file is a full snapshot wrapped in a small envelope:
//!
//! ```json
//! { "version": 1, "key": "auth", "data": { ... } }
//! ```
//!
//! Unknown fields anywhere in the document are ignored on load so the format
//! can grow additively. Writes go to a temporary file in the same directory,
//! are synced, and then renamed over the target, so a reader never observes a
//! half-written document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use super::errors::StorageError;
use crate::constants::STORAGE_VERSION;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    key: &'a str,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    key: String,
    data: T,
}

/// Render a document exactly as [`write_document`] would store it.
pub(crate) fn render_document<T: Serialize>(key: &str, data: &T) -> Result<String, StorageError> {
    let envelope = EnvelopeRef {
        version: STORAGE_VERSION,
        key,
        data,
    };
    let mut json =
        serde_json::to_string_pretty(&envelope).map_err(|source| StorageError::SerializationFailed {
            key: key.to_string(),
            source,
        })?;
    json.push('\n');
    Ok(json)
}

/// Atomically replace the document at `path` with `data`.
///
/// Parent directories are created as needed. On any failure the temporary
/// file is removed and the previous document, if any, is left untouched.
pub(crate) async fn write_document<T: Serialize>(
    path: &Path,
    key: &str,
    data: &T,
) -> Result<(), StorageError> {
    let json = render_document(key, data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::FileIo {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let tmp = temp_path(path);
    let result = write_and_rename(&tmp, path, json.as_bytes()).await;
    if result.is_err() {
        // Best effort; the temp file may never have been created
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

async fn write_and_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let io_err = |source| StorageError::FileIo {
        path: tmp.to_path_buf(),
        source,
    };

    {
        let mut file = tokio::fs::File::create(tmp).await.map_err(io_err)?;
        file.write_all(bytes).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
    }

    tokio::fs::rename(tmp, path)
        .await
        .map_err(|source| StorageError::FileIo {
            path: path.to_path_buf(),
            source,
        })
}

/// Read the document at `path`, returning `None` if the file does not exist.
pub(crate) async fn read_document<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::FileIo {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let envelope: Envelope<serde_json::Value> =
        serde_json::from_str(&json).map_err(|source| StorageError::DeserializationFailed {
            path: path.to_path_buf(),
            source,
        })?;

    if envelope.version != STORAGE_VERSION {
        return Err(StorageError::UnsupportedVersion {
            key: key.to_string(),
            found: envelope.version,
            supported: STORAGE_VERSION,
        });
    }
    if envelope.key != key {
        return Err(StorageError::KeyMismatch {
            expected: key.to_string(),
            found: envelope.key,
        });
    }

    let data = T::deserialize(envelope.data).map_err(|source| {
        StorageError::DeserializationFailed {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(Some(data))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp-{}", uuid::Uuid::new_v4().simple()))
}
