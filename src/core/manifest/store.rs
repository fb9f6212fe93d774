//! Manifest file I/O.
//!
//! Reads are lenient about missing files and empty sections; writes always
//! replace the whole file through a temporary sibling that is renamed over
//! the target, so a failed write never leaves a truncated manifest.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use super::{Manifest, ManifestLocation, Section};
use crate::core::types::{EncodedCiphertext, SecretName};
use crate::error::{ManifestError, Result};

/// Load the manifest for `location`.
///
/// A missing file, an empty file, or a missing stage section all yield an
/// empty manifest.
///
/// # Errors
///
/// Returns `ManifestError::Decode` if the file is not valid YAML or does not
/// have the manifest shape.
pub fn load(location: &ManifestLocation) -> Result<Manifest> {
    debug!(path = %location.path().display(), "loading manifest");

    let manifest = match read_document(location.path())? {
        Some(document) => select(document, location)?,
        None => {
            debug!("manifest file absent, starting empty");
            Manifest::default()
        }
    };

    debug!(
        secrets = manifest.secrets.len(),
        key_arn = manifest.key_arn.as_deref().unwrap_or("-"),
        "manifest loaded"
    );
    Ok(manifest)
}

/// Read only the secrets of an existing manifest.
///
/// # Errors
///
/// Returns `ManifestError::NotFound` if the file does not exist. Nothing is
/// created in that case.
pub fn read_secrets(location: &ManifestLocation) -> Result<IndexMap<SecretName, EncodedCiphertext>> {
    let document = read_document(location.path())?.ok_or_else(|| ManifestError::NotFound {
        path: location.path().to_path_buf(),
    })?;
    let secrets = select(document, location)?.secrets;
    trace!(path = %location.path().display(), secrets = secrets.len(), "read manifest secrets");
    Ok(secrets)
}

/// Persist `manifest` at `location`.
///
/// For a stage section the rest of the file is re-read and kept as is; only
/// the section for this stage is replaced.
///
/// # Errors
///
/// Returns `ManifestError::Decode` if a sharded file exists but cannot be
/// parsed, or `ManifestError::Write` if the replacement cannot be written.
pub fn save(location: &ManifestLocation, manifest: &Manifest) -> Result<()> {
    let path = location.path();
    debug!(path = %path.display(), secrets = manifest.secrets.len(), "saving manifest");

    let encode = |source| ManifestError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let contents = match location.section() {
        Section::Root => serde_yaml::to_string(manifest).map_err(encode)?,
        Section::Stage(stage) => {
            let mut root = match read_document(path)? {
                Some(document) => root_mapping(document, path)?,
                None => Mapping::new(),
            };
            let section = serde_yaml::to_value(manifest).map_err(encode)?;
            root.insert(Value::String(stage.clone()), section);
            serde_yaml::to_string(&root).map_err(encode)?
        }
    };

    write_atomic(path, contents.as_bytes())
}

/// Exclusive advisory lock on a manifest, released on drop.
#[derive(Debug)]
pub struct ManifestLock {
    file: File,
    path: PathBuf,
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        trace!(path = %self.path.display(), "releasing manifest lock");
        let _ = FileExt::unlock(&self.file);
    }
}

/// Block until this process holds the exclusive lock for `location`.
///
/// The lock lives on a `.lock` sidecar because the manifest itself is
/// replaced by rename on every save. It only serializes processes that take
/// the same lock.
///
/// # Errors
///
/// Returns `ManifestError::Lock` if the lock file cannot be opened or locked.
pub fn lock(location: &ManifestLocation) -> Result<ManifestLock> {
    let path = location.lock_path();
    let lock_error = |source| ManifestError::Lock {
        path: path.clone(),
        source,
    };

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(lock_error)?;
    file.lock_exclusive().map_err(lock_error)?;

    trace!(path = %path.display(), "acquired manifest lock");
    Ok(ManifestLock { file, path })
}

/// Read and parse the file, `None` if it does not exist.
fn read_document(path: &Path) -> Result<Option<Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ManifestError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    };

    if contents.trim().is_empty() {
        return Ok(Some(Value::Null));
    }

    let document = serde_yaml::from_str(&contents).map_err(|source| ManifestError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(document))
}

/// Pick the manifest for `location` out of a parsed document.
fn select(document: Value, location: &ManifestLocation) -> Result<Manifest> {
    let section = match location.section() {
        Section::Root => document,
        Section::Stage(stage) => root_mapping(document, location.path())?
            .remove(stage.as_str())
            .unwrap_or(Value::Null),
    };

    if section.is_null() {
        return Ok(Manifest::default());
    }

    serde_yaml::from_value(section).map_err(|source| {
        ManifestError::Decode {
            path: location.path().to_path_buf(),
            source,
        }
        .into()
    })
}

fn root_mapping(document: Value, path: &Path) -> Result<Mapping> {
    if document.is_null() {
        return Ok(Mapping::new());
    }
    serde_yaml::from_value(document).map_err(|source| {
        ManifestError::Decode {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Replace `path` with `contents` via a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_error = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;

    // Keep the mode of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_error)?;
    }

    tmp.write_all(contents).map_err(write_error)?;
    tmp.as_file().sync_all().map_err(write_error)?;
    tmp.persist(path).map_err(|e| write_error(e.error))?;

    trace!(path = %path.display(), bytes = contents.len(), "manifest written");
    Ok(())
}
