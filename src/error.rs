//! Error types.
//!
//! Each concern has its own enum; [`Error`] folds them together so callers can
//! use a single `Result` alias and still match on the specific failure.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Kms(#[from] KmsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reading, decoding or writing a manifest file.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no secrets file {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed secrets file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode secrets for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures tied to a particular secret or its key.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("no key id specified and none recorded in {}", path.display())]
    MissingKey { path: PathBuf },

    #[error("no secret with name {name} in {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("invalid secret name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("secret {name} does not hold a JSON object: {source}")]
    CompositeDecode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("secret {name} has invalid ciphertext: {reason}")]
    InvalidCiphertext { name: String, reason: String },

    #[error("KMS call for {name} in {} failed: {source}", path.display())]
    Kms {
        name: String,
        path: PathBuf,
        #[source]
        source: KmsError,
    },

    #[error("{failed} of {total} variables could not be processed")]
    Incomplete { failed: usize, total: usize },
}

/// Failures raised by a KMS backend.
#[derive(Error, Debug)]
pub enum KmsError {
    #[error("KMS encrypt failed: {0}")]
    Encrypt(String),

    #[error("KMS decrypt failed: {0}")]
    Decrypt(String),

    #[error("KMS call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{0}")]
    Unavailable(String),
}

/// Failures loading the deployment descriptor.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
