//! Secrets manifest model and location.
//!
//! A manifest records the last key used and the base64 ciphertext of every
//! secret for one stage and region. With per-stage sharding one file per
//! region holds a manifest for each stage, keyed by stage name.
//!
//! ```yaml
//! keyArn: arn:aws:kms:us-east-1:123456789012:key/abc-123
//! secrets:
//!   DATABASE_URL: AQICAHh...
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::constants::{LOCK_EXTENSION, MANIFEST_EXTENSION, MANIFEST_PREFIX};
use crate::core::types::{EncodedCiphertext, KeyId, Scope, SecretName, Stage};

mod store;

pub use store::{load, lock, read_secrets, save, ManifestLock};
pub(crate) use store::write_atomic;

/// Persisted secrets for one stage and region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Key that produced the most recent ciphertext.
    #[serde(rename = "keyArn", default, skip_serializing_if = "Option::is_none")]
    pub key_arn: Option<KeyId>,
    /// Secret name to base64 ciphertext, in file order.
    #[serde(default, deserialize_with = "nullable_map")]
    pub secrets: IndexMap<SecretName, EncodedCiphertext>,
}

impl Manifest {
    /// Key id recorded in the manifest, reduced to its resource id.
    ///
    /// `arn:aws:kms:us-east-1:123:key/abc` yields `abc`; a value without `/`
    /// is returned unchanged.
    pub fn recorded_key_id(&self) -> Option<&str> {
        self.key_arn
            .as_deref()
            .filter(|arn| !arn.is_empty())
            .map(|arn| arn.rsplit('/').next().unwrap_or(arn))
    }
}

/// `secrets:` with no entries is YAML null, treat it as an empty map.
fn nullable_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Where a manifest lives inside its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// The file root is the manifest.
    Root,
    /// The file root maps stage names to manifests.
    Stage(Stage),
}

/// Resolved file path plus section selector for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    path: PathBuf,
    section: Section,
}

impl ManifestLocation {
    /// Resolve the manifest location. Pure, performs no I/O.
    ///
    /// An explicit path wins. Otherwise the file is
    /// `kms-secrets.<stage>.<region>.yml`, or `kms-secrets.<region>.yml`
    /// when every stage shares one file.
    pub fn resolve(explicit: Option<&Path>, scope: &Scope, per_stage: bool) -> Self {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None if per_stage => PathBuf::from(format!(
                "{}.{}.{}",
                MANIFEST_PREFIX, scope.region, MANIFEST_EXTENSION
            )),
            None => PathBuf::from(format!(
                "{}.{}.{}.{}",
                MANIFEST_PREFIX, scope.stage, scope.region, MANIFEST_EXTENSION
            )),
        };
        let section = if per_stage {
            Section::Stage(scope.stage.clone())
        } else {
            Section::Root
        };
        Self { path, section }
    }

    /// Anchor a relative manifest path at `dir`.
    pub fn relative_to(mut self, dir: &Path) -> Self {
        if self.path.is_relative() {
            self.path = dir.join(&self.path);
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Sidecar file used for the advisory lock.
    pub fn lock_path(&self) -> PathBuf {
        let mut lock = self.path.clone().into_os_string();
        lock.push(".");
        lock.push(LOCK_EXTENSION);
        PathBuf::from(lock)
    }
}
