//! Encrypt and decrypt transactions.
//!
//! A transaction binds a KMS backend, the module configuration and a
//! [`Scope`]. Encrypt is load, optionally decrypt-and-merge, encrypt, save;
//! the manifest is only written after every other step succeeded. Decrypt
//! never writes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::cipher::{self, Kms};
use crate::core::config::ModuleConfig;
use crate::core::constants::DECRYPT_CONCURRENCY;
use crate::core::manifest::{self, Manifest, ManifestLocation};
use crate::core::name::CompositeName;
use crate::core::types::{EncodedCiphertext, KeyId, Scope, SecretName};
use crate::error::{Error, Result, SecretError};

/// Outcome of a successful encrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    /// Name as given, including any `:inner` part.
    pub name: String,
    /// Key id the service reported for the new ciphertext.
    pub key_id: KeyId,
    /// Manifest that was written.
    pub path: PathBuf,
}

/// One entry of a decrypt batch.
#[derive(Debug)]
pub struct DecryptedSecret {
    pub name: String,
    pub value: Result<Zeroizing<String>>,
}

impl DecryptedSecret {
    /// Plaintext, or the error for this name alone.
    pub fn value(&self) -> std::result::Result<&str, &Error> {
        self.value.as_ref().map(|v| v.as_str())
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_ok()
    }
}

/// Encrypt/decrypt operations against one scope's manifest.
#[derive(Debug)]
pub struct Transaction<'a> {
    kms: &'a dyn Kms,
    config: &'a ModuleConfig,
    scope: Scope,
    base_dir: Option<PathBuf>,
}

impl<'a> Transaction<'a> {
    pub fn new(kms: &'a dyn Kms, config: &'a ModuleConfig, scope: Scope) -> Self {
        Self {
            kms,
            config,
            scope,
            base_dir: None,
        }
    }

    /// Resolve relative manifest paths against `dir` instead of the
    /// working directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Manifest location for this invocation.
    pub fn location(&self) -> ManifestLocation {
        let location = ManifestLocation::resolve(
            self.config.secrets_file.as_deref(),
            &self.scope,
            self.config.per_stage,
        );
        match &self.base_dir {
            Some(dir) => location.relative_to(dir),
            None => location,
        }
    }

    /// Encrypt `value` under `name` and persist it.
    ///
    /// The key is `key_id` if given, else the one recorded in the manifest,
    /// else the configured `keyId`. For `outer:inner` names the JSON object
    /// stored under `outer` is decrypted, `inner` is set, and the whole
    /// object is re-encrypted.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MissingKey` before any KMS call if no key is
    /// available, `SecretError::CompositeDecode` if `outer` holds something
    /// other than a JSON object, and propagates manifest and KMS errors.
    pub fn encrypt(&self, name: &str, value: &str, key_id: Option<&str>) -> Result<Encrypted> {
        let name = CompositeName::parse(name)?;
        let location = self.location();

        // Nothing on disk can supply a key, fail before touching the directory
        if key_id.is_none() && self.config.key_id.is_none() && !location.exists() {
            return Err(self.missing_key(&location));
        }

        let _lock = manifest::lock(&location)?;
        let mut manifest = manifest::load(&location)?;
        let key_id = self.resolve_key(key_id, &manifest, &location)?;

        let plaintext = match name.inner() {
            Some(inner) => self.merge(&manifest, name.outer(), inner, value, location.path())?,
            None => Zeroizing::new(value.to_string()),
        };

        let sealed = self
            .kms
            .encrypt(&key_id, plaintext.as_bytes(), &self.scope)
            .map_err(|e| attribute(e, name.outer(), location.path()))?;
        manifest
            .secrets
            .insert(name.outer().to_string(), cipher::encode_blob(&sealed.blob));
        manifest.key_arn = Some(sealed.key_id.clone());
        manifest::save(&location, &manifest)?;

        debug!(
            name = %name,
            key_id = %sealed.key_id,
            path = %location.path().display(),
            "secret encrypted"
        );

        Ok(Encrypted {
            name: name.to_string(),
            key_id: sealed.key_id,
            path: location.path().to_path_buf(),
        })
    }

    /// Decrypt `name`, or every secret in the manifest when `name` is `None`.
    ///
    /// Entries come back in manifest order. A missing name, bad ciphertext or
    /// failed KMS call is reported on that entry only.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the manifest does not exist, or
    /// `ManifestError::Decode` if it cannot be parsed.
    pub fn decrypt(&self, name: Option<&str>) -> Result<Vec<DecryptedSecret>> {
        let location = self.location();
        debug!(path = %location.path().display(), "decrypting secrets");

        let secrets = manifest::read_secrets(&location)?;
        let targets: Vec<String> = match name {
            Some(name) => vec![name.to_string()],
            None => secrets.keys().cloned().collect(),
        };

        let values = map_ordered(&targets, DECRYPT_CONCURRENCY, |target| {
            self.decrypt_one(target, &secrets, location.path())
        });

        let entries: Vec<DecryptedSecret> = targets
            .into_iter()
            .zip(values)
            .map(|(name, value)| DecryptedSecret { name, value })
            .collect();

        let failed = entries.iter().filter(|e| !e.is_ok()).count();
        if failed > 0 {
            warn!(failed, total = entries.len(), "some secrets could not be decrypted");
        }
        Ok(entries)
    }

    fn decrypt_one(
        &self,
        target: &str,
        secrets: &IndexMap<SecretName, EncodedCiphertext>,
        path: &Path,
    ) -> Result<Zeroizing<String>> {
        let name = CompositeName::parse(target)?;
        let encoded = secrets
            .get(name.outer())
            .ok_or_else(|| SecretError::NotFound {
                name: target.to_string(),
                path: path.to_path_buf(),
            })?;

        let plaintext = self.reveal(name.outer(), encoded, path)?;
        let Some(inner) = name.inner() else {
            return Ok(plaintext);
        };

        let object = parse_object(name.outer(), &plaintext)?;
        let field = match object.get(inner) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Ok(Zeroizing::new(field))
    }

    fn resolve_key(
        &self,
        explicit: Option<&str>,
        manifest: &Manifest,
        location: &ManifestLocation,
    ) -> Result<KeyId> {
        if let Some(key_id) = explicit {
            debug!(key_id, "using explicit key");
            return Ok(key_id.to_string());
        }
        if let Some(key_id) = manifest.recorded_key_id() {
            debug!(key_id, path = %location.path().display(), "using key recorded in manifest");
            return Ok(key_id.to_string());
        }
        if let Some(key_id) = self.config.key_id.as_deref() {
            debug!(key_id, "using configured key");
            return Ok(key_id.to_string());
        }
        Err(self.missing_key(location))
    }

    fn missing_key(&self, location: &ManifestLocation) -> Error {
        SecretError::MissingKey {
            path: location.path().to_path_buf(),
        }
        .into()
    }

    /// Build the composite plaintext for `outer` with `inner` set to `value`.
    fn merge(
        &self,
        manifest: &Manifest,
        outer: &str,
        inner: &str,
        value: &str,
        path: &Path,
    ) -> Result<Zeroizing<String>> {
        let mut object = match manifest.secrets.get(outer) {
            Some(encoded) => parse_object(outer, &self.reveal(outer, encoded, path)?)?,
            None => Map::new(),
        };
        object.insert(inner.to_string(), Value::String(value.to_string()));
        Ok(Zeroizing::new(serde_json::to_string(&object)?))
    }

    /// Decode and decrypt a stored ciphertext into UTF-8 text.
    fn reveal(&self, name: &str, encoded: &str, path: &Path) -> Result<Zeroizing<String>> {
        let blob = cipher::decode_blob(name, encoded)?;
        let plaintext = self
            .kms
            .decrypt(&blob, &self.scope)
            .map_err(|e| attribute(e, name, path))?;
        let text = String::from_utf8(plaintext.to_vec()).map_err(|e| {
            SecretError::InvalidCiphertext {
                name: name.to_string(),
                reason: format!("plaintext is not UTF-8: {}", e.utf8_error()),
            }
        })?;
        Ok(Zeroizing::new(text))
    }
}

/// Tie a backend failure to the secret and manifest it was for.
fn attribute(err: Error, name: &str, path: &Path) -> Error {
    match err {
        Error::Kms(source) => SecretError::Kms {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        }
        .into(),
        other => other,
    }
}

fn parse_object(name: &str, plaintext: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(plaintext).map_err(|source| {
        SecretError::CompositeDecode {
            name: name.to_string(),
            source,
        }
        .into()
    })
}

/// Apply `f` to every item on at most `workers` threads, results in item order.
fn map_ordered<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.min(items.len());
    if workers <= 1 {
        return items.iter().map(&f).collect();
    }

    let next = AtomicUsize::new(0);
    let mut done: Vec<(usize, R)> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| {
                    let mut local = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(i) else {
                            break local;
                        };
                        local.push((i, f(item)));
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
            .collect()
    });

    done.sort_unstable_by_key(|(i, _)| *i);
    done.into_iter().map(|(_, r)| r).collect()
}
