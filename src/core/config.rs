//! Deployment descriptor and module configuration.
//!
//! Settings live in the service's deployment descriptor (`serverless.yml`)
//! under `custom.serverless-kms-secrets`:
//!
//! ```yaml
//! provider:
//!   stage: dev
//!   region: eu-west-1
//! custom:
//!   serverless-kms-secrets:
//!     secretsFile: config/secrets.yml
//!     perStage: true
//!     keyId: arn:aws:kms:eu-west-1:123456789012:key/abc-123
//! ```
//!
//! The descriptor is optional; without one every setting takes its default.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::core::constants::{
    CONFIG_SECTION, DEFAULT_REGION, DEFAULT_STAGE, LEGACY_CONFIG_SECTION, UNRESOLVED_MARKER,
};
use crate::core::manifest;
use crate::core::types::{KeyId, Scope};
use crate::error::{ConfigError, Result};

/// Module configuration consumed by the manifest engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// Explicit manifest path, overriding the generated name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<PathBuf>,
    /// Keep every stage of a region in one file, keyed by stage.
    #[serde(default)]
    pub per_stage: bool,
    /// Key used when neither the caller nor the manifest names one.
    #[serde(default, alias = "keyArn", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<KeyId>,
    /// Encrypt listed environment variables of the descriptor on sweep.
    #[serde(default)]
    pub auto_encrypt_env_var_on_package_or_deploy: bool,
    /// Variable names the sweep encrypts.
    #[serde(default)]
    pub env_variables_to_encrypt: Vec<String>,
}

/// A parsed deployment descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    path: PathBuf,
    document: Value,
}

impl Descriptor {
    /// Load the descriptor at `path`.
    ///
    /// A missing file yields an empty descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file exists but cannot be read, or
    /// `ConfigError::Parse` if it is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading descriptor");

        let document = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Value::Null,
            Ok(contents) => serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("descriptor absent, using defaults");
                Value::Null
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
                .into())
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative manifest paths are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// The module configuration section, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the section has the wrong shape.
    pub fn module_config(&self) -> Result<ModuleConfig> {
        let custom = self.document.get("custom");
        let section = custom
            .and_then(|c| c.get(CONFIG_SECTION))
            .or_else(|| custom.and_then(|c| c.get(LEGACY_CONFIG_SECTION)));

        match section {
            Some(section) if !section.is_null() => serde_yaml::from_value(section.clone())
                .map_err(|source| {
                    ConfigError::Parse {
                        path: self.path.clone(),
                        source,
                    }
                    .into()
                }),
            _ => Ok(ModuleConfig::default()),
        }
    }

    /// Scope for this invocation.
    ///
    /// Explicit values win, then `provider.stage` / `provider.region`, then
    /// `dev` / `us-east-1`. Unresolved `${...}` references in the descriptor
    /// are ignored.
    pub fn scope(&self, stage: Option<&str>, region: Option<&str>) -> Scope {
        let stage = stage
            .map(str::to_string)
            .or_else(|| self.provider_setting("stage"))
            .unwrap_or_else(|| DEFAULT_STAGE.to_string());
        let region = region
            .map(str::to_string)
            .or_else(|| self.provider_setting("region"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        Scope { stage, region }
    }

    fn provider_setting(&self, field: &str) -> Option<String> {
        let value = self.document.get("provider")?.get(field)?.as_str()?;
        if value.contains(UNRESOLVED_MARKER) {
            debug!(field, value, "ignoring unresolved descriptor variable");
            return None;
        }
        Some(value.to_string())
    }

    pub(crate) fn document_mut(&mut self) -> &mut Value {
        &mut self.document
    }

    /// The descriptor rendered as YAML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the document cannot be encoded.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.document).map_err(|e| {
            ConfigError::InvalidValue {
                field: "descriptor",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Write the descriptor to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the document cannot be encoded,
    /// or `ManifestError::Write` if the file cannot be replaced.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving descriptor");
        manifest::write_atomic(path, self.to_yaml()?.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn descriptor(contents: &str) -> (TempDir, Descriptor) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("serverless.yml");
        fs::write(&path, contents).unwrap();
        let descriptor = Descriptor::load(&path).unwrap();
        (dir, descriptor)
    }

    #[test]
    fn test_missing_descriptor_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let descriptor = Descriptor::load(&dir.path().join("serverless.yml")).unwrap();

        assert_eq!(descriptor.module_config().unwrap(), ModuleConfig::default());
        assert_eq!(descriptor.scope(None, None), Scope::new("dev", "us-east-1"));
    }

    #[test]
    fn test_module_config_section() {
        let (_dir, descriptor) = descriptor(
            r#"
service: demo
custom:
  serverless-kms-secrets:
    secretsFile: config/secrets.yml
    perStage: true
    keyArn: arn:aws:kms:us-east-1:1:key/abc
    autoEncryptEnvVarOnPackageOrDeploy: true
    envVariablesToEncrypt:
      - DB_PASSWORD
"#,
        );

        let config = descriptor.module_config().unwrap();
        assert_eq!(config.secrets_file, Some(PathBuf::from("config/secrets.yml")));
        assert!(config.per_stage);
        assert_eq!(config.key_id.as_deref(), Some("arn:aws:kms:us-east-1:1:key/abc"));
        assert!(config.auto_encrypt_env_var_on_package_or_deploy);
        assert_eq!(config.env_variables_to_encrypt, ["DB_PASSWORD"]);
    }

    #[test]
    fn test_legacy_section_name() {
        let (_dir, descriptor) = descriptor("custom:\n  kmsSecrets:\n    keyId: abc\n");
        assert_eq!(descriptor.module_config().unwrap().key_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_scope_precedence() {
        let (_dir, descriptor) =
            descriptor("provider:\n  stage: staging\n  region: eu-west-1\n");

        assert_eq!(
            descriptor.scope(None, None),
            Scope::new("staging", "eu-west-1")
        );
        assert_eq!(
            descriptor.scope(Some("prod"), None),
            Scope::new("prod", "eu-west-1")
        );
    }

    #[test]
    fn test_scope_ignores_unresolved_variables() {
        let (_dir, descriptor) =
            descriptor("provider:\n  stage: ${opt:stage, 'dev'}\n  region: eu-west-1\n");
        assert_eq!(descriptor.scope(None, None).stage, "dev");
    }

    #[test]
    fn test_malformed_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("serverless.yml");
        fs::write(&path, "provider: [oops\n").unwrap();

        assert!(Descriptor::load(&path).is_err());
    }

    #[test]
    fn test_wrong_section_shape() {
        let (_dir, descriptor) =
            descriptor("custom:\n  serverless-kms-secrets:\n    perStage: [1, 2]\n");
        assert!(descriptor.module_config().is_err());
    }

    #[test]
    fn test_base_dir() {
        let (dir, descriptor) = descriptor("service: demo\n");
        assert_eq!(descriptor.base_dir(), Some(dir.path()));

        let bare = Descriptor::load(Path::new("does-not-exist.yml")).unwrap();
        assert_eq!(bare.base_dir(), None);
    }
}
