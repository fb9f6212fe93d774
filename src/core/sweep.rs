//! Environment variable auto-encryption.
//!
//! Replaces selected plaintext values in the descriptor's
//! `provider.environment` and `functions.<name>.environment` blocks with
//! base64 KMS ciphertext, so a deployment never ships them in clear text.

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::core::cipher::{self, Kms};
use crate::core::config::{Descriptor, ModuleConfig};
use crate::core::constants::UNRESOLVED_MARKER;
use crate::core::types::Scope;
use crate::error::{ConfigError, Result};

/// Result of encrypting one environment variable.
#[derive(Debug)]
pub struct SweepOutcome {
    /// Block the variable was found in: `provider` or `functions.<name>`.
    pub block: String,
    pub variable: String,
    pub result: Result<()>,
}

/// Encrypt the configured environment variables of `descriptor` in place.
///
/// Does nothing unless `autoEncryptEnvVarOnPackageOrDeploy` is set. With no
/// `keyId` or an empty variable list a warning is logged and nothing is
/// changed. Each variable is encrypted on its own; one failure leaves that
/// value untouched and the rest proceed. Values holding an unresolved `${...}`
/// reference are left for the framework to resolve.
pub fn encrypt_environment(
    descriptor: &mut Descriptor,
    config: &ModuleConfig,
    kms: &dyn Kms,
    scope: &Scope,
) -> Vec<SweepOutcome> {
    if !config.auto_encrypt_env_var_on_package_or_deploy {
        debug!("environment auto-encryption disabled");
        return Vec::new();
    }

    let Some(key_id) = config.key_id.as_deref() else {
        warn!("no KMS key configured for environment encryption");
        return Vec::new();
    };
    if config.env_variables_to_encrypt.is_empty() {
        warn!("no environment variables listed for encryption");
        return Vec::new();
    }

    let sealer = Sealer {
        kms,
        key_id,
        scope,
        wanted: &config.env_variables_to_encrypt,
    };
    let mut outcomes = Vec::new();
    let document = descriptor.document_mut();

    if let Some(env) = document
        .get_mut("provider")
        .and_then(|p| p.get_mut("environment"))
        .and_then(Value::as_mapping_mut)
    {
        sealer.seal_block(env, "provider", &mut outcomes);
    }

    if let Some(functions) = document
        .get_mut("functions")
        .and_then(Value::as_mapping_mut)
    {
        for (name, function) in functions.iter_mut() {
            let block = format!("functions.{}", name.as_str().unwrap_or("?"));
            if let Some(env) = function
                .get_mut("environment")
                .and_then(Value::as_mapping_mut)
            {
                sealer.seal_block(env, &block, &mut outcomes);
            }
        }
    }

    debug!(encrypted = outcomes.len(), "environment sweep finished");
    outcomes
}

struct Sealer<'a> {
    kms: &'a dyn Kms,
    key_id: &'a str,
    scope: &'a Scope,
    wanted: &'a [String],
}

impl Sealer<'_> {
    fn seal_block(&self, env: &mut Mapping, block: &str, outcomes: &mut Vec<SweepOutcome>) {
        for (name, value) in env.iter_mut() {
            let Some(name) = name.as_str() else {
                continue;
            };
            if !self.wanted.iter().any(|w| w == name) {
                continue;
            }
            if value.as_str().is_some_and(|v| v.contains(UNRESOLVED_MARKER)) {
                debug!(block, variable = name, "skipping unresolved descriptor variable");
                continue;
            }

            let result = self.seal_value(name, value);
            if let Err(e) = &result {
                warn!(block, variable = name, error = %e, "failed to encrypt variable");
            }
            outcomes.push(SweepOutcome {
                block: block.to_string(),
                variable: name.to_string(),
                result,
            });
        }
    }

    fn seal_value(&self, name: &str, value: &mut Value) -> Result<()> {
        let plaintext = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "environment",
                    reason: format!("{} is not a plain value", name),
                }
                .into())
            }
        };

        let sealed = self
            .kms
            .encrypt(self.key_id, plaintext.as_bytes(), self.scope)?;
        *value = Value::String(cipher::encode_blob(&sealed.blob));
        Ok(())
    }
}
