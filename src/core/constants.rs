//! Constants used throughout kms-secrets.
//!
//! Centralizes magic strings and configuration values.

/// Prefix of every generated manifest file name.
pub const MANIFEST_PREFIX: &str = "kms-secrets";

/// Extension of generated manifest file names.
pub const MANIFEST_EXTENSION: &str = "yml";

/// Extension appended to a manifest path to form its lock file.
pub const LOCK_EXTENSION: &str = "lock";

/// Default deployment descriptor.
pub const DESCRIPTOR_FILE: &str = "serverless.yml";

/// Section of `custom` holding the module configuration.
pub const CONFIG_SECTION: &str = "serverless-kms-secrets";

/// Legacy section name, read when [`CONFIG_SECTION`] is absent.
pub const LEGACY_CONFIG_SECTION: &str = "kmsSecrets";

/// Stage used when neither the command line nor the descriptor names one.
pub const DEFAULT_STAGE: &str = "dev";

/// Region used when neither the command line nor the descriptor names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Separator between the outer and inner part of a composite name.
pub const COMPOSITE_SEPARATOR: char = ':';

/// Upper bound on concurrent KMS decrypt calls in a batch.
pub const DECRYPT_CONCURRENCY: usize = 8;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KMS_SECRETS_LOG";

/// Start of a framework variable the descriptor has not resolved yet.
pub const UNRESOLVED_MARKER: &str = "${";
