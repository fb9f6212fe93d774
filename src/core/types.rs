//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A stored secret name (never contains `:`).
pub type SecretName = String;

/// Base64-encoded KMS ciphertext as written to the manifest.
pub type EncodedCiphertext = String;

/// A KMS key identifier: bare key id, alias, or full ARN.
pub type KeyId = String;

/// A deployment stage name (e.g. `dev`, `prod`).
pub type Stage = String;

/// The stage and region an operation is addressed to.
///
/// Selects the manifest file and is handed to the KMS backend with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub stage: Stage,
    pub region: String,
}

impl Scope {
    pub fn new(stage: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.stage, self.region)
    }
}
