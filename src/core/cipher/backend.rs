//! Backend selection.

use std::time::Duration;

use tracing::debug;
use zeroize::Zeroizing;

use super::{Kms, Sealed};
use crate::core::types::Scope;
use crate::error::{KmsError, Result};

/// Client settings handed to the KMS backend at construction.
///
/// There is no process-wide SDK configuration; everything a backend needs
/// comes from here and the [`Scope`] of each call.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    /// Named credentials profile, default chain when `None`.
    pub profile: Option<String>,
    /// Per-call deadline; an expired call fails the operation.
    pub timeout: Option<Duration>,
    /// Endpoint override (e.g. a local KMS emulator).
    pub endpoint: Option<String>,
}

/// Backend used when no KMS support is compiled in.
///
/// Every call fails, so operations that never reach KMS (resolving paths,
/// reporting a missing key or manifest) still behave normally.
#[derive(Debug, Default)]
pub struct Unavailable;

impl Unavailable {
    fn error() -> KmsError {
        KmsError::Unavailable(
            "AWS KMS not compiled. Rebuild with: cargo install kms-secrets --features aws"
                .to_string(),
        )
    }
}

impl Kms for Unavailable {
    fn encrypt(&self, _key_id: &str, _plaintext: &[u8], _scope: &Scope) -> Result<Sealed> {
        Err(Self::error().into())
    }

    fn decrypt(&self, _blob: &[u8], _scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
        Err(Self::error().into())
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Create the KMS backend for this build.
///
/// # Errors
///
/// Returns `KmsError::Unavailable` if the compiled backend cannot start.
#[allow(unused_variables)]
pub fn default_backend(settings: AwsSettings) -> Result<Box<dyn Kms>> {
    #[cfg(feature = "aws")]
    {
        debug!(profile = ?settings.profile, "creating aws kms backend");
        return Ok(Box::new(super::aws::AwsKms::new(settings)?));
    }

    #[cfg(not(feature = "aws"))]
    {
        debug!("no kms backend compiled");
        Ok(Box::new(Unavailable))
    }
}
