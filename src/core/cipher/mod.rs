//! KMS capability.
//!
//! The manifest engine only needs two calls from a key management service:
//! encrypt some bytes under a key and decrypt a blob the service produced.
//! Both are addressed to a [`Scope`] so a backend can pick the right region
//! or credentials.
//!
//! ## Backends
//!
//! - **AWS KMS**: Feature-gated (`aws`). Uses the AWS SDK with the default
//!   credential chain or a named profile.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Kms` trait
//! 2. Add the implementation in a new file (e.g., `gcp.rs`)
//! 3. Feature-gate it and select it in `backend::default_backend`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::core::types::{KeyId, Scope};
use crate::error::{Result, SecretError};

mod backend;

#[cfg(feature = "aws")]
pub mod aws;

pub use backend::{default_backend, AwsSettings, Unavailable};

/// Ciphertext returned by a KMS encrypt call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Opaque ciphertext blob.
    pub blob: Vec<u8>,
    /// Key the service actually used, usually a full ARN.
    pub key_id: KeyId,
}

/// Key management service trait.
///
/// Implementations must be shareable across threads: decrypt batches fan
/// calls out over a small worker pool.
pub trait Kms: std::fmt::Debug + Send + Sync {
    /// Encrypt `plaintext` under `key_id`.
    ///
    /// # Errors
    ///
    /// Returns `KmsError` if the service rejects the call or cannot be reached.
    fn encrypt(&self, key_id: &str, plaintext: &[u8], scope: &Scope) -> Result<Sealed>;

    /// Decrypt a blob previously produced by [`Kms::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `KmsError` if the service rejects the call or cannot be reached.
    fn decrypt(&self, blob: &[u8], scope: &Scope) -> Result<Zeroizing<Vec<u8>>>;

    /// Backend name for display.
    fn name(&self) -> &'static str;
}

/// Encode a ciphertext blob for the manifest.
pub fn encode_blob(blob: &[u8]) -> String {
    STANDARD.encode(blob)
}

/// Decode the manifest form of a ciphertext blob.
///
/// # Errors
///
/// Returns `SecretError::InvalidCiphertext` naming `name` if `encoded` is not
/// valid base64.
pub fn decode_blob(name: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded.trim()).map_err(|e| {
        SecretError::InvalidCiphertext {
            name: name.to_string(),
            reason: format!("invalid base64: {}", e),
        }
        .into()
    })
}

/// Mock KMS backend for testing.
///
/// Uses simple hex encoding with prefix, NOT cryptographically secure.
/// Counts calls so tests can assert how often the service was hit.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockKms {
    pub encrypts: std::sync::atomic::AtomicUsize,
    pub decrypts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockKms {
    pub fn encrypt_calls(&self) -> usize {
        self.encrypts.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Kms for MockKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8], scope: &Scope) -> Result<Sealed> {
        self.encrypts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let hex: String = plaintext.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(Sealed {
            blob: format!("mock-kms:{}", hex).into_bytes(),
            key_id: format!("arn:aws:kms:{}:000000000000:key/{}", scope.region, key_id),
        })
    }

    fn decrypt(&self, blob: &[u8], _scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
        use crate::error::KmsError;

        self.decrypts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let text = std::str::from_utf8(blob)
            .map_err(|e| KmsError::Decrypt(format!("invalid utf8: {}", e)))?;
        let hex = text
            .strip_prefix("mock-kms:")
            .ok_or_else(|| KmsError::Decrypt("not a mock-kms ciphertext".to_string()))?;
        if hex.len() % 2 != 0 {
            return Err(KmsError::Decrypt("odd hex length".to_string()).into());
        }
        let bytes: std::result::Result<Vec<u8>, _> = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect();
        let bytes = bytes.map_err(|e| KmsError::Decrypt(format!("invalid hex: {}", e)))?;
        Ok(Zeroizing::new(bytes))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
