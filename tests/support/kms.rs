//! Recording fake KMS backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use kms_secrets::core::cipher::{Kms, Sealed};
use kms_secrets::core::types::Scope;
use kms_secrets::error::{KmsError, Result};
use zeroize::Zeroizing;

/// Fake KMS that hex-encodes plaintext and binds ciphertext to its region.
///
/// NOT cryptographically secure. Blobs look like `fake:<region>:<hex>`, so a
/// blob decrypted in another region fails just like real KMS would.
#[derive(Debug, Default)]
pub struct FakeKms {
    encrypts: AtomicUsize,
    decrypts: AtomicUsize,
    scopes: Mutex<Vec<Scope>>,
}

impl FakeKms {
    pub fn encrypt_calls(&self) -> usize {
        self.encrypts.load(Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }

    /// Scopes of every call so far, in call order.
    pub fn scopes(&self) -> Vec<Scope> {
        self.scopes.lock().unwrap().clone()
    }

    fn record(&self, scope: &Scope) {
        self.scopes.lock().unwrap().push(scope.clone());
    }
}

impl Kms for FakeKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8], scope: &Scope) -> Result<Sealed> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        self.record(scope);

        let hex: String = plaintext.iter().map(|b| format!("{:02x}", b)).collect();
        let key_id = if key_id.starts_with("arn:") {
            key_id.to_string()
        } else {
            format!("arn:aws:kms:{}:111122223333:key/{}", scope.region, key_id)
        };
        Ok(Sealed {
            blob: format!("fake:{}:{}", scope.region, hex).into_bytes(),
            key_id,
        })
    }

    fn decrypt(&self, blob: &[u8], scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        self.record(scope);

        let text = std::str::from_utf8(blob)
            .map_err(|_| KmsError::Decrypt("InvalidCiphertextException".to_string()))?;
        let prefix = format!("fake:{}:", scope.region);
        let hex = text
            .strip_prefix(&prefix)
            .ok_or_else(|| KmsError::Decrypt("InvalidCiphertextException".to_string()))?;
        if hex.len() % 2 != 0 {
            return Err(KmsError::Decrypt("InvalidCiphertextException".to_string()).into());
        }

        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| KmsError::Decrypt("InvalidCiphertextException".to_string()))?;
        Ok(Zeroizing::new(bytes))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// KMS that rejects every call, as with a key the caller may not use.
#[derive(Debug, Default)]
pub struct DenyingKms;

impl Kms for DenyingKms {
    fn encrypt(&self, _key_id: &str, _plaintext: &[u8], _scope: &Scope) -> Result<Sealed> {
        Err(KmsError::Encrypt("AccessDeniedException".to_string()).into())
    }

    fn decrypt(&self, _blob: &[u8], _scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
        Err(KmsError::Decrypt("AccessDeniedException".to_string()).into())
    }

    fn name(&self) -> &'static str {
        "denying"
    }
}
