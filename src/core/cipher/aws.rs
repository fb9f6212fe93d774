//! AWS KMS backend.
//!
//! Enable with `--features aws`. Credentials come from the default provider
//! chain (environment, shared config, instance role) or the profile named in
//! [`AwsSettings`]. One SDK client is built per region and reused.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::Client;
use tokio::runtime::Runtime;
use tracing::trace;
use zeroize::Zeroizing;

use super::{AwsSettings, Kms, Sealed};
use crate::core::types::Scope;
use crate::error::{KmsError, Result};

/// AWS KMS backend.
///
/// KMS stores the key reference inside the ciphertext, so decryption does
/// not need a key id.
pub struct AwsKms {
    settings: AwsSettings,
    runtime: Runtime,
    clients: Mutex<HashMap<String, Client>>,
}

impl std::fmt::Debug for AwsKms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKms")
            .field("settings", &self.settings)
            .finish()
    }
}

impl AwsKms {
    /// Create the backend and its runtime.
    ///
    /// # Errors
    ///
    /// Returns `KmsError::Unavailable` if the async runtime cannot be created.
    pub fn new(settings: AwsSettings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| KmsError::Unavailable(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            settings,
            runtime,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Client for `region`, built on first use.
    fn client(&self, region: &str) -> Client {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = clients.get(region) {
            return client.clone();
        }

        trace!(region, profile = ?self.settings.profile, "building kms client");
        let client = self.runtime.block_on(async {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.to_string()));
            if let Some(profile) = &self.settings.profile {
                loader = loader.profile_name(profile);
            }
            let shared = loader.load().await;

            let mut config = aws_sdk_kms::config::Builder::from(&shared);
            if let Some(endpoint) = &self.settings.endpoint {
                config = config.endpoint_url(endpoint);
            }
            Client::from_conf(config.build())
        });

        clients.insert(region.to_string(), client.clone());
        client
    }

    /// Drive `call` to completion, honouring the configured timeout.
    fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.settings.timeout {
            Some(limit) => self.runtime.block_on(async {
                tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| KmsError::Timeout(limit))?
            }),
            None => self.runtime.block_on(call),
        }
    }
}

impl Kms for AwsKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8], scope: &Scope) -> Result<Sealed> {
        trace!(
            key_id,
            stage = %scope.stage,
            region = %scope.region,
            plaintext_len = plaintext.len(),
            "encrypting with AWS KMS"
        );

        let client = self.client(&scope.region);
        let output = self.run(async {
            client
                .encrypt()
                .key_id(key_id)
                .plaintext(Blob::new(plaintext))
                .send()
                .await
                .map_err(|e| KmsError::Encrypt(format!("{} (key {})", e, key_id)).into())
        })?;

        let blob = output
            .ciphertext_blob()
            .ok_or_else(|| KmsError::Encrypt("no ciphertext returned".into()))?
            .as_ref()
            .to_vec();
        let resolved = output.key_id().unwrap_or(key_id).to_string();

        trace!(ciphertext_len = blob.len(), key_id = %resolved, "encrypted with AWS KMS");
        Ok(Sealed {
            blob,
            key_id: resolved,
        })
    }

    fn decrypt(&self, blob: &[u8], scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
        trace!(
            stage = %scope.stage,
            region = %scope.region,
            ciphertext_len = blob.len(),
            "decrypting with AWS KMS"
        );

        let client = self.client(&scope.region);
        let output = self.run(async {
            client
                .decrypt()
                .ciphertext_blob(Blob::new(blob))
                .send()
                .await
                .map_err(|e| KmsError::Decrypt(e.to_string()).into())
        })?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| KmsError::Decrypt("no plaintext returned".into()))?;

        trace!(plaintext_len = plaintext.as_ref().len(), "decrypted with AWS KMS");
        Ok(Zeroizing::new(plaintext.as_ref().to_vec()))
    }

    fn name(&self) -> &'static str {
        "aws-kms"
    }
}
