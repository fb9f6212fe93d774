//! kms-secrets - KMS-encrypted secrets kept in a YAML manifest next to your service.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── encrypt       # Encrypt one variable into the manifest
//! │   ├── decrypt       # Decrypt one or all variables
//! │   ├── sweep         # Auto-encrypt descriptor environment variables
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # Deployment descriptor and module configuration
//!     ├── cipher/       # KMS capability
//!     │   ├── mod       # Kms trait
//!     │   ├── backend   # Backend selection
//!     │   └── aws       # AWS KMS implementation (feature `aws`)
//!     ├── manifest/     # On-disk manifest
//!     │   ├── mod       # Manifest model and location
//!     │   └── store     # Load, save and lock
//!     ├── name          # Composite `outer:inner` names
//!     ├── transaction   # Encrypt and decrypt operations
//!     └── sweep         # Environment variable auto-encryption
//! ```
//!
//! # Manifest
//!
//! ```yaml
//! keyArn: arn:aws:kms:us-east-1:123456789012:key/abc-123
//! secrets:
//!   DATABASE_URL: AQICAHh...
//! ```
//!
//! With `perStage: true` one file per region holds every stage, keyed by stage name.

pub mod cli;
pub mod core;
pub mod error;
