//! kms-secrets - Encrypt variables with KMS into a per-stage secrets file.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kms_secrets::cli::output;
use kms_secrets::cli::{execute, Cli};
use kms_secrets::core::constants::LOG_ENV;
use kms_secrets::error::{Error, KmsError, ManifestError, SecretError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("kms_secrets=debug")
        } else {
            EnvFilter::new("kms_secrets=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.global) {
        // Format error with suggestion if available
        let suggestion = match &e {
            Error::Secret(SecretError::MissingKey { .. }) => {
                Some("run: kms-secrets encrypt --keyid <key> ...")
            }
            Error::Manifest(ManifestError::NotFound { .. }) => {
                Some("encrypt a variable first, or check --stage and --region")
            }
            Error::Kms(KmsError::Unavailable(_))
            | Error::Secret(SecretError::Kms {
                source: KmsError::Unavailable(_),
                ..
            }) => Some("rebuild with --features aws"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
