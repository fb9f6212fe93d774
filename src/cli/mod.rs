//! Command-line interface.

pub mod completions;
pub mod decrypt;
pub mod encrypt;
pub mod output;
pub mod sweep;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::core::cipher::{self, AwsSettings, Kms};
use crate::core::config::{Descriptor, ModuleConfig};
use crate::core::constants::DESCRIPTOR_FILE;
use crate::core::transaction::Transaction;
use crate::error::Result;

/// kms-secrets - Encrypt variables with KMS into a per-stage secrets file.
#[derive(Parser)]
#[command(
    name = "kms-secrets",
    about = "Encrypt variables with KMS into a per-stage secrets file",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Deployment descriptor holding the module configuration
    #[arg(short, long, global = true, default_value = DESCRIPTOR_FILE)]
    pub config: PathBuf,

    /// Show debug output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// AWS credentials profile
    #[arg(long, global = true, env = "KMS_SECRETS_PROFILE")]
    pub profile: Option<String>,

    /// Deadline for each KMS call, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// KMS endpoint override
    #[arg(long, global = true, env = "KMS_SECRETS_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Stage and region selection.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Stage (defaults to provider.stage, then dev)
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Region (defaults to provider.region, then us-east-1)
    #[arg(short, long)]
    pub region: Option<String>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Encrypt variables to file
    Encrypt {
        /// Name of variable (use outer:inner for a field of a JSON object)
        #[arg(short, long)]
        name: String,
        /// Value of variable
        #[arg(short, long)]
        value: String,
        /// KMS key id, alias or ARN
        #[arg(short, long = "keyid")]
        key_id: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Decrypt variables from file
    Decrypt {
        /// Name of variable (all variables when omitted)
        #[arg(short, long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Encrypt listed environment variables in the descriptor
    Sweep {
        /// Write the result to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Everything a command needs: descriptor, module configuration, KMS.
pub struct Context {
    pub descriptor: Descriptor,
    pub config: ModuleConfig,
    pub kms: Box<dyn Kms>,
}

impl Context {
    /// Load the descriptor named by `global` and create the KMS backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the descriptor is unreadable or malformed.
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let descriptor = Descriptor::load(&global.config)?;
        let config = descriptor.module_config()?;
        let kms = cipher::default_backend(AwsSettings {
            profile: global.profile.clone(),
            timeout: global.timeout.map(Duration::from_secs),
            endpoint: global.endpoint.clone(),
        })?;

        Ok(Self {
            descriptor,
            config,
            kms,
        })
    }

    /// Transaction for the scope selected on the command line.
    pub fn transaction(&self, scope: &ScopeArgs) -> Transaction<'_> {
        let scope = self
            .descriptor
            .scope(scope.stage.as_deref(), scope.region.as_deref());
        let tx = Transaction::new(self.kms.as_ref(), &self.config, scope);
        match self.descriptor.base_dir() {
            Some(dir) => tx.in_dir(dir),
            None => tx,
        }
    }
}

/// Execute a command.
pub fn execute(command: Command, global: &GlobalArgs) -> Result<()> {
    use Command::*;

    match command {
        Encrypt {
            name,
            value,
            key_id,
            scope,
        } => {
            let ctx = Context::open(global)?;
            encrypt::execute(&ctx, &scope, &name, &value, key_id.as_deref())
        }
        Decrypt { name, json, scope } => {
            let ctx = Context::open(global)?;
            decrypt::execute(&ctx, &scope, name.as_deref(), json)
        }
        Sweep { output, scope } => {
            let ctx = Context::open(global)?;
            sweep::execute(&ctx, &scope, output.as_deref(), &mut std::io::stdout())
        }
        Completions { shell } => completions::execute(shell, &mut std::io::stdout()),
    }
}
