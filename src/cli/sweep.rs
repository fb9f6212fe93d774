//! Sweep command.
//!
//! The descriptor on disk is only written when `--output` names it; by
//! default the encrypted document goes to stdout.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::cli::{output, Context, ScopeArgs};
use crate::core::sweep;
use crate::error::{Result, SecretError};

/// Encrypt the configured environment variables of the descriptor.
///
/// The result is written to `target` when given, otherwise to `out`.
/// Progress and failures are reported on stderr.
pub fn execute(
    ctx: &Context,
    scope: &ScopeArgs,
    target: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let scope = ctx
        .descriptor
        .scope(scope.stage.as_deref(), scope.region.as_deref());
    let mut descriptor = ctx.descriptor.clone();

    let outcomes = sweep::encrypt_environment(&mut descriptor, &ctx.config, ctx.kms.as_ref(), &scope);
    if outcomes.is_empty() {
        output::warn("no environment variables encrypted");
        return Ok(());
    }

    for outcome in &outcomes {
        let label = format!("{}.{}", outcome.block, outcome.variable);
        match &outcome.result {
            Ok(()) => debug!(variable = %label, "encrypted"),
            Err(e) => output::error(&format!("{}: {}", label, e)),
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed < outcomes.len() {
        match target {
            Some(target) => {
                descriptor.save_to(target)?;
                output::hint(&format!(
                    "encrypted {} variables into {}",
                    outcomes.len() - failed,
                    output::path(target)
                ));
            }
            None => {
                out.write_all(descriptor.to_yaml()?.as_bytes())?;
                out.flush()?;
            }
        }
    }

    if failed > 0 {
        return Err(SecretError::Incomplete {
            failed,
            total: outcomes.len(),
        }
        .into());
    }
    Ok(())
}
