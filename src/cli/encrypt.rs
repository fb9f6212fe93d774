//! Encrypt command.

use crate::cli::{output, Context, ScopeArgs};
use crate::error::Result;

/// Encrypt one variable into the manifest.
pub fn execute(
    ctx: &Context,
    scope: &ScopeArgs,
    name: &str,
    value: &str,
    key_id: Option<&str>,
) -> Result<()> {
    let tx = ctx.transaction(scope);
    let encrypted = tx.encrypt(name, value, key_id)?;

    output::success(&format!(
        "updated {} in {}",
        output::key(&encrypted.name),
        output::path(&encrypted.path)
    ));
    output::dimmed(&format!("key: {}", encrypted.key_id));
    Ok(())
}
