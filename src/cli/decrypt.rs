//! Decrypt command.

use crate::cli::{output, Context, ScopeArgs};
use crate::error::{Result, SecretError};

/// Decrypt one variable, or all of them, and print the plaintext.
///
/// Entries that fail are reported individually; the command fails at the
/// end if any did.
pub fn execute(ctx: &Context, scope: &ScopeArgs, name: Option<&str>, json: bool) -> Result<()> {
    let tx = ctx.transaction(scope);
    let entries = tx.decrypt(name)?;

    if json {
        let rendered: Vec<_> = entries
            .iter()
            .map(|entry| match entry.value() {
                Ok(value) => serde_json::json!({ "name": entry.name, "value": value }),
                Err(e) => serde_json::json!({ "name": entry.name, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else if entries.is_empty() {
        output::dimmed(&format!(
            "no secrets stored in {}",
            tx.location().path().display()
        ));
    } else {
        for entry in &entries {
            match entry.value() {
                Ok(value) => output::secret(&entry.name, value),
                Err(e) => output::error(&format!("{}: {}", entry.name, e)),
            }
        }
    }

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    if failed > 0 {
        return Err(SecretError::Incomplete {
            failed,
            total: entries.len(),
        }
        .into());
    }
    Ok(())
}
