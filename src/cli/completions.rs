//! Completions command.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::error::Result;

/// Write the completion script for `shell` to `out`.
pub fn execute(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_names_subcommands() {
        let mut out = Vec::new();
        execute(Shell::Bash, &mut out).unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("kms-secrets"));
        assert!(script.contains("encrypt"));
        assert!(script.contains("decrypt"));
    }
}
