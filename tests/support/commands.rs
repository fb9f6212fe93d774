//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kms-secrets command running in the service directory.
    ///
    /// Colors and inherited log filters are disabled so output is stable.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kms-secrets").expect("failed to find kms-secrets binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("KMS_SECRETS_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `kms-secrets encrypt`.
    pub fn encrypt_cmd(&self, name: &str, value: &str, extra: &[&str]) -> Output {
        self.cmd()
            .args(["encrypt", "-n", name, "-v", value])
            .args(extra)
            .output()
            .expect("failed to run kms-secrets encrypt")
    }

    /// Shortcut for `kms-secrets decrypt`.
    pub fn decrypt_cmd(&self, extra: &[&str]) -> Output {
        self.cmd()
            .arg("decrypt")
            .args(extra)
            .output()
            .expect("failed to run kms-secrets decrypt")
    }
}
