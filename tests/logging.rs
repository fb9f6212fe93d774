//! Logging and verbosity tests.
//!
//! These tests verify that the verbose flag and the logging environment
//! variable control diagnostic output on stderr.

mod support;
use support::*;

#[test]
fn test_verbose_flag_shows_debug_output() {
    let t = Test::new();
    t.write(DEV_MANIFEST, LEGACY_MANIFEST);

    let output = t.cmd().args(["--verbose", "decrypt"]).output().unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "DEBUG");
    assert_stderr_contains(&output, "decrypting secrets");
}

#[test]
fn test_default_no_log_output() {
    let t = Test::new();
    t.write(DEV_MANIFEST, LEGACY_MANIFEST);

    let output = t.decrypt_cmd(&[]);
    assert_success(&output);

    let err = stderr(&output);
    assert!(
        !err.contains("DEBUG") && !err.contains("TRACE"),
        "default mode should not show debug/trace output: {}",
        err
    );
}

#[test]
fn test_log_env_var() {
    let t = Test::new();
    t.write(DEV_MANIFEST, LEGACY_MANIFEST);

    let output = t
        .cmd()
        .env("KMS_SECRETS_LOG", "kms_secrets=trace")
        .arg("decrypt")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "TRACE");
}

#[test]
fn test_secret_values_not_logged() {
    let t = Test::new();
    let output = t
        .cmd()
        .env("KMS_SECRETS_LOG", "trace")
        .args(["encrypt", "-n", "API_KEY", "-v", "do-not-log-me"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(!stderr(&output).contains("do-not-log-me"));
}
