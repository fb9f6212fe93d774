//! Assertions over finished `kms-secrets` processes.

use std::process::Output;

/// Exit status plus both streams, for failure messages.
fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\n--- stdout ---\n{}\n--- stderr ---\n{}",
        output.status.code(),
        stdout(output),
        stderr(output)
    )
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// The process exited with status 0.
pub fn assert_success(output: &Output) {
    assert!(output.status.success(), "expected success\n{}", describe(output));
}

/// The process exited with status 1, the code every handled error uses.
///
/// Argument errors from clap exit with 2 and are accepted too.
pub fn assert_failure(output: &Output) {
    assert!(
        matches!(output.status.code(), Some(1) | Some(2)),
        "expected failure\n{}",
        describe(output)
    );
}

pub fn assert_stdout_contains(output: &Output, needle: &str) {
    assert!(
        stdout(output).contains(needle),
        "stdout does not contain {:?}\n{}",
        needle,
        describe(output)
    );
}

pub fn assert_stderr_contains(output: &Output, needle: &str) {
    assert!(
        stderr(output).contains(needle),
        "stderr does not contain {:?}\n{}",
        needle,
        describe(output)
    );
}
