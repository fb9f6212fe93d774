//! Test support utilities for kms-secrets integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod kms;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use kms::{DenyingKms, FakeKms};

use std::path::PathBuf;

use kms_secrets::core::config::ModuleConfig;
use kms_secrets::core::transaction::Transaction;
use kms_secrets::core::types::Scope;
use tempfile::TempDir;

/// Test environment with an isolated service directory.
///
/// No process-global state is mutated: library calls anchor manifests with
/// `Transaction::in_dir` and child processes use `.current_dir()`, so tests
/// can safely run in parallel.
pub struct Test {
    /// Temporary service directory
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    pub kms: FakeKms,
    pub config: ModuleConfig,
}

impl Test {
    /// Create a new empty test environment with default module configuration.
    pub fn new() -> Self {
        Self::with_config(ModuleConfig::default())
    }

    /// Create a test environment with the given module configuration.
    pub fn with_config(config: ModuleConfig) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self {
            dir,
            home,
            kms: FakeKms::default(),
            config,
        }
    }

    /// Transaction for `stage` in the default test region.
    pub fn tx(&self, stage: &str) -> Transaction<'_> {
        Transaction::new(&self.kms, &self.config, Scope::new(stage, REGION)).in_dir(self.dir.path())
    }

    /// Path of a file inside the service directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file inside the service directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("failed to write test file");
        path
    }

    /// Read a file inside the service directory.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("failed to read test file")
    }

    /// Names of all files in the service directory, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("failed to list temp dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
