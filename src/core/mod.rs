//! Core library components.
//!
//! This module contains the manifest engine and the encrypt/decrypt
//! transactions, independent of the command-line surface.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod manifest;
pub mod name;
pub mod sweep;
pub mod transaction;
pub mod types;
