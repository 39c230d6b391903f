// crates/storage-diags-config/tests/common/mod.rs
// ============================================================================
// Module: Common Config Test Fixtures
// Description: Shared helpers for configuration tests.
// Purpose: Build configs from TOML snippets and write them to temp files.
// Dependencies: storage-diags-config, tempfile
// ============================================================================

//! ## Overview
//! Shared fixtures for the config integration tests.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use storage_diags_config::ConfigError;
use storage_diags_config::HarnessConfig;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Parses a TOML string into a `HarnessConfig`.
pub fn config_from_toml(toml_str: &str) -> Result<HarnessConfig, ConfigError> {
    HarnessConfig::from_toml(toml_str)
}

/// Returns a config with all defaults applied.
pub fn minimal_config() -> Result<HarnessConfig, ConfigError> {
    config_from_toml("")
}

/// Writes config text into a fresh temp directory.
pub fn write_config(contents: &[u8]) -> Result<(TempDir, PathBuf), String> {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("storage-diags.toml");
    fs::write(&path, contents).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts that a result failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
