// crates/storage-diags-core/src/core/playbook.rs
// ============================================================================
// Module: Storage Diags Playbook
// Description: Ordered scenario list with optional benchmark target reference.
// Purpose: Load and validate the playbook that drives one orchestrator run.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! A playbook is a JSON document naming the scenario files to execute, in
//! order, and optionally the benchmark target descriptor used by `PostDiag`.
//! Playbooks are immutable once loaded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ScenarioId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum playbook size in bytes.
pub const MAX_PLAYBOOK_BYTES: usize = 1024 * 1024;
/// Maximum number of scenarios in a single playbook.
pub const MAX_PLAYBOOK_STEPS: usize = 4096;

// ============================================================================
// SECTION: Playbook
// ============================================================================

/// Ordered scenario list plus an optional benchmark target reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playbook {
    /// Scenario identifiers in execution order.
    pub test_steps: Vec<ScenarioId>,
    /// Target descriptor identifier, resolved against the configs directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_targets: Option<String>,
}

impl Playbook {
    /// Parses a playbook from JSON text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybookError`] when the document is malformed or invalid.
    pub fn from_json(text: &str) -> Result<Self, PlaybookError> {
        let playbook: Self =
            serde_json::from_str(text).map_err(|err| PlaybookError::Parse(err.to_string()))?;
        playbook.validate()?;
        Ok(playbook)
    }

    /// Loads a playbook from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybookError`] when the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, PlaybookError> {
        let bytes = fs::read(path)
            .map_err(|err| PlaybookError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_PLAYBOOK_BYTES {
            return Err(PlaybookError::Invalid("playbook exceeds size limit".to_string()));
        }
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| PlaybookError::Invalid("playbook must be utf-8".to_string()))?;
        Self::from_json(text)
    }

    /// Returns the benchmark target reference when one is declared.
    #[must_use]
    pub fn benchmark_targets(&self) -> Option<&str> {
        self.benchmark_targets.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Validates playbook invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybookError::Invalid`] when a constraint is violated.
    pub fn validate(&self) -> Result<(), PlaybookError> {
        if self.test_steps.is_empty() {
            return Err(PlaybookError::Invalid("test_steps must not be empty".to_string()));
        }
        if self.test_steps.len() > MAX_PLAYBOOK_STEPS {
            return Err(PlaybookError::Invalid(format!(
                "test_steps exceeds limit of {MAX_PLAYBOOK_STEPS}"
            )));
        }
        if let Some(index) = self.test_steps.iter().position(|step| step.as_str().trim().is_empty())
        {
            return Err(PlaybookError::Invalid(format!("test_steps[{index}] is empty")));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Playbook loading errors.
#[derive(Debug, Error)]
pub enum PlaybookError {
    /// Playbook could not be read.
    #[error("playbook io error: {0}")]
    Io(String),
    /// Playbook JSON could not be parsed.
    #[error("playbook parse error: {0}")]
    Parse(String),
    /// Playbook content violates a constraint.
    #[error("invalid playbook: {0}")]
    Invalid(String),
}
