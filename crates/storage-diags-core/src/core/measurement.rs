// crates/storage-diags-core/src/core/measurement.rs
// ============================================================================
// Module: Storage Diags Measurements
// Description: Parsed load-generator output captured per scenario and device.
// Purpose: Hold raw and structured tool output and answer the verdict rule.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`MeasurementRecord`] keeps the raw tool output verbatim (for the audit
//! trail emitted by `Report`) next to the parsed JSON document. The document
//! is keyed by `jobs[0].<io class>` with `bw` and `clat_ns.percentile` inside.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ScenarioId;

// ============================================================================
// SECTION: I/O Classes
// ============================================================================

/// I/O class reported by the load generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoClass {
    /// Read I/O.
    Read,
    /// Write I/O.
    Write,
    /// Trim (deallocate) I/O.
    Trim,
}

impl IoClass {
    /// Supported classes in matching order.
    pub const ALL: [Self; 3] = [Self::Read, Self::Write, Self::Trim];

    /// Returns the key used by the load generator for this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Trim => "trim",
        }
    }

    /// Classifies a declared I/O type (for example `randread`) by suffix.
    ///
    /// Returns `None` unless exactly one supported class is a suffix.
    #[must_use]
    pub fn from_io_type(io_type: &str) -> Option<Self> {
        let mut matches = Self::ALL.into_iter().filter(|class| io_type.ends_with(class.as_str()));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

impl fmt::Display for IoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Measurement Record
// ============================================================================

/// Output of one scenario execution against one device.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// Scenario that produced the output.
    scenario: ScenarioId,
    /// Raw tool output, kept verbatim.
    raw: String,
    /// Parsed JSON document.
    document: Value,
}

impl MeasurementRecord {
    /// Parses raw tool output into a record.
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::Parse`] when the output is not JSON. The
    /// error hands the raw output back so it can still be persisted.
    pub fn parse(scenario: ScenarioId, raw: String) -> Result<Self, MeasurementError> {
        match serde_json::from_str(&raw) {
            Ok(document) => Ok(Self::new(scenario, raw, document)),
            Err(err) => Err(MeasurementError::Parse {
                reason: err.to_string(),
                raw,
            }),
        }
    }

    /// Builds a record from output that was already parsed.
    #[must_use]
    pub const fn new(scenario: ScenarioId, raw: String, document: Value) -> Self {
        Self {
            scenario,
            raw,
            document,
        }
    }

    /// Returns the scenario identifier.
    #[must_use]
    pub const fn scenario(&self) -> &ScenarioId {
        &self.scenario
    }

    /// Returns the raw tool output.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed document.
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.document
    }

    /// Returns the error count of the first job, if present and numeric.
    #[must_use]
    pub fn first_job_error_count(&self) -> Option<u64> {
        first_job(&self.document)?.get("error")?.as_u64()
    }

    /// Applies the scenario verdict rule: absent or nonzero error count fails.
    #[must_use]
    pub fn reports_failure(&self) -> bool {
        self.first_job_error_count().is_none_or(|count| count != 0)
    }
}

/// Returns the first job entry of a load-generator document.
#[must_use]
pub fn first_job(document: &Value) -> Option<&Value> {
    document.get("jobs")?.as_array()?.first()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Measurement parsing errors.
#[derive(Debug, Error)]
pub enum MeasurementError {
    /// Tool output was not a JSON document.
    #[error("tool output is not valid json: {reason}")]
    Parse {
        /// Parser error message.
        reason: String,
        /// Unparsed tool output.
        raw: String,
    },
}

impl MeasurementError {
    /// Returns the tool output that failed to parse.
    #[must_use]
    pub fn into_raw(self) -> String {
        match self {
            Self::Parse {
                raw, ..
            } => raw,
        }
    }
}
