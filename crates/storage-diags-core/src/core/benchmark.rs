// crates/storage-diags-core/src/core/benchmark.rs
// ============================================================================
// Module: Storage Diags Benchmark Targets
// Description: Target descriptor documents and evaluation results.
// Purpose: Define the declared performance targets and failure records.
// Dependencies: crate::core::measurement, serde, serde_json
// ============================================================================

//! ## Overview
//! Target descriptors declare per-workload thresholds in tool-native units
//! (latency in microseconds, bandwidth in MB/s) using camel-case metric names
//! such as `lat999thUsec` and `bwMbytesPerSec`. Threshold values are encoded
//! as strings in published descriptors; plain JSON integers are accepted too.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::measurement::IoClass;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum target descriptor size in bytes.
pub const MAX_TARGET_DESCRIPTOR_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Descriptor Types
// ============================================================================

/// Benchmark target descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// Benchmark name.
    pub basename: String,
    /// Declared workloads in order.
    pub workloads: Vec<WorkloadDeclaration>,
}

impl TargetDescriptor {
    /// Parses a descriptor from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::Parse`] when the document is malformed.
    pub fn from_json(text: &str) -> Result<Self, BenchmarkError> {
        serde_json::from_str(text).map_err(|err| BenchmarkError::Parse(err.to_string()))
    }

    /// Loads a descriptor from disk.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, BenchmarkError> {
        let bytes = fs::read(path)
            .map_err(|err| BenchmarkError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_TARGET_DESCRIPTOR_BYTES {
            return Err(BenchmarkError::Parse("target descriptor exceeds size limit".to_string()));
        }
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| BenchmarkError::Parse("target descriptor must be utf-8".to_string()))?;
        Self::from_json(text)
    }
}

/// One declared workload inside a target descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDeclaration {
    /// Declared I/O type, classified by suffix (for example `randwrite`).
    pub io_type: String,
    /// Workload identifier.
    pub workload_num: u32,
    /// Namespace number; accepted and not used for evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_num: Option<u32>,
    /// Declared metric name to threshold.
    pub targets: BTreeMap<String, TargetValue>,
}

/// Threshold value as declared: a string-encoded or plain integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
    /// String-encoded number, for example `"7000"`.
    Text(String),
    /// Plain JSON integer.
    Integer(u64),
}

impl TargetValue {
    /// Returns the threshold as an integer in declared units.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Text(text) => text.trim().parse().ok(),
            Self::Integer(value) => Some(*value),
        }
    }
}

// ============================================================================
// SECTION: Evaluation Results
// ============================================================================

/// Failed metrics for one workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWorkload {
    /// I/O class of the workload.
    pub io_type: IoClass,
    /// Workload identifier.
    pub workload_id: u32,
    /// Failed metrics using declared naming.
    pub failed_metrics: Vec<String>,
}

impl FailedWorkload {
    /// Formats the workload as `<id>: <io_type> <metric, metric>`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{}: {} {}", self.workload_id, self.io_type, self.failed_metrics.join(", "))
    }
}

/// Result of one evaluation pass of a benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBenchmark {
    /// Benchmark name.
    pub name: String,
    /// Workloads with at least one failed metric.
    pub failed_workloads: Vec<FailedWorkload>,
}

impl FailedBenchmark {
    /// Returns true when no workload failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed_workloads.is_empty()
    }

    /// Returns one summary line per failed workload.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.failed_workloads.iter().map(FailedWorkload::summary_line).collect()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Target descriptor errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenchmarkError {
    /// Descriptor could not be read.
    #[error("target descriptor io error: {0}")]
    Io(String),
    /// Descriptor JSON is malformed.
    #[error("target descriptor parse error: {0}")]
    Parse(String),
    /// Declared I/O type does not end in exactly one supported class.
    #[error("workload {workload}: unsupported io type '{io_type}'")]
    UnsupportedIoType {
        /// Workload identifier.
        workload: u32,
        /// Declared I/O type.
        io_type: String,
    },
    /// Declared metric name is not in the naming table.
    #[error("workload {workload}: unknown metric '{metric}'")]
    UnknownMetric {
        /// Workload identifier.
        workload: u32,
        /// Declared metric name.
        metric: String,
    },
    /// Threshold is not a non-negative integer.
    #[error("workload {workload}: metric '{metric}' has non-numeric threshold")]
    InvalidThreshold {
        /// Workload identifier.
        workload: u32,
        /// Declared metric name.
        metric: String,
    },
    /// Unit conversion overflowed.
    #[error("workload {workload}: metric '{metric}' threshold overflows after unit conversion")]
    ThresholdOverflow {
        /// Workload identifier.
        workload: u32,
        /// Declared metric name.
        metric: String,
    },
}
