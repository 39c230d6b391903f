// crates/storage-diags-core/src/core/report.rs
// ============================================================================
// Module: Storage Diags Report Artifacts
// Description: Structured test-run and test-step artifacts.
// Purpose: Define the JSON-lines records emitted for every run and step.
// Dependencies: crate::core::dut, serde
// ============================================================================

//! ## Overview
//! Report records follow the open compute test-and-validation layout: each
//! line carries a sequence number, a millisecond timestamp, and exactly one
//! `testRunArtifact` or `testStepArtifact`. Variants are stable for downstream
//! parsers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::dut::DutInfo;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Debug detail.
    Debug,
    /// Informational message.
    Info,
    /// Tolerated problem.
    Warning,
    /// Error affecting the current step.
    Error,
    /// Error aborting the run.
    Fatal,
}

/// Diagnosis verdict type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisType {
    /// Check passed.
    Pass,
    /// Check failed.
    Fail,
}

/// Completion status of a run or step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    /// Finished normally.
    Complete,
    /// Finished with an error.
    Error,
    /// Not executed.
    Skip,
}

/// Overall result of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    /// Every diagnosis passed.
    Pass,
    /// At least one diagnosis failed.
    Fail,
    /// No diagnosis was recorded.
    NotApplicable,
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// One emitted report line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Monotonic sequence number per reporter.
    pub sequence_number: u64,
    /// Emission time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Artifact payload.
    #[serde(flatten)]
    pub artifact: ReportArtifact,
}

/// Run- or step-scoped artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportArtifact {
    /// Artifact scoped to the test run.
    TestRunArtifact(RunArtifact),
    /// Artifact scoped to a test step.
    TestStepArtifact(StepArtifact),
}

/// Test-run artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunArtifact {
    /// Run started.
    TestRunStart {
        /// Test name.
        name: String,
        /// Test version.
        version: String,
        /// Device the run is scoped to.
        #[serde(rename = "dutInfo")]
        dut_info: DutInfo,
    },
    /// Run finished.
    TestRunEnd {
        /// Completion status.
        status: TestStatus,
        /// Overall result.
        result: TestResult,
    },
    /// Run-level log message.
    Log(LogEntry),
}

/// Test-step artifact with its step identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepArtifact {
    /// Step identifier, unique per reporter.
    pub test_step_id: String,
    /// Step payload.
    #[serde(flatten)]
    pub payload: StepPayload,
}

/// Test-step payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepPayload {
    /// Step started.
    TestStepStart {
        /// Step name.
        name: String,
    },
    /// Verdict for the step.
    Diagnosis {
        /// Human-readable verdict.
        verdict: String,
        /// Verdict type.
        #[serde(rename = "type")]
        kind: DiagnosisType,
    },
    /// File attached to the step.
    File {
        /// Display name (the file path).
        #[serde(rename = "displayName")]
        display_name: String,
        /// File URI.
        uri: String,
    },
    /// Step-level log message.
    Log(LogEntry),
    /// Step finished.
    TestStepEnd {
        /// Completion status.
        status: TestStatus,
    },
}

/// Log message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}
