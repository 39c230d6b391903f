// crates/storage-diags-core/src/interfaces/mod.rs
// ============================================================================
// Module: Storage Diags Interfaces
// Description: Device, process, and report seams used by the runtime.
// Purpose: Define the contract surfaces the orchestrator depends on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the orchestrator independent of real hardware and real
//! processes. Vendor drivers implement [`DeviceOperations`]; every external
//! tool runs through a [`CommandRunner`]; report lines go to a
//! [`ReportSink`]. Implementations are chosen at construction time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

use crate::core::DeviceUnderTest;
use crate::core::ReportRecord;

// ============================================================================
// SECTION: Command Runner
// ============================================================================

/// External command errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to launch {program}: {reason}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Launch failure reason.
        reason: String,
    },
    /// The process exited unsuccessfully.
    #[error("{program} exited unsuccessfully ({}): {stderr}", exit_label(.code))]
    Status {
        /// Program that failed.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// Standard output was not UTF-8.
    #[error("{program} produced non utf-8 output")]
    Utf8 {
        /// Program that produced the output.
        program: String,
    },
}

/// Formats an exit code for error messages.
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"))
}

/// Blocking runner for external tools.
pub trait CommandRunner: Send + Sync {
    /// Runs a program to completion and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the program cannot be launched, exits
    /// unsuccessfully, or emits non UTF-8 output.
    fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
}

// ============================================================================
// SECTION: Device Operations
// ============================================================================

/// Device operation errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Operation is not implemented by this driver.
    #[error("{0} is not supported by this driver")]
    Unsupported(&'static str),
    /// A required device command failed.
    #[error("device command failed: {0}")]
    Command(#[from] CommandError),
    /// Writing a collected log failed.
    #[error("device log io error: {0}")]
    Io(String),
}

/// Capability set every device driver exposes.
///
/// Vendor-specific (`vu_*`) operations that a driver does not implement must
/// return [`DeviceError::Unsupported`] instead of reporting success.
pub trait DeviceOperations {
    /// Returns the device this driver owns.
    fn dut(&self) -> &DeviceUnderTest;

    /// Identifies the device; `false` signals failure.
    fn identify_dut(&mut self) -> bool;

    /// Vendor-specific identification.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] when the driver has no vendor path.
    fn vu_identify_dut(&mut self) -> Result<bool, DeviceError>;

    /// Switches the device into the mode required for the test.
    fn change_mode(&mut self) -> bool;

    /// Vendor-specific mode change.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] when the driver has no vendor path.
    fn vu_change_mode(&mut self) -> Result<bool, DeviceError>;

    /// Collects generic diagnostic logs and returns the written files in order.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] when a mandatory collection step fails.
    fn log_collect(&mut self) -> Result<Vec<PathBuf>, DeviceError>;

    /// Collects vendor-unique logs and returns the number of items.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] when the driver has no vendor path.
    fn vu_log_collect(&mut self) -> Result<usize, DeviceError>;

    /// Returns the location of generic error logs, if any.
    fn error_log(&self) -> Option<PathBuf>;

    /// Returns the location of vendor error logs, if any.
    fn vu_error_log(&self) -> Option<PathBuf>;
}

// ============================================================================
// SECTION: Report Sink
// ============================================================================

/// Destination for report records.
///
/// Sinks must not fail the caller: write errors are dropped.
pub trait ReportSink: Send + Sync {
    /// Records one report line.
    fn record(&self, record: &ReportRecord);
}
