// crates/storage-diags-core/src/lib.rs
// ============================================================================
// Module: Storage Diags Core Library
// Description: Public API surface for the Storage Diags core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Storage Diags core drives an external I/O load generator against storage
//! devices under test, captures diagnostic logs on failure, and judges
//! measured latency and bandwidth against declared performance targets.
//! Device access and process execution are reached only through the
//! interfaces in [`interfaces`], so the lifecycle can be exercised without
//! real hardware.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CommandError;
pub use interfaces::CommandRunner;
pub use interfaces::DeviceError;
pub use interfaces::DeviceOperations;
pub use interfaces::ReportSink;
pub use runtime::BenchmarkEvaluator;
pub use runtime::DiagError;
pub use runtime::DiagnosticOrchestrator;
pub use runtime::DutPerformanceVerdict;
pub use runtime::FileReportSink;
pub use runtime::HarnessError;
pub use runtime::LifecycleSummary;
pub use runtime::MemoryReportSink;
pub use runtime::OrchestratorConfig;
pub use runtime::Phase;
pub use runtime::StderrReportSink;
pub use runtime::StdoutReportSink;
pub use runtime::TestRunReporter;
