// crates/storage-diags-core/src/runtime/mod.rs
// ============================================================================
// Module: Storage Diags Runtime
// Description: Lifecycle orchestration, benchmark evaluation, and reporting.
// Purpose: Execute diagnostic scenarios against devices under test.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the diagnostic lifecycle, the performance
//! target evaluator, and the structured report stream. Device and process
//! access always goes through [`crate::interfaces`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod evaluator;
pub mod orchestrator;
pub mod report;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use evaluator::BenchmarkEvaluator;
pub use evaluator::Workload;
pub use orchestrator::DiagError;
pub use orchestrator::DiagnosticOrchestrator;
pub use orchestrator::DutPerformanceVerdict;
pub use orchestrator::HarnessError;
pub use orchestrator::LifecycleSummary;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::Phase;
pub use report::FileReportSink;
pub use report::MemoryReportSink;
pub use report::StderrReportSink;
pub use report::StdoutReportSink;
pub use report::TestRun;
pub use report::TestRunReporter;
pub use report::TestStep;
