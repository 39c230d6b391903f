// crates/storage-diags-core/src/core/mod.rs
// ============================================================================
// Module: Storage Diags Core Types
// Description: Canonical playbook, device, measurement, and target structures.
// Purpose: Provide stable, serializable types shared by runtime and tooling.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define playbooks, devices under test, captured measurements,
//! benchmark target descriptors, and the report artifacts emitted while a
//! diagnostic runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod benchmark;
pub mod dut;
pub mod identifiers;
pub mod measurement;
pub mod playbook;
pub mod report;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use benchmark::BenchmarkError;
pub use benchmark::FailedBenchmark;
pub use benchmark::FailedWorkload;
pub use benchmark::TargetDescriptor;
pub use benchmark::TargetValue;
pub use benchmark::WorkloadDeclaration;
pub use dut::DeviceUnderTest;
pub use dut::DutInfo;
pub use identifiers::DevicePath;
pub use identifiers::ScenarioId;
pub use identifiers::parse_device_list;
pub use measurement::IoClass;
pub use measurement::MeasurementError;
pub use measurement::MeasurementRecord;
pub use playbook::Playbook;
pub use playbook::PlaybookError;
pub use report::DiagnosisType;
pub use report::LogEntry;
pub use report::ReportArtifact;
pub use report::ReportRecord;
pub use report::RunArtifact;
pub use report::Severity;
pub use report::StepArtifact;
pub use report::StepPayload;
pub use report::TestResult;
pub use report::TestStatus;
