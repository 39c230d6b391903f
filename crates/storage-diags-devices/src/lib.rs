// crates/storage-diags-devices/src/lib.rs
// ============================================================================
// Module: Storage Diags Devices
// Description: Built-in command runner and generic device driver.
// Purpose: Provide the production implementations of the core interfaces.
// Dependencies: storage-diags-core
// ============================================================================

//! ## Overview
//! This crate ships the process-backed [`SystemCommandRunner`] and the
//! nvme-cli backed [`GenericDeviceOperations`]. Vendor drivers implement
//! [`storage_diags_core::DeviceOperations`] the same way and are chosen at
//! orchestrator construction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod command;
pub mod generic;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::SystemCommandRunner;
pub use generic::DEFAULT_PERSISTENT_EVENT_LOG_LENGTH;
pub use generic::GenericDeviceConfig;
pub use generic::GenericDeviceOperations;
pub use generic::TELEMETRY_LOG_FILE;
