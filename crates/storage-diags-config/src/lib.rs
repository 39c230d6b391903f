// crates/storage-diags-config/src/lib.rs
// ============================================================================
// Module: Storage Diags Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for storage-diags.toml semantics.
// Dependencies: storage-diags-core, storage-diags-devices, serde, toml
// ============================================================================

//! ## Overview
//! `storage-diags-config` defines the configuration model for the diagnostic
//! harness and maps it onto orchestrator and device driver settings.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
