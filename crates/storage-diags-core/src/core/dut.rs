// crates/storage-diags-core/src/core/dut.rs
// ============================================================================
// Module: Storage Diags Devices Under Test
// Description: Device identity, log directory, and reporting handle.
// Purpose: Describe one device under test for its whole orchestrator lifetime.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`DeviceUnderTest`] is created once at orchestrator construction and is
//! handed to the device-operations factory. Its log directory is written only
//! by that device's operations and by the orchestrator's failure capture.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DevicePath;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Reporting handle attached to every test-run scope for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutInfo {
    /// Host identifier the device is attached to.
    pub dut_info_id: String,
    /// Display name, `<hostname>:<device path>`.
    pub name: String,
}

impl DutInfo {
    /// Builds the reporting handle for a device on the given host.
    #[must_use]
    pub fn for_host(host_id: &str, hostname: &str, device: &DevicePath) -> Self {
        Self {
            dut_info_id: host_id.to_string(),
            name: format!("{hostname}:{device}"),
        }
    }
}

/// Device under test with its dedicated log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUnderTest {
    /// Device path.
    path: DevicePath,
    /// Directory receiving this device's diagnostic files.
    log_dir: PathBuf,
    /// Reporting handle.
    info: DutInfo,
}

impl DeviceUnderTest {
    /// Creates a device description.
    #[must_use]
    pub const fn new(path: DevicePath, log_dir: PathBuf, info: DutInfo) -> Self {
        Self {
            path,
            log_dir,
            info,
        }
    }

    /// Returns the device path.
    #[must_use]
    pub const fn path(&self) -> &DevicePath {
        &self.path
    }

    /// Returns the per-device log directory.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Returns the reporting handle.
    #[must_use]
    pub const fn info(&self) -> &DutInfo {
        &self.info
    }
}
