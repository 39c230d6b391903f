// crates/storage-diags-devices/src/generic.rs
// ============================================================================
// Module: Generic Device Operations
// Description: Vendor-neutral NVMe device driver backed by nvme-cli.
// Purpose: Provide identification, mode change, and log collection for any DUT.
// Dependencies: storage-diags-core
// ============================================================================

//! ## Overview
//! [`GenericDeviceOperations`] accepts every device: identification and mode
//! change always succeed. On failure the orchestrator asks it to collect
//! generic logs: three JSON queries (smart-log, error-log,
//! persistent-event-log) whose individual failures are logged and skipped,
//! followed by a telemetry capture whose failure propagates. Vendor-unique
//! operations report [`DeviceError::Unsupported`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use storage_diags_core::CommandRunner;
use storage_diags_core::DeviceError;
use storage_diags_core::DeviceOperations;
use storage_diags_core::DeviceUnderTest;
use storage_diags_core::Severity;
use storage_diags_core::TestRunReporter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the telemetry capture inside the device log directory.
pub const TELEMETRY_LOG_FILE: &str = "telemetry-log";
/// Default persistent event log length requested from the device.
pub const DEFAULT_PERSISTENT_EVENT_LOG_LENGTH: u32 = 512;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Settings for the generic driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericDeviceConfig {
    /// nvme-cli executable.
    pub nvme_path: String,
    /// Length argument for the persistent event log query.
    pub persistent_event_log_length: u32,
}

impl Default for GenericDeviceConfig {
    fn default() -> Self {
        Self {
            nvme_path: "nvme".to_string(),
            persistent_event_log_length: DEFAULT_PERSISTENT_EVENT_LOG_LENGTH,
        }
    }
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Generic driver for one device under test.
pub struct GenericDeviceOperations {
    /// Device owned by this driver.
    dut: DeviceUnderTest,
    /// Driver settings.
    config: GenericDeviceConfig,
    /// Runner for nvme-cli.
    runner: Arc<dyn CommandRunner>,
    /// Report stream for collection logs.
    reporter: TestRunReporter,
}

impl GenericDeviceOperations {
    /// Creates a generic driver.
    #[must_use]
    pub fn new(
        dut: DeviceUnderTest,
        config: GenericDeviceConfig,
        runner: Arc<dyn CommandRunner>,
        reporter: TestRunReporter,
    ) -> Self {
        Self {
            dut,
            config,
            runner,
            reporter,
        }
    }

    /// Returns the JSON queries as `(output file name, arguments)` pairs.
    fn json_queries(&self) -> [(&'static str, Vec<String>); 3] {
        let device = self.dut.path().to_string();
        [
            ("smart-log", vec![
                "smart-log".to_string(),
                "-o".to_string(),
                "json".to_string(),
                device.clone(),
            ]),
            ("error-log", vec![
                "error-log".to_string(),
                "-o".to_string(),
                "json".to_string(),
                device.clone(),
            ]),
            ("persistent-event-log", vec![
                "persistent-event-log".to_string(),
                "-o".to_string(),
                "json".to_string(),
                device,
                "-l".to_string(),
                self.config.persistent_event_log_length.to_string(),
            ]),
        ]
    }
}

impl DeviceOperations for GenericDeviceOperations {
    fn dut(&self) -> &DeviceUnderTest {
        &self.dut
    }

    fn identify_dut(&mut self) -> bool {
        true
    }

    fn vu_identify_dut(&mut self) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported("VUIdentifyDUT"))
    }

    fn change_mode(&mut self) -> bool {
        true
    }

    fn vu_change_mode(&mut self) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported("VUChangeMode"))
    }

    fn log_collect(&mut self) -> Result<Vec<PathBuf>, DeviceError> {
        let nvme = self.config.nvme_path.clone();
        let mut collected = Vec::new();
        for (name, args) in self.json_queries() {
            let command = format!("{nvme} {}", args.join(" "));
            self.reporter.log(Severity::Info, format!("Collecting output for {command} ..."));
            let output = match self.runner.run(&nvme, &args) {
                Ok(output) => output,
                Err(err) => {
                    self.reporter.log(
                        Severity::Warning,
                        format!("Non-critical error occurred while running: {command}: {err}"),
                    );
                    continue;
                }
            };
            let path = self.dut.log_dir().join(name);
            fs::write(&path, output).map_err(|err| {
                DeviceError::Io(format!("failed to write {}: {err}", path.display()))
            })?;
            collected.push(path);
        }

        let telemetry = self.dut.log_dir().join(TELEMETRY_LOG_FILE);
        let args = vec![
            "telemetry-log".to_string(),
            self.dut.path().to_string(),
            format!("--output-file={}", telemetry.display()),
        ];
        self.reporter.log(Severity::Info, format!("Collecting output for {nvme} {} ...", args.join(" ")));
        self.runner.run(&nvme, &args)?;
        collected.push(telemetry);
        Ok(collected)
    }

    fn vu_log_collect(&mut self) -> Result<usize, DeviceError> {
        Err(DeviceError::Unsupported("VULogCollect"))
    }

    fn error_log(&self) -> Option<PathBuf> {
        Some(self.dut.log_dir().to_path_buf())
    }

    fn vu_error_log(&self) -> Option<PathBuf> {
        None
    }
}
