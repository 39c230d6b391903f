// crates/storage-diags-core/tests/common/mod.rs
// ============================================================================
// Module: Common Core Test Fixtures
// Description: In-memory fakes for command execution and device drivers.
// Purpose: Drive the orchestrator deterministically without hardware.
// Dependencies: storage-diags-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Fixtures shared by the core integration tests: a scripted command runner,
//! a recording device driver, and builders for load-generator documents.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use storage_diags_core::CommandError;
use storage_diags_core::CommandRunner;
use storage_diags_core::DeviceError;
use storage_diags_core::DeviceOperations;
use storage_diags_core::DeviceUnderTest;
use storage_diags_core::MemoryReportSink;
use storage_diags_core::OrchestratorConfig;
use storage_diags_core::ReportArtifact;
use storage_diags_core::ReportRecord;
use storage_diags_core::RunArtifact;
use storage_diags_core::StepPayload;
use storage_diags_core::TestRunReporter;

// ============================================================================
// SECTION: Measurement Builders
// ============================================================================

/// Builds a load-generator document with one job.
pub fn fio_document(class: &str, error: u64, bw: u64, percentiles: &[(&str, u64)]) -> Value {
    let table: serde_json::Map<String, Value> =
        percentiles.iter().map(|(key, value)| ((*key).to_string(), json!(value))).collect();
    let mut job = serde_json::Map::new();
    job.insert("jobname".to_string(), json!("job0"));
    job.insert("error".to_string(), json!(error));
    job.insert(class.to_string(), json!({ "bw": bw, "clat_ns": { "percentile": table } }));
    json!({ "fio version": "fio-3.36", "jobs": [Value::Object(job)] })
}

/// Returns the write-heavy document used across evaluator scenarios.
pub fn write_measurement() -> Value {
    fio_document("write", 0, 3_184_604, &[("99.900000", 6_782_976)])
}

// ============================================================================
// SECTION: Scripted Runner
// ============================================================================

/// Response function for a scripted runner.
type Script = dyn Fn(&str, &[String]) -> Result<String, CommandError> + Send + Sync;

/// Command runner answering from a script and recording every call.
pub struct ScriptedRunner {
    /// Response function.
    script: Box<Script>,
    /// Calls as `(program, args)` in order.
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    /// Creates a runner answering with `script`.
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&str, &[String]) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the recorded calls to `program`.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(called, _)| called == program)
            .map(|(_, args)| args)
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push((program.to_string(), args.to_vec()));
        (self.script)(program, args)
    }
}

/// Answers host identity queries and fio runs from a per-scenario table.
///
/// Scenarios are matched by the final fio argument ending with the name.
pub fn fio_script(
    outputs: Vec<(&'static str, String)>,
) -> impl Fn(&str, &[String]) -> Result<String, CommandError> + Send + Sync + 'static {
    move |program, args| match program {
        "hostid" => Ok("a8c0ff01\n".to_string()),
        "hostname" => Ok("bench-host\n".to_string()),
        "fio" => {
            let target = args.last().cloned().unwrap_or_default();
            outputs
                .iter()
                .find(|(scenario, _)| target.ends_with(scenario))
                .map(|(_, output)| output.clone())
                .ok_or_else(|| CommandError::Spawn {
                    program: program.to_string(),
                    reason: format!("no scripted output for {target}"),
                })
        }
        other => Err(CommandError::Spawn {
            program: other.to_string(),
            reason: "unscripted program".to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Recording Device
// ============================================================================

/// Behavior switches for a fake device.
#[derive(Debug, Clone)]
pub struct FakeBehavior {
    /// Result of identification.
    pub identify: bool,
    /// Result of mode change.
    pub change_mode: bool,
    /// Whether log collection fails.
    pub collect_fails: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            identify: true,
            change_mode: true,
            collect_fails: false,
        }
    }
}

/// Device driver recording every call into a shared event log.
pub struct FakeDevice {
    /// Owned device.
    dut: DeviceUnderTest,
    /// Behavior switches.
    behavior: FakeBehavior,
    /// Shared event log.
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeDevice {
    /// Creates a fake device.
    pub const fn new(
        dut: DeviceUnderTest,
        behavior: FakeBehavior,
        events: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            dut,
            behavior,
            events,
        }
    }

    /// Appends an event tagged with the device path.
    fn push(&self, event: &str) {
        self.events.lock().unwrap().push(format!("{event} {}", self.dut.path()));
    }
}

impl DeviceOperations for FakeDevice {
    fn dut(&self) -> &DeviceUnderTest {
        &self.dut
    }

    fn identify_dut(&mut self) -> bool {
        self.push("identify");
        self.behavior.identify
    }

    fn vu_identify_dut(&mut self) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported("VUIdentifyDUT"))
    }

    fn change_mode(&mut self) -> bool {
        self.push("change_mode");
        self.behavior.change_mode
    }

    fn vu_change_mode(&mut self) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported("VUChangeMode"))
    }

    fn log_collect(&mut self) -> Result<Vec<PathBuf>, DeviceError> {
        self.push("log_collect");
        if self.behavior.collect_fails {
            return Err(DeviceError::Command(CommandError::Status {
                program: "nvme".to_string(),
                code: Some(1),
                stderr: "telemetry unavailable".to_string(),
            }));
        }
        let path = self.dut.log_dir().join("smart-log");
        fs::write(&path, "{}").map_err(|err| DeviceError::Io(err.to_string()))?;
        Ok(vec![path])
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

// ============================================================================
// SECTION: Harness Fixtures
// ============================================================================

/// Orchestrator settings using bare tool names and a temp layout.
pub fn orchestrator_config(root: &Path) -> OrchestratorConfig {
    let configs_dir = root.join("configs");
    fs::create_dir_all(&configs_dir).unwrap();
    OrchestratorConfig {
        fio_path: "fio".to_string(),
        ..OrchestratorConfig::new(configs_dir, root.join("logs"))
    }
}

/// Creates a reporter backed by a memory sink.
pub fn memory_reporter() -> (Arc<MemoryReportSink>, TestRunReporter) {
    let sink = Arc::new(MemoryReportSink::default());
    let reporter = TestRunReporter::new(sink.clone(), "BasicIODiag", "1.0");
    (sink, reporter)
}

/// Returns every diagnosis `(verdict, type)` pair in emission order.
pub fn diagnoses(records: &[ReportRecord]) -> Vec<(String, String)> {
    records
        .iter()
        .filter_map(|record| match &record.artifact {
            ReportArtifact::TestStepArtifact(step) => match &step.payload {
                StepPayload::Diagnosis {
                    verdict,
                    kind,
                } => Some((verdict.clone(), format!("{kind:?}"))),
                _ => None,
            },
            ReportArtifact::TestRunArtifact(_) => None,
        })
        .collect()
}

/// Returns every attached file display name in emission order.
pub fn attached_files(records: &[ReportRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match &record.artifact {
            ReportArtifact::TestStepArtifact(step) => match &step.payload {
                StepPayload::File {
                    display_name,
                    ..
                } => Some(display_name.clone()),
                _ => None,
            },
            ReportArtifact::TestRunArtifact(_) => None,
        })
        .collect()
}

/// Returns every run-level log message in emission order.
pub fn run_logs(records: &[ReportRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match &record.artifact {
            ReportArtifact::TestRunArtifact(RunArtifact::Log(entry)) => Some(entry.message.clone()),
            _ => None,
        })
        .collect()
}

/// Returns the `dutInfo.name` of every run start in emission order.
pub fn run_starts(records: &[ReportRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match &record.artifact {
            ReportArtifact::TestRunArtifact(RunArtifact::TestRunStart {
                dut_info,
                ..
            }) => Some(dut_info.name.clone()),
            _ => None,
        })
        .collect()
}
