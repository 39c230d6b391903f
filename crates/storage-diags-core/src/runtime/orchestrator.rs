// crates/storage-diags-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Storage Diags Diagnostic Orchestrator
// Description: Ordered lifecycle across devices under test and scenarios.
// Purpose: Run scenarios fail-fast, capture logs on failure, judge performance.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! The orchestrator enforces `setUp -> PreDiag -> Run -> PostDiag -> Report ->
//! tearDown`. Devices and scenarios are processed strictly in declared order,
//! one at a time, since load generation needs exclusive device access.
//!
//! `setUp` and `Run` failures are fatal and surface as a single [`DiagError`]
//! tagged with the phase. The first failing scenario anywhere in the
//! device x scenario matrix aborts the whole run, not just the failing
//! device. Performance target failures in `PostDiag` are reported, never
//! raised.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::BenchmarkError;
use crate::core::DeviceUnderTest;
use crate::core::DevicePath;
use crate::core::DiagnosisType;
use crate::core::DutInfo;
use crate::core::FailedBenchmark;
use crate::core::MeasurementRecord;
use crate::core::Playbook;
use crate::core::PlaybookError;
use crate::core::ScenarioId;
use crate::core::Severity;
use crate::core::TargetDescriptor;
use crate::core::TestStatus;
use crate::core::parse_device_list;
use crate::interfaces::CommandRunner;
use crate::interfaces::DeviceError;
use crate::interfaces::DeviceOperations;
use crate::runtime::evaluator::BenchmarkEvaluator;
use crate::runtime::report::TestRun;
use crate::runtime::report::TestRunReporter;
use crate::runtime::report::TestStep;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Host identity used when the host cannot be queried.
pub const UNKNOWN_HOST: &str = "unknown";
/// Suffix of the per-scenario failure capture file.
pub const ERROR_LOG_SUFFIX: &str = "_fio_error_log";

// ============================================================================
// SECTION: Phases and Errors
// ============================================================================

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Device identification and mode change.
    SetUp,
    /// Device preconditioning.
    PreDiag,
    /// Scenario execution.
    Run,
    /// Performance target evaluation.
    PostDiag,
    /// Raw measurement emission.
    Report,
    /// Rollback of set-up changes.
    TearDown,
}

impl Phase {
    /// Returns the stable phase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetUp => "setUp",
            Self::PreDiag => "PreDiag",
            Self::Run => "Run",
            Self::PostDiag => "PostDiag",
            Self::Report => "Report",
            Self::TearDown => "tearDown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal lifecycle error tagged with the phase that raised it.
#[derive(Debug, Error)]
#[error("error occurred in '{phase}' step: {detail}")]
pub struct DiagError {
    /// Phase that failed.
    phase: Phase,
    /// Failure description.
    detail: String,
    /// Diagnostic files captured before the abort.
    logs: Vec<PathBuf>,
}

impl DiagError {
    /// Creates a phase error without attached logs.
    #[must_use]
    pub fn new(phase: Phase, detail: impl Into<String>) -> Self {
        Self {
            phase,
            detail: detail.into(),
            logs: Vec::new(),
        }
    }

    /// Attaches captured diagnostic files.
    #[must_use]
    pub fn with_logs(mut self, logs: Vec<PathBuf>) -> Self {
        self.logs = logs;
        self
    }

    /// Returns the failing phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the failure description.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns the diagnostic files captured before the abort.
    #[must_use]
    pub fn logs(&self) -> &[PathBuf] {
        &self.logs
    }
}

/// Orchestrator construction errors.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Device list was empty.
    #[error("no devices under test were given")]
    NoDevices,
    /// Playbook could not be loaded.
    #[error(transparent)]
    Playbook(#[from] PlaybookError),
    /// Benchmark target descriptor could not be loaded.
    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),
    /// Two devices would write into the same log directory.
    #[error("devices {first} and {second} share log directory name {leaf}")]
    SharedLogDir {
        /// Device listed first.
        first: String,
        /// Device listed later.
        second: String,
        /// Colliding directory name.
        leaf: String,
    },
    /// Per-device log directory could not be created.
    #[error("failed to create log directory {path}: {reason}")]
    LogDir {
        /// Directory path.
        path: String,
        /// Failure reason.
        reason: String,
    },
    /// Device driver construction failed.
    #[error("failed to create driver for {device}: {source}")]
    Driver {
        /// Device path.
        device: String,
        /// Driver error.
        #[source]
        source: DeviceError,
    },
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Settings for one orchestrator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Load generator executable.
    pub fio_path: String,
    /// Load generator output format (`json` or `json+`).
    pub fio_output_format: String,
    /// Directory holding scenario files and target descriptors.
    pub configs_dir: PathBuf,
    /// Root under which per-device log directories are created.
    pub log_root: PathBuf,
    /// Command printing the host identifier.
    pub hostid_command: String,
    /// Command printing the host name.
    pub hostname_command: String,
}

impl OrchestratorConfig {
    /// Creates settings with the stock tool locations.
    #[must_use]
    pub fn new(configs_dir: PathBuf, log_root: PathBuf) -> Self {
        Self {
            fio_path: "/usr/bin/fio".to_string(),
            fio_output_format: "json+".to_string(),
            configs_dir,
            log_root,
            hostid_command: "hostid".to_string(),
            hostname_command: "hostname".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Performance verdict for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DutPerformanceVerdict {
    /// Device path.
    pub device: DevicePath,
    /// Evaluation result of the first measurement.
    pub result: FailedBenchmark,
}

impl DutPerformanceVerdict {
    /// Returns true when every workload met its targets.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.passed()
    }
}

/// Outcome of a complete lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleSummary {
    /// Per-device performance verdicts (empty without benchmark targets).
    pub performance: Vec<DutPerformanceVerdict>,
}

impl LifecycleSummary {
    /// Returns true when no performance target failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.performance.iter().all(DutPerformanceVerdict::passed)
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Device driver plus the measurements captured for it.
struct DutSlot<D> {
    /// Driver owning the device.
    ops: D,
    /// Measurements in scenario execution order.
    records: Vec<MeasurementRecord>,
}

/// Why a scenario failed.
enum ScenarioFailure {
    /// The tool could not run or its output was not JSON.
    Tool {
        /// Failure reason.
        reason: String,
        /// Raw output when some was captured.
        raw: Option<String>,
    },
    /// The tool reported job errors; the record was appended.
    JobError {
        /// Reported error count, `None` when absent.
        count: Option<u64>,
    },
}

/// Diagnostic lifecycle orchestrator over device drivers of type `D`.
pub struct DiagnosticOrchestrator<D> {
    /// Orchestrator settings.
    config: OrchestratorConfig,
    /// Loaded playbook.
    playbook: Playbook,
    /// Optional performance evaluator.
    evaluator: Option<BenchmarkEvaluator>,
    /// Devices in construction order.
    duts: Vec<DutSlot<D>>,
    /// Runner for the load generator.
    runner: Arc<dyn CommandRunner>,
    /// Report stream.
    reporter: TestRunReporter,
}

impl<D> DiagnosticOrchestrator<D>
where
    D: DeviceOperations,
{
    /// Builds an orchestrator for a space-separated device list.
    ///
    /// Creates one log directory and one driver per device and loads the
    /// benchmark evaluator when the playbook references target descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when no devices are given, two devices map to
    /// the same log directory, the target descriptor is invalid, a log
    /// directory cannot be created, or the factory fails.
    pub fn new<F>(
        config: OrchestratorConfig,
        devices: &str,
        playbook: Playbook,
        runner: Arc<dyn CommandRunner>,
        reporter: TestRunReporter,
        mut factory: F,
    ) -> Result<Self, HarnessError>
    where
        F: FnMut(DeviceUnderTest) -> Result<D, DeviceError>,
    {
        let paths = parse_device_list(devices);
        if paths.is_empty() {
            return Err(HarnessError::NoDevices);
        }
        {
            let mut leaves: BTreeMap<&str, &DevicePath> = BTreeMap::new();
            for path in &paths {
                if let Some(first) = leaves.insert(path.leaf(), path) {
                    return Err(HarnessError::SharedLogDir {
                        first: first.to_string(),
                        second: path.to_string(),
                        leaf: path.leaf().to_string(),
                    });
                }
            }
        }
        playbook.validate()?;

        let evaluator = match playbook.benchmark_targets() {
            Some(name) => {
                let descriptor = TargetDescriptor::load(&config.configs_dir.join(name))?;
                Some(BenchmarkEvaluator::from_descriptor(&descriptor)?)
            }
            None => None,
        };

        let host_id = query_host(runner.as_ref(), &reporter, &config.hostid_command);
        let hostname = query_host(runner.as_ref(), &reporter, &config.hostname_command);

        let mut duts = Vec::with_capacity(paths.len());
        for path in paths {
            let log_dir = config.log_root.join(path.leaf());
            fs::create_dir_all(&log_dir).map_err(|err| HarnessError::LogDir {
                path: log_dir.display().to_string(),
                reason: err.to_string(),
            })?;
            let info = DutInfo::for_host(&host_id, &hostname, &path);
            let device = path.to_string();
            let ops = factory(DeviceUnderTest::new(path, log_dir, info)).map_err(|source| {
                HarnessError::Driver {
                    device,
                    source,
                }
            })?;
            duts.push(DutSlot {
                ops,
                records: Vec::new(),
            });
        }

        Ok(Self {
            config,
            playbook,
            evaluator,
            duts,
            runner,
            reporter,
        })
    }

    /// Returns the loaded playbook.
    #[must_use]
    pub const fn playbook(&self) -> &Playbook {
        &self.playbook
    }

    /// Returns the benchmark evaluator, if configured.
    #[must_use]
    pub const fn evaluator(&self) -> Option<&BenchmarkEvaluator> {
        self.evaluator.as_ref()
    }

    /// Returns the devices under test in construction order.
    pub fn duts(&self) -> impl Iterator<Item = &DeviceUnderTest> {
        self.duts.iter().map(|slot| slot.ops.dut())
    }

    /// Returns the measurements captured for a device.
    #[must_use]
    pub fn records(&self, device: &DevicePath) -> Option<&[MeasurementRecord]> {
        self.duts
            .iter()
            .find(|slot| slot.ops.dut().path() == device)
            .map(|slot| slot.records.as_slice())
    }

    /// Runs every phase in order, stopping at the first fatal error.
    ///
    /// Raw measurements are written to `out` during `Report`.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] from `setUp`, `PreDiag`, `Run`, `Report`, or
    /// `tearDown`.
    pub fn run_lifecycle(&mut self, out: &mut dyn Write) -> Result<LifecycleSummary, DiagError> {
        self.set_up()?;
        self.pre_diag()?;
        self.run()?;
        let performance = self.post_diag();
        self.report(out)?;
        self.tear_down()?;
        Ok(LifecycleSummary {
            performance,
        })
    }

    /// Identifies every device and switches it into test mode.
    ///
    /// Devices are processed in order; the first failure aborts the phase.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] tagged [`Phase::SetUp`].
    pub fn set_up(&mut self) -> Result<(), DiagError> {
        for index in 0 .. self.duts.len() {
            if !self.duts[index].ops.identify_dut() {
                return Err(self.setup_failure(index, "identifying DUT"));
            }
            if !self.duts[index].ops.change_mode() {
                return Err(self.setup_failure(index, "changing mode"));
            }
        }
        Ok(())
    }

    /// Preconditions devices before the run.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] tagged [`Phase::PreDiag`] when preconditioning fails.
    #[allow(clippy::unnecessary_wraps, reason = "Lifecycle hooks share the fallible phase contract.")]
    pub fn pre_diag(&mut self) -> Result<(), DiagError> {
        self.reporter.log(Severity::Debug, "PreDiag: no device preconditioning configured");
        Ok(())
    }

    /// Executes every scenario against every device, fail-fast.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] tagged [`Phase::Run`] at the first failing
    /// scenario, after its logs have been captured.
    pub fn run(&mut self) -> Result<(), DiagError> {
        let scenarios = self.playbook.test_steps.clone();
        for index in 0 .. self.duts.len() {
            let info = self.duts[index].ops.dut().info().clone();
            let mut run = self.reporter.start_run(&info);
            for scenario in &scenarios {
                let step = self.reporter.start_step(scenario.as_str());
                match self.execute_scenario(index, scenario) {
                    Ok(()) => {
                        self.reporter.diagnosis(
                            &mut run,
                            &step,
                            DiagnosisType::Pass,
                            format!("{scenario} passed"),
                        );
                        self.reporter.end_step(step, TestStatus::Complete);
                    }
                    Err(failure) => {
                        let error = self.capture_failure(index, scenario, &step, &mut run, failure);
                        self.reporter.end_step(step, TestStatus::Complete);
                        self.reporter.end_run(run, TestStatus::Complete);
                        self.reporter.log(Severity::Fatal, error.to_string());
                        return Err(error);
                    }
                }
            }
            self.reporter.end_run(run, TestStatus::Complete);
        }
        Ok(())
    }

    /// Evaluates the first measurement of each device against the targets.
    ///
    /// Returns no verdicts when no benchmark targets are configured.
    pub fn post_diag(&self) -> Vec<DutPerformanceVerdict> {
        let Some(evaluator) = &self.evaluator else {
            return Vec::new();
        };
        let mut verdicts = Vec::new();
        for slot in &self.duts {
            let Some(first) = slot.records.first() else {
                continue;
            };
            let dut = slot.ops.dut();
            let device = dut.path();
            let mut run = self.reporter.start_run(dut.info());
            let result = evaluator.evaluate(first.document());
            let step = self.reporter.start_step(format!("Performance targets for {device}"));
            if result.passed() {
                self.reporter.diagnosis(
                    &mut run,
                    &step,
                    DiagnosisType::Pass,
                    format!("Performance test passed for {device}"),
                );
            } else {
                self.reporter.diagnosis(
                    &mut run,
                    &step,
                    DiagnosisType::Fail,
                    format!("Failed performance targets: {}", result.summary_lines().join("\n")),
                );
            }
            self.reporter.end_step(step, TestStatus::Complete);
            self.reporter.end_run(run, TestStatus::Complete);
            verdicts.push(DutPerformanceVerdict {
                device: device.clone(),
                result,
            });
        }
        verdicts
    }

    /// Writes every captured measurement, per device in capture order, verbatim.
    ///
    /// Each measurement is framed as one line: a trailing newline is added
    /// only when the raw output lacks one, so records never run together.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] tagged [`Phase::Report`] when writing fails.
    pub fn report(&self, out: &mut dyn Write) -> Result<(), DiagError> {
        for slot in &self.duts {
            for record in &slot.records {
                let raw = record.raw();
                out.write_all(raw.as_bytes())
                    .and_then(|()| if raw.ends_with('\n') { Ok(()) } else { out.write_all(b"\n") })
                    .map_err(|err| DiagError::new(Phase::Report, err.to_string()))?;
            }
        }
        out.flush().map_err(|err| DiagError::new(Phase::Report, err.to_string()))
    }

    /// Rolls back set-up changes.
    ///
    /// # Errors
    ///
    /// Returns [`DiagError`] tagged [`Phase::TearDown`] when rollback fails.
    #[allow(clippy::unnecessary_wraps, reason = "Lifecycle hooks share the fallible phase contract.")]
    pub fn tear_down(&mut self) -> Result<(), DiagError> {
        self.reporter.log(Severity::Debug, "tearDown: no device changes to roll back");
        Ok(())
    }

    /// Runs one scenario on one device and appends its measurement.
    fn execute_scenario(
        &mut self,
        index: usize,
        scenario: &ScenarioId,
    ) -> Result<(), ScenarioFailure> {
        let slot = &mut self.duts[index];
        let device = slot.ops.dut().path().clone();
        let scenario_path = self.config.configs_dir.join(scenario.as_str());
        let args = vec![
            format!("--output-format={}", self.config.fio_output_format),
            format!("--filename={device}"),
            scenario_path.display().to_string(),
        ];
        self.reporter.log(
            Severity::Info,
            format!("running {} {}", self.config.fio_path, args.join(" ")),
        );

        let raw = self.runner.run(&self.config.fio_path, &args).map_err(|err| {
            ScenarioFailure::Tool {
                reason: err.to_string(),
                raw: None,
            }
        })?;
        let record = MeasurementRecord::parse(scenario.clone(), raw).map_err(|err| {
            ScenarioFailure::Tool {
                reason: err.to_string(),
                raw: Some(err.into_raw()),
            }
        })?;
        let failed = record.reports_failure();
        let count = record.first_job_error_count();
        slot.records.push(record);
        if failed {
            return Err(ScenarioFailure::JobError {
                count,
            });
        }
        Ok(())
    }

    /// Persists the failing output, collects device logs, and records the verdict.
    fn capture_failure(
        &mut self,
        index: usize,
        scenario: &ScenarioId,
        step: &TestStep,
        run: &mut TestRun,
        failure: ScenarioFailure,
    ) -> DiagError {
        let slot = &mut self.duts[index];
        let device = slot.ops.dut().path().clone();
        let mut problems = Vec::new();

        let (reason, contents) = match failure {
            ScenarioFailure::Tool {
                reason,
                raw,
            } => {
                let contents = raw.unwrap_or_else(|| reason.clone());
                (reason, contents)
            }
            ScenarioFailure::JobError {
                count,
            } => {
                let reason = count.map_or_else(
                    || "tool output has no job error count".to_string(),
                    |count| format!("tool reported {count} job error(s)"),
                );
                let contents =
                    slot.records.last().map(|record| record.raw().to_string()).unwrap_or_default();
                (reason, contents)
            }
        };

        let error_log =
            slot.ops.dut().log_dir().join(format!("{}{ERROR_LOG_SUFFIX}", scenario.file_stem()));
        let persisted = match fs::write(&error_log, contents) {
            Ok(()) => Some(error_log),
            Err(err) => {
                problems.push(format!("failed to persist tool output: {err}"));
                None
            }
        };

        self.reporter.step_log(step, Severity::Info, format!("collecting device logs for {device}"));
        let mut attachments = match slot.ops.log_collect() {
            Ok(collected) => collected,
            Err(err) => {
                problems.push(format!("device log collection failed: {err}"));
                Vec::new()
            }
        };
        attachments.extend(persisted);

        for path in &attachments {
            self.reporter.file(step, path);
        }
        for problem in &problems {
            self.reporter.step_log(step, Severity::Error, problem.clone());
        }
        self.reporter.diagnosis(run, step, DiagnosisType::Fail, format!("{scenario} failed"));

        let mut parts = vec![format!("scenario '{scenario}' failed on {device}: {reason}")];
        parts.extend(problems);
        DiagError::new(Phase::Run, parts.join("; ")).with_logs(attachments)
    }

    /// Reports error-log locations and builds the set-up error.
    fn setup_failure(&self, index: usize, operation: &str) -> DiagError {
        let ops = &self.duts[index].ops;
        let device = ops.dut().path();
        let mut logs = Vec::new();
        let mut parts = vec![format!("failed while {operation} for {device}")];

        self.reporter.log(Severity::Error, format!("Errors occurred while {operation}."));
        let locations = [("generic", ops.error_log()), ("vendor", ops.vu_error_log())];
        for (kind, location) in locations {
            let Some(path) = location.filter(|path| !path.as_os_str().is_empty()) else {
                continue;
            };
            self.reporter.log(Severity::Error, format!("See {kind} errors at: {}", path.display()));
            parts.push(format!("{kind} errors at {}", path.display()));
            logs.push(path);
        }
        DiagError::new(Phase::SetUp, parts.join("; ")).with_logs(logs)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Queries a host identity command, falling back to [`UNKNOWN_HOST`].
fn query_host(runner: &dyn CommandRunner, reporter: &TestRunReporter, command: &str) -> String {
    match runner.run(command, &[]) {
        Ok(output) if !output.trim().is_empty() => output.trim().to_string(),
        Ok(_) => {
            reporter.log(Severity::Warning, format!("{command} printed nothing; using '{UNKNOWN_HOST}'"));
            UNKNOWN_HOST.to_string()
        }
        Err(err) => {
            reporter.log(Severity::Warning, format!("{err}; using '{UNKNOWN_HOST}'"));
            UNKNOWN_HOST.to_string()
        }
    }
}
