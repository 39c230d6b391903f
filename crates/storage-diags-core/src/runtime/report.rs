// crates/storage-diags-core/src/runtime/report.rs
// ============================================================================
// Module: Storage Diags Test Run Reporting
// Description: Structured JSON-lines report stream and sinks.
// Purpose: Emit run, step, diagnosis, file, and log artifacts without hard deps.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`TestRunReporter`] stamps every artifact with a monotonic sequence number
//! and a timestamp and hands it to a [`ReportSink`]. The reporter doubles as
//! the harness logger: diagnostic messages are emitted as `log` artifacts in
//! the same stream. Sinks swallow write failures so reporting never aborts a
//! diagnostic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::core::DiagnosisType;
use crate::core::DutInfo;
use crate::core::LogEntry;
use crate::core::ReportArtifact;
use crate::core::ReportRecord;
use crate::core::RunArtifact;
use crate::core::Severity;
use crate::core::StepArtifact;
use crate::core::StepPayload;
use crate::core::TestResult;
use crate::core::TestStatus;
use crate::interfaces::ReportSink;

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Report stream shared by the orchestrator and device drivers.
#[derive(Clone)]
pub struct TestRunReporter {
    /// Destination for report lines.
    sink: Arc<dyn ReportSink>,
    /// Next sequence number.
    sequence: Arc<AtomicU64>,
    /// Next step identifier.
    next_step: Arc<AtomicU64>,
    /// Test name written into run-start artifacts.
    name: String,
    /// Test version written into run-start artifacts.
    version: String,
}

/// Open test-run scope tracking its diagnoses.
#[derive(Debug, Default)]
pub struct TestRun {
    /// Whether any diagnosis was recorded.
    diagnosed: bool,
    /// Whether any failing diagnosis was recorded.
    failed: bool,
}

impl TestRun {
    /// Returns the result implied by the recorded diagnoses.
    #[must_use]
    pub const fn result(&self) -> TestResult {
        if self.failed {
            TestResult::Fail
        } else if self.diagnosed {
            TestResult::Pass
        } else {
            TestResult::NotApplicable
        }
    }
}

/// Open test step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStep {
    /// Step identifier.
    id: String,
}

impl TestStep {
    /// Returns the step identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl TestRunReporter {
    /// Creates a reporter writing to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn ReportSink>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            sink,
            sequence: Arc::new(AtomicU64::new(0)),
            next_step: Arc::new(AtomicU64::new(0)),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Emits a run-level log message.
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.emit(ReportArtifact::TestRunArtifact(RunArtifact::Log(LogEntry {
            severity,
            message: message.into(),
        })));
    }

    /// Opens a test run scoped to one device.
    #[must_use]
    pub fn start_run(&self, dut: &DutInfo) -> TestRun {
        self.emit(ReportArtifact::TestRunArtifact(RunArtifact::TestRunStart {
            name: self.name.clone(),
            version: self.version.clone(),
            dut_info: dut.clone(),
        }));
        TestRun::default()
    }

    /// Closes a test run, deriving its result from the recorded diagnoses.
    pub fn end_run(&self, run: TestRun, status: TestStatus) -> TestResult {
        let result = run.result();
        self.emit(ReportArtifact::TestRunArtifact(RunArtifact::TestRunEnd {
            status,
            result,
        }));
        result
    }

    /// Opens a named test step.
    #[must_use]
    pub fn start_step(&self, name: impl Into<String>) -> TestStep {
        let step = TestStep {
            id: self.next_step.fetch_add(1, Ordering::Relaxed).to_string(),
        };
        self.emit_step(&step, StepPayload::TestStepStart {
            name: name.into(),
        });
        step
    }

    /// Records a diagnosis on a step and folds it into the run result.
    pub fn diagnosis(
        &self,
        run: &mut TestRun,
        step: &TestStep,
        kind: DiagnosisType,
        verdict: impl Into<String>,
    ) {
        run.diagnosed = true;
        if kind == DiagnosisType::Fail {
            run.failed = true;
        }
        self.emit_step(step, StepPayload::Diagnosis {
            verdict: verdict.into(),
            kind,
        });
    }

    /// Attaches a file to a step.
    pub fn file(&self, step: &TestStep, path: &Path) {
        let display_name = path.display().to_string();
        self.emit_step(step, StepPayload::File {
            uri: format!("file://{display_name}"),
            display_name,
        });
    }

    /// Emits a step-level log message.
    pub fn step_log(&self, step: &TestStep, severity: Severity, message: impl Into<String>) {
        self.emit_step(step, StepPayload::Log(LogEntry {
            severity,
            message: message.into(),
        }));
    }

    /// Closes a step.
    pub fn end_step(&self, step: TestStep, status: TestStatus) {
        self.emit_step(&step, StepPayload::TestStepEnd {
            status,
        });
    }

    /// Wraps a step payload and emits it.
    fn emit_step(&self, step: &TestStep, payload: StepPayload) {
        self.emit(ReportArtifact::TestStepArtifact(StepArtifact {
            test_step_id: step.id.clone(),
            payload,
        }));
    }

    /// Stamps an artifact and hands it to the sink.
    fn emit(&self, artifact: ReportArtifact) {
        let record = ReportRecord {
            sequence_number: self.sequence.fetch_add(1, Ordering::Relaxed),
            timestamp_ms: u64::try_from(
                SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis(),
            )
            .unwrap_or(u64::MAX),
            artifact,
        };
        self.sink.record(&record);
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that writes JSON lines to stdout.
pub struct StdoutReportSink;

impl ReportSink for StdoutReportSink {
    fn record(&self, record: &ReportRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stdout(), "{payload}");
        }
    }
}

/// Sink that writes JSON lines to stderr.
pub struct StderrReportSink;

impl ReportSink for StderrReportSink {
    fn record(&self, record: &ReportRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileReportSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileReportSink {
    /// Opens the report file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ReportSink for FileReportSink {
    fn record(&self, record: &ReportRecord) {
        if let Ok(payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryReportSink {
    /// Captured records.
    records: Mutex<Vec<ReportRecord>>,
}

impl MemoryReportSink {
    /// Returns a snapshot of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

impl ReportSink for MemoryReportSink {
    fn record(&self, record: &ReportRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}
