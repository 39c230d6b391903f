// crates/storage-diags-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: End-to-end tests for run, evaluate, and config commands.
// Purpose: Validate exit codes and outputs of the storage-diags binary.
// Dependencies: storage-diags binary, tempfile
// ============================================================================
//! ## Overview
//! Runs the compiled binary against stub `fio`, `nvme`, and host identity
//! scripts written into a temp directory, so the full lifecycle executes
//! without real devices.
//!
//! Exit codes: 0 passed, 1 fatal error, 2 performance targets missed.

#![cfg(unix)]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes tests that write and then execute stub scripts.
///
/// A concurrent fork can briefly hold a write handle to a fresh script and
/// make its exec fail with `ETXTBSY`.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Load generator stub: fails jobs whose scenario name starts with `bad`.
const FIO_STUB: &str = r#"#!/bin/sh
for last in "$@"; do :; done
case "$last" in
  */bad*) err=5 ;;
  *) err=0 ;;
esac
printf '{"jobs": [{"jobname": "stub", "error": %s, "write": {"bw": 2048, "clat_ns": {"percentile": {"99.000000": 1000}}}}]}\n' "$err"
"#;

/// nvme-cli stub: prints JSON for queries and creates the telemetry file.
const NVME_STUB: &str = r#"#!/bin/sh
case "$1" in
  telemetry-log)
    for arg in "$@"; do
      case "$arg" in
        --output-file=*) : > "${arg#--output-file=}" ;;
      esac
    done
    ;;
  *) printf '{"subcommand": "%s"}\n' "$1" ;;
esac
"#;

/// Returns the compiled CLI binary path.
fn storage_diags_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_storage-diags"))
}

/// Temp workspace with stub tools, configs, and a harness config file.
struct Workspace {
    /// Root directory, removed on drop.
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace whose playbook runs the given scenarios.
    fn new(scenarios: &[&str], bw_floor_mbps: Option<u64>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let bin = root.join("bin");
        let configs = root.join("configs");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&configs).unwrap();

        write_script(&bin.join("fio"), FIO_STUB);
        write_script(&bin.join("nvme"), NVME_STUB);
        write_script(&bin.join("hostid"), "#!/bin/sh\necho a8c0ff01\n");
        write_script(&bin.join("hostname"), "#!/bin/sh\necho bench-host\n");

        let mut playbook = serde_steps(scenarios);
        if let Some(floor) = bw_floor_mbps {
            playbook.push_str(r#", "benchmark_targets": "targets.json""#);
            let targets = format!(
                r#"{{"basename": "basic_io", "workloads": [{{"ioType": "randwrite", "workloadNum": 1, "targets": {{"bwMbytesPerSec": "{floor}"}}}}]}}"#
            );
            fs::write(configs.join("targets.json"), targets).unwrap();
        }
        fs::write(configs.join("basic_io.json"), format!("{{{playbook}}}")).unwrap();
        for scenario in scenarios {
            fs::write(configs.join(scenario), "[global]\nrw=randwrite\n").unwrap();
        }

        let config = format!(
            r#"
[paths]
configs_dir = "{configs}"
log_root = "{logs}"

[tools]
fio_path = "{bin}/fio"
nvme_path = "{bin}/nvme"
hostid_command = "{bin}/hostid"
hostname_command = "{bin}/hostname"

[report]
sink = "file"
path = "{report}"
"#,
            configs = configs.display(),
            logs = root.join("logs").display(),
            bin = bin.display(),
            report = root.join("report.jsonl").display(),
        );
        fs::write(root.join("storage-diags.toml"), config).unwrap();
        Self {
            dir,
        }
    }

    /// Returns the workspace root.
    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the config file path.
    fn config_path(&self) -> PathBuf {
        self.root().join("storage-diags.toml")
    }

    /// Runs the binary with `--config` pointing at this workspace.
    fn run(&self, args: &[&str]) -> Output {
        let config = self.config_path();
        let mut full = vec!["--config", config.to_str().unwrap()];
        full.extend_from_slice(args);
        run_bin(&full)
    }

    /// Returns the report stream contents.
    fn report(&self) -> String {
        fs::read_to_string(self.root().join("report.jsonl")).unwrap()
    }
}

/// Formats the `test_steps` member of a playbook.
fn serde_steps(scenarios: &[&str]) -> String {
    let steps: Vec<String> = scenarios.iter().map(|scenario| format!("\"{scenario}\"")).collect();
    format!(r#""test_steps": [{}]"#, steps.join(", "))
}

/// Writes an executable script.
fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Runs the binary without inheriting a config override.
fn run_bin(args: &[&str]) -> Output {
    Command::new(storage_diags_bin())
        .args(args)
        .env_remove("STORAGE_DIAGS_CONFIG")
        .output()
        .unwrap()
}

/// Takes the script lock, tolerating poisoning from a failed test.
fn script_lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns stdout and stderr as strings.
fn streams(output: &Output) -> (String, String) {
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies `--version` prints the package version.
#[test]
fn version_flag_prints_version() {
    let output = run_bin(&["--version"]);
    assert!(output.status.success());
    let (stdout, _) = streams(&output);
    assert_eq!(stdout.trim(), format!("storage-diags {}", env!("CARGO_PKG_VERSION")));
}

/// Verifies `config validate` accepts a well-formed config.
#[test]
fn config_validate_accepts_workspace_config() {
    let _guard = script_lock();
    let workspace = Workspace::new(&["seq_write.fio"], None);
    let output = workspace.run(&["config", "validate"]);
    let (stdout, stderr) = streams(&output);
    assert!(output.status.success(), "unexpected stderr: {stderr}");
    assert_eq!(stdout.trim(), "config ok");
}

/// Verifies `config validate` fails on invalid values.
#[test]
fn config_validate_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage-diags.toml");
    fs::write(&path, "[tools]\nfio_output_format = \"xml\"\n").unwrap();
    let output = run_bin(&["--config", path.to_str().unwrap(), "config", "validate"]);
    assert_eq!(output.status.code(), Some(1));
    let (_, stderr) = streams(&output);
    assert!(stderr.contains("failed to load config"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("fio_output_format"), "unexpected stderr: {stderr}");
}

/// Verifies a passing run exits zero and emits the raw tool output.
#[test]
fn run_passes_and_reports_raw_output() {
    let _guard = script_lock();
    let workspace = Workspace::new(&["seq_write.fio", "rand_write.fio"], Some(1));
    let output = workspace.run(&["run", "--duts", "/dev/stub0"]);
    let (stdout, stderr) = streams(&output);
    assert!(output.status.success(), "unexpected stderr: {stderr}");

    let documents: Vec<serde_json::Value> =
        stdout.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["jobs"][0]["error"], 0);

    let report = workspace.report();
    assert!(report.contains(r#""dutInfoId":"a8c0ff01""#), "unexpected report: {report}");
    assert!(report.contains("Performance test passed for /dev/stub0"));
    assert!(workspace.root().join("logs").join("stub0").is_dir());
}

/// Verifies a job error aborts the run, captures logs, and exits one.
#[test]
fn run_job_error_captures_logs_and_fails() {
    let _guard = script_lock();
    let workspace = Workspace::new(&["bad_write.fio", "seq_write.fio"], None);
    let output = workspace.run(&["run", "--duts", "/dev/stub0 /dev/stub1"]);
    assert_eq!(output.status.code(), Some(1));
    let (stdout, stderr) = streams(&output);
    assert!(stdout.is_empty(), "unexpected stdout: {stdout}");
    assert!(stderr.contains("error occurred in 'Run' step"), "unexpected stderr: {stderr}");

    let device_logs = workspace.root().join("logs").join("stub0");
    let error_file = device_logs.join("bad_write.fio_fio_error_log");
    assert!(stderr.contains(&format!("captured: {}", error_file.display())));
    assert!(fs::read_to_string(&error_file).unwrap().contains(r#""error": 5"#));
    assert!(device_logs.join("smart-log").is_file());
    assert!(device_logs.join("telemetry-log").is_file());
    assert!(!workspace.report().contains("seq_write.fio passed"));
}

/// Verifies missed performance targets exit with code two.
#[test]
fn run_missed_targets_exits_two() {
    let _guard = script_lock();
    let workspace = Workspace::new(&["seq_write.fio"], Some(100));
    let output = workspace.run(&["run", "--duts", "/dev/stub0"]);
    assert_eq!(output.status.code(), Some(2));
    let (stdout, stderr) = streams(&output);
    assert_eq!(stdout.lines().count(), 1);
    assert!(
        stderr.contains("/dev/stub0 missed performance targets: 1: write bwMbytesPerSec"),
        "unexpected stderr: {stderr}"
    );
    assert!(workspace.report().contains(r#""type":"FAIL""#));
}

/// Verifies an empty device list is rejected before any tool runs.
#[test]
fn run_rejects_empty_device_list() {
    let _guard = script_lock();
    let workspace = Workspace::new(&["seq_write.fio"], None);
    let output = workspace.run(&["run", "--duts", "  "]);
    assert_eq!(output.status.code(), Some(1));
    let (_, stderr) = streams(&output);
    assert!(stderr.contains("failed to prepare diagnostic run"), "unexpected stderr: {stderr}");
    assert!(!workspace.root().join("logs").exists());
}

/// Verifies offline evaluation passes and fails with the right exit codes.
#[test]
fn evaluate_reports_failed_workloads() {
    let dir = tempfile::tempdir().unwrap();
    let targets = dir.path().join("targets.json");
    let measurement = dir.path().join("measurement.json");
    fs::write(
        &targets,
        r#"{"basename": "basic_io", "workloads": [
            {"ioType": "randread", "workloadNum": 3, "targets": {"lat99thUsec": "5"}}
        ]}"#,
    )
    .unwrap();
    let targets_arg = targets.to_str().unwrap();
    let measurement_arg = measurement.to_str().unwrap();

    fs::write(
        &measurement,
        r#"{"jobs": [{"error": 0, "read": {"bw": 10, "clat_ns": {"percentile": {"99.000000": 5000}}}}]}"#,
    )
    .unwrap();
    let output =
        run_bin(&["evaluate", "--targets", targets_arg, "--measurement", measurement_arg]);
    assert!(output.status.success());
    let (stdout, _) = streams(&output);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["name"], "basic_io");

    fs::write(
        &measurement,
        r#"{"jobs": [{"error": 0, "read": {"bw": 10, "clat_ns": {"percentile": {"99.000000": 5001}}}}]}"#,
    )
    .unwrap();
    let output =
        run_bin(&["evaluate", "--targets", targets_arg, "--measurement", measurement_arg]);
    assert_eq!(output.status.code(), Some(2));
    let (stdout, _) = streams(&output);
    assert!(stdout.contains("lat99thUsec"), "unexpected stdout: {stdout}");
}

/// Verifies evaluation rejects malformed measurement documents.
#[test]
fn evaluate_rejects_invalid_measurement() {
    let dir = tempfile::tempdir().unwrap();
    let targets = dir.path().join("targets.json");
    let measurement = dir.path().join("measurement.json");
    fs::write(&targets, r#"{"basename": "b", "workloads": []}"#).unwrap();
    fs::write(&measurement, "fio: job failed").unwrap();
    let output = run_bin(&[
        "evaluate",
        "--targets",
        targets.to_str().unwrap(),
        "--measurement",
        measurement.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let (_, stderr) = streams(&output);
    assert!(stderr.contains("is not valid json"), "unexpected stderr: {stderr}");
}
