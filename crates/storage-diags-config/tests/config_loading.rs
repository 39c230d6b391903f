//! Config file loading tests for storage-diags-config.
// crates/storage-diags-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Validate file resolution and size/encoding limits.
// Purpose: Ensure explicit files must exist and malformed files fail closed.
// =============================================================================

use storage_diags_config::HarnessConfig;
use storage_diags_config::ReportSinkKind;

mod common;

type TestResult = Result<(), String>;

#[test]
fn explicit_file_is_loaded() -> TestResult {
    let (_dir, path) = common::write_config(
        b"[report]\nsink = \"stderr\"\n\n[run]\ntest_name = \"Nightly\"\n",
    )?;
    let config = HarnessConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.report.sink != ReportSinkKind::Stderr || config.run.test_name != "Nightly" {
        return Err("loaded values did not match file".to_string());
    }
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    common::assert_invalid(HarnessConfig::load(Some(&path)), "config io error")
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let mut contents = b"# padding\n".to_vec();
    contents.resize(1024 * 1024 + 1, b'#');
    let (_dir, path) = common::write_config(&contents)?;
    common::assert_invalid(HarnessConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let (_dir, path) = common::write_config(&[0xff, 0xfe, 0x00])?;
    common::assert_invalid(HarnessConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn invalid_values_fail_validation_on_load() -> TestResult {
    let (_dir, path) = common::write_config(b"[tools]\nfio_output_format = \"normal\"\n")?;
    common::assert_invalid(HarnessConfig::load(Some(&path)), "tools.fio_output_format")
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    let (_dir, path) = common::write_config(b"[tools\n")?;
    common::assert_invalid(HarnessConfig::load(Some(&path)), "config parse error")
}
