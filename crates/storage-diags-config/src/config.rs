// crates/storage-diags-config/src/config.rs
// ============================================================================
// Module: Storage Diags Configuration
// Description: Configuration loading and validation for the diagnostic harness.
// Purpose: Resolve and bound-check storage-diags.toml before a run.
// Dependencies: storage-diags-core, storage-diags-devices, serde, toml
// ============================================================================

//! ## Overview
//! Harness settings come from one TOML file capped in size and path length.
//! An explicitly named file must exist; the implicit default file is optional
//! and every setting has a default. Unknown keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use storage_diags_core::OrchestratorConfig;
use storage_diags_devices::DEFAULT_PERSISTENT_EVENT_LOG_LENGTH;
use storage_diags_devices::GenericDeviceConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "storage-diags.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STORAGE_DIAGS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest accepted persistent event log length.
pub(crate) const MAX_PERSISTENT_EVENT_LOG_LENGTH: u32 = 65_536;
/// Accepted load generator output formats.
const FIO_OUTPUT_FORMATS: [&str; 2] = ["json", "json+"];

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Root harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// External tool settings.
    pub tools: ToolsConfig,
    /// Report stream settings.
    pub report: ReportConfig,
    /// Test run identity.
    pub run: RunConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding scenario files and target descriptors.
    pub configs_dir: String,
    /// Root for per-device log directories; a fresh temp directory when unset.
    pub log_root: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            configs_dir: "configs".to_string(),
            log_root: None,
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Load generator executable.
    pub fio_path: String,
    /// Load generator output format.
    pub fio_output_format: String,
    /// nvme-cli executable.
    pub nvme_path: String,
    /// Length argument for the persistent event log query.
    pub persistent_event_log_length: u32,
    /// Command printing the host identifier.
    pub hostid_command: String,
    /// Command printing the host name.
    pub hostname_command: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            fio_path: "/usr/bin/fio".to_string(),
            fio_output_format: "json+".to_string(),
            nvme_path: "nvme".to_string(),
            persistent_event_log_length: DEFAULT_PERSISTENT_EVENT_LOG_LENGTH,
            hostid_command: "hostid".to_string(),
            hostname_command: "hostname".to_string(),
        }
    }
}

/// Report sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSinkKind {
    /// JSON lines on stdout.
    #[default]
    Stdout,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Report stream settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Sink kind.
    pub sink: ReportSinkKind,
    /// Report file, required for the file sink.
    pub path: Option<String>,
}

/// Test run identity written into run-start artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Test name.
    pub test_name: String,
    /// Test version.
    pub test_version: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            test_name: "BasicIODiag".to_string(),
            test_version: "1.0".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Loading and Validation
// ============================================================================

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let (resolved, explicit) = resolve_path(path, env_path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.tools.validate()?;
        self.report.validate()?;
        self.run.validate()
    }

    /// Builds orchestrator settings rooted at the given log directory.
    #[must_use]
    pub fn orchestrator_config(&self, log_root: PathBuf) -> OrchestratorConfig {
        OrchestratorConfig {
            fio_path: self.tools.fio_path.clone(),
            fio_output_format: self.tools.fio_output_format.clone(),
            configs_dir: PathBuf::from(&self.paths.configs_dir),
            log_root,
            hostid_command: self.tools.hostid_command.clone(),
            hostname_command: self.tools.hostname_command.clone(),
        }
    }

    /// Builds settings for the generic device driver.
    #[must_use]
    pub fn device_config(&self) -> GenericDeviceConfig {
        GenericDeviceConfig {
            nvme_path: self.tools.nvme_path.clone(),
            persistent_event_log_length: self.tools.persistent_event_log_length,
        }
    }
}

impl PathsConfig {
    /// Validates filesystem locations.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.configs_dir", &self.configs_dir)?;
        if let Some(log_root) = &self.log_root {
            validate_path_string("paths.log_root", log_root)?;
        }
        Ok(())
    }
}

impl ToolsConfig {
    /// Validates tool settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("tools.fio_path", &self.fio_path)?;
        validate_path_string("tools.nvme_path", &self.nvme_path)?;
        validate_non_empty("tools.hostid_command", &self.hostid_command)?;
        validate_non_empty("tools.hostname_command", &self.hostname_command)?;
        if !FIO_OUTPUT_FORMATS.contains(&self.fio_output_format.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "tools.fio_output_format must be one of {}",
                FIO_OUTPUT_FORMATS.join(", ")
            )));
        }
        if !(1 ..= MAX_PERSISTENT_EVENT_LOG_LENGTH).contains(&self.persistent_event_log_length) {
            return Err(ConfigError::Invalid(format!(
                "tools.persistent_event_log_length must be between 1 and \
                 {MAX_PERSISTENT_EVENT_LOG_LENGTH}"
            )));
        }
        Ok(())
    }
}

impl ReportConfig {
    /// Validates report settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (ReportSinkKind::File, None) => {
                Err(ConfigError::Invalid("report.sink=file requires report.path".to_string()))
            }
            (_, Some(path)) => validate_path_string("report.path", path),
            (_, None) => Ok(()),
        }
    }
}

impl RunConfig {
    /// Validates the run identity.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_non_empty("run.test_name", &self.test_name)?;
        validate_non_empty("run.test_version", &self.test_version)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config values violate a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the flag, the environment, or the default.
///
/// Returns the path and whether it was named explicitly.
fn resolve_path(
    path: Option<&Path>,
    env_path: Option<String>,
) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_non_empty(field, value)?;
    let trimmed = value.trim();
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Rejects empty or whitespace-only values.
fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
