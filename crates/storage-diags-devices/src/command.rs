// crates/storage-diags-devices/src/command.rs
// ============================================================================
// Module: System Command Runner
// Description: Blocking process runner for external diagnostic tools.
// Purpose: Run the load generator and device management CLI to completion.
// Dependencies: storage-diags-core
// ============================================================================

//! ## Overview
//! [`SystemCommandRunner`] launches a program with an explicit argument list
//! (no shell), waits for it to exit, and returns captured stdout. Non-zero
//! exit is an error carrying captured stderr. There is no timeout: a hung
//! tool blocks the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Command;
use std::process::Stdio;

use storage_diags_core::CommandError;
use storage_diags_core::CommandRunner;

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Creates a system runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| CommandError::Spawn {
                program: program.to_string(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(CommandError::Status {
                program: program.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| CommandError::Utf8 {
            program: program.to_string(),
        })
    }
}
