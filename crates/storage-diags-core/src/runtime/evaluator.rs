// crates/storage-diags-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Storage Diags Benchmark Evaluator
// Description: Unit-normalized comparison of measurements against targets.
// Purpose: Produce per-workload pass/fail verdicts from tool output.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! The evaluator is a pure function of its parsed target descriptor and a
//! measurement document. Latency thresholds are ceilings, bandwidth
//! thresholds are floors, and equality passes in both directions. Measured
//! values that cannot be located fail the metric.
//!
//! Declared latency is converted from microseconds to nanoseconds and
//! declared bandwidth from MB/s to KB/s, matching the tool's native units.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde_json::Value;

use crate::core::BenchmarkError;
use crate::core::FailedBenchmark;
use crate::core::FailedWorkload;
use crate::core::IoClass;
use crate::core::TargetDescriptor;
use crate::core::WorkloadDeclaration;
use crate::core::measurement::first_job;

// ============================================================================
// SECTION: Naming Table
// ============================================================================

/// Declared bandwidth metric name.
pub const BANDWIDTH_METRIC: &str = "bwMbytesPerSec";
/// Tool-native bandwidth key.
pub const TOOL_BANDWIDTH_KEY: &str = "bw";
/// Kilobytes per megabyte.
pub const KB_IN_MB: u64 = 1024;
/// Nanoseconds per microsecond.
pub const NS_IN_US: u64 = 1000;

/// Declared metric name paired with its tool-native key.
const METRIC_NAMES: [(&str, &str); 8] = [
    ("lat50thUsec", "50.000000"),
    ("lat95thUsec", "95.000000"),
    ("lat99thUsec", "99.000000"),
    ("lat999thUsec", "99.900000"),
    ("lat9999thUsec", "99.990000"),
    ("latMaxUsec", "max"),
    ("latMeanUsec", "mean"),
    (BANDWIDTH_METRIC, TOOL_BANDWIDTH_KEY),
];

/// Declared metric name to tool-native key.
static DECLARED_TO_TOOL: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| METRIC_NAMES.into_iter().collect());

/// Tool-native key to declared metric name.
static TOOL_TO_DECLARED: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| METRIC_NAMES.into_iter().map(|(declared, tool)| (tool, declared)).collect());

/// Translates a declared metric name into its tool-native key.
#[must_use]
pub fn tool_key(declared: &str) -> Option<&'static str> {
    DECLARED_TO_TOOL.get(declared).copied()
}

/// Translates a tool-native key back into the declared metric name.
#[must_use]
pub fn declared_name(tool_key: &str) -> Option<&'static str> {
    TOOL_TO_DECLARED.get(tool_key).copied()
}

/// Returns every declared metric name the table knows.
#[must_use]
pub fn declared_metric_names() -> Vec<&'static str> {
    METRIC_NAMES.iter().map(|(declared, _)| *declared).collect()
}

// ============================================================================
// SECTION: Workload
// ============================================================================

/// Latency ceiling in tool-native units.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LatencyTarget {
    /// Tool-native percentile key.
    tool_key: &'static str,
    /// Ceiling in nanoseconds.
    threshold_ns: u64,
}

/// Normalized workload target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// I/O class the workload is measured against.
    io_class: IoClass,
    /// Workload identifier.
    workload_id: u32,
    /// Latency ceilings, ordered by declared name.
    latency: Vec<LatencyTarget>,
    /// Bandwidth floor in KB/s.
    bandwidth_floor_kbps: u64,
    /// Whether the bandwidth floor was declared explicitly.
    bandwidth_declared: bool,
}

impl Workload {
    /// Normalizes a declared workload.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError`] for unsupported I/O types, unknown metric
    /// names, non-numeric thresholds, or conversion overflow.
    pub fn from_declaration(declaration: &WorkloadDeclaration) -> Result<Self, BenchmarkError> {
        let workload_id = declaration.workload_num;
        let io_class = IoClass::from_io_type(&declaration.io_type).ok_or_else(|| {
            BenchmarkError::UnsupportedIoType {
                workload: workload_id,
                io_type: declaration.io_type.clone(),
            }
        })?;

        let mut latency = Vec::new();
        let mut bandwidth_floor_kbps = 0;
        let mut bandwidth_declared = false;
        for (metric, value) in &declaration.targets {
            let key = tool_key(metric).ok_or_else(|| BenchmarkError::UnknownMetric {
                workload: workload_id,
                metric: metric.clone(),
            })?;
            let declared = value.as_u64().ok_or_else(|| BenchmarkError::InvalidThreshold {
                workload: workload_id,
                metric: metric.clone(),
            })?;
            let overflow = || BenchmarkError::ThresholdOverflow {
                workload: workload_id,
                metric: metric.clone(),
            };
            if key == TOOL_BANDWIDTH_KEY {
                bandwidth_floor_kbps = declared.checked_mul(KB_IN_MB).ok_or_else(overflow)?;
                bandwidth_declared = true;
            } else {
                latency.push(LatencyTarget {
                    tool_key: key,
                    threshold_ns: declared.checked_mul(NS_IN_US).ok_or_else(overflow)?,
                });
            }
        }

        Ok(Self {
            io_class,
            workload_id,
            latency,
            bandwidth_floor_kbps,
            bandwidth_declared,
        })
    }

    /// Returns the I/O class.
    #[must_use]
    pub const fn io_class(&self) -> IoClass {
        self.io_class
    }

    /// Returns the workload identifier.
    #[must_use]
    pub const fn workload_id(&self) -> u32 {
        self.workload_id
    }

    /// Returns the bandwidth floor in KB/s (zero when undeclared).
    #[must_use]
    pub const fn bandwidth_floor_kbps(&self) -> u64 {
        self.bandwidth_floor_kbps
    }

    /// Compares the workload against a measurement document.
    ///
    /// Returns `None` when every metric is satisfied.
    #[must_use]
    pub fn evaluate(&self, measurement: &Value) -> Option<FailedWorkload> {
        let class_doc = first_job(measurement).and_then(|job| job.get(self.io_class.as_str()));
        let clat = class_doc.and_then(|doc| doc.get("clat_ns"));
        let percentiles = clat.and_then(|clat| clat.get("percentile"));

        let mut failed = Vec::new();
        for target in &self.latency {
            let measured = percentiles
                .and_then(|table| table.get(target.tool_key))
                .or_else(|| clat.and_then(|clat| clat.get(target.tool_key)));
            let violated = measured.and_then(|value| ceiling_violated(target.threshold_ns, value));
            if violated.unwrap_or(true) {
                failed.push(report_name(target.tool_key));
            }
        }

        let measured_bw = class_doc.and_then(|doc| doc.get(TOOL_BANDWIDTH_KEY));
        let bw_violated = match measured_bw {
            Some(value) => floor_violated(self.bandwidth_floor_kbps, value).unwrap_or(true),
            None => self.bandwidth_declared,
        };
        if bw_violated {
            failed.push(report_name(TOOL_BANDWIDTH_KEY));
        }

        if failed.is_empty() {
            return None;
        }
        Some(FailedWorkload {
            io_type: self.io_class,
            workload_id: self.workload_id,
            failed_metrics: failed,
        })
    }
}

/// Returns the declared name for a tool key produced by the naming table.
fn report_name(tool_key: &'static str) -> String {
    declared_name(tool_key).unwrap_or(tool_key).to_string()
}

/// Returns whether a measured value strictly exceeds a ceiling.
fn ceiling_violated(threshold: u64, measured: &Value) -> Option<bool> {
    let number = measured.as_number()?;
    if let Some(value) = number.as_u64() {
        return Some(threshold < value);
    }
    if number.as_i64().is_some() {
        return Some(false);
    }
    let value = number.as_f64()?;
    Some(threshold_as_f64(threshold) < value)
}

/// Returns whether a measured value falls strictly below a floor.
fn floor_violated(threshold: u64, measured: &Value) -> Option<bool> {
    let number = measured.as_number()?;
    if let Some(value) = number.as_u64() {
        return Some(threshold > value);
    }
    if number.as_i64().is_some() {
        return Some(true);
    }
    let value = number.as_f64()?;
    Some(threshold_as_f64(threshold) > value)
}

/// Widens an integer threshold for comparison against fractional measurements.
#[allow(clippy::cast_precision_loss, reason = "Thresholds compared against f64 tool output.")]
fn threshold_as_f64(threshold: u64) -> f64 {
    threshold as f64
}

// ============================================================================
// SECTION: Benchmark Evaluator
// ============================================================================

/// Evaluates measurements against a parsed target descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkEvaluator {
    /// Benchmark name.
    name: String,
    /// Normalized workloads in declaration order.
    workloads: Vec<Workload>,
}

impl BenchmarkEvaluator {
    /// Builds an evaluator from a target descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError`] when any workload violates the descriptor
    /// contract.
    pub fn from_descriptor(descriptor: &TargetDescriptor) -> Result<Self, BenchmarkError> {
        let workloads = descriptor
            .workloads
            .iter()
            .map(Workload::from_declaration)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: descriptor.basename.clone(),
            workloads,
        })
    }

    /// Returns the benchmark name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized workloads.
    #[must_use]
    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    /// Evaluates every workload against a measurement document.
    #[must_use]
    pub fn evaluate(&self, measurement: &Value) -> FailedBenchmark {
        FailedBenchmark {
            name: self.name.clone(),
            failed_workloads: self
                .workloads
                .iter()
                .filter_map(|workload| workload.evaluate(measurement))
                .collect(),
        }
    }
}
