// ABOUTME: Benchmark results per hash mode and device, plus a cross-device summary
// ABOUTME: Normalises engine speed units to MH/s for aggregation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use serde::{Deserialize, Serialize};

/// Unit used for [`BenchmarkSummary::total_speed`]
pub const SUMMARY_SPEED_UNIT: &str = "MH/s";

/// Benchmark of a single hash mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Hash mode id
    pub hash_mode: u32,
    /// Hash mode name
    pub hash_name: String,
    /// Per-device results
    pub device_results: Vec<BenchmarkResult>,
}

/// One device's benchmark line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Backend device id
    pub device_id: u32,
    /// Speed value in `speed_unit`
    pub speed: f64,
    /// Unit reported by the engine (`H/s`, `kH/s`, `MH/s`, `GH/s`, `TH/s`)
    pub speed_unit: String,
    /// Kernel time per hash batch in milliseconds (0.0 when not reported)
    pub time_per_hash_ms: f64,
    /// Kernel accel
    pub acceleration: u32,
    /// Kernel loops
    pub loops: u32,
    /// Kernel threads
    pub threads: u32,
    /// Vector width
    pub vector_size: u32,
}

impl BenchmarkResult {
    /// Speed converted to MH/s
    #[must_use]
    pub fn speed_mhs(&self) -> f64 {
        match self.speed_unit.as_str() {
            "TH/s" => self.speed * 1_000_000.0,
            "GH/s" => self.speed * 1_000.0,
            "kH/s" => self.speed / 1_000.0,
            "H/s" => self.speed / 1_000_000.0,
            _ => self.speed,
        }
    }
}

/// Aggregate over every device result in a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Sum of normalised speeds
    pub total_speed: f64,
    /// Unit of `total_speed`
    pub speed_unit: String,
    /// Mean of `time_per_hash_ms` across device results
    pub avg_time_per_hash_ms: f64,
}

/// Full benchmark response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResponse {
    /// Benchmarks in report order
    pub benchmarks: Vec<Benchmark>,
    /// Summary (populated by multi-mode benchmarks)
    #[serde(default)]
    pub summary: BenchmarkSummary,
    /// Hash modes whose benchmark failed and were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_hash_types: Vec<u32>,
}

impl BenchmarkResponse {
    /// Recompute `summary` from the current benchmarks
    pub fn summarize(&mut self) {
        let mut total_speed = 0.0;
        let mut total_time = 0.0;
        let mut count = 0usize;

        for result in self.benchmarks.iter().flat_map(|b| b.device_results.iter()) {
            total_speed += result.speed_mhs();
            total_time += result.time_per_hash_ms;
            count += 1;
        }

        self.summary = BenchmarkSummary {
            total_speed,
            speed_unit: SUMMARY_SPEED_UNIT.to_owned(),
            avg_time_per_hash_ms: if count == 0 {
                0.0
            } else {
                total_time / count as f64
            },
        };
    }
}
