// ABOUTME: Parser for the per-mode speed tables printed by hashcat --benchmark
// ABOUTME: Attaches each Speed.#N line to the most recent Hash-Mode header
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::models::{Benchmark, BenchmarkResponse, BenchmarkResult};

static HASH_MODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\* Hash-Mode (\d+) \((.+)\)").expect("hash mode regex")
});

/// `Speed.#1.........:  1234.5 MH/s (52.10ms) @ Accel:64 Loops:512 Thr:256 Vec:8`
///
/// Aggregate `Speed.#*` rows do not match and are skipped.
static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"Speed\.#(\d+)\.+:\s+([0-9.]+)\s+([kMGT]?H/s).*?@\s+Accel:(\d+)\s+Loops:(\d+)\s+Thr:(\d+)\s+Vec:(\d+)",
    )
    .expect("speed regex")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\(([\d.]+)ms\)").expect("time per hash regex")
});

fn number<T: std::str::FromStr + Default>(caps: &Captures<'_>, index: usize) -> T {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

fn parse_speed_line(line: &str) -> Option<BenchmarkResult> {
    let caps = SPEED_RE.captures(line)?;
    let time_per_hash_ms = TIME_RE
        .captures(line)
        .map_or(0.0, |t| number(&t, 1));

    Some(BenchmarkResult {
        device_id: number(&caps, 1),
        speed: number(&caps, 2),
        speed_unit: caps[3].to_owned(),
        time_per_hash_ms,
        acceleration: number(&caps, 4),
        loops: number(&caps, 5),
        threads: number(&caps, 6),
        vector_size: number(&caps, 7),
    })
}

/// Parse `--benchmark` output
///
/// Speed rows are attached to the most recent `* Hash-Mode` header. When
/// the engine prints speed rows without any header (single-mode runs on
/// some versions), they are grouped under `hash_type` with an empty name.
/// Unparseable lines are ignored; the summary is left for the caller.
#[must_use]
pub fn parse_benchmark_output(output: &str, hash_type: u32) -> BenchmarkResponse {
    let mut benchmarks: Vec<Benchmark> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = HASH_MODE_RE.captures(line) {
            benchmarks.push(Benchmark {
                hash_mode: number(&caps, 1),
                hash_name: caps[2].to_owned(),
                device_results: Vec::new(),
            });
            continue;
        }

        let Some(result) = parse_speed_line(line) else {
            continue;
        };

        if benchmarks.is_empty() {
            debug!(hash_type, "Speed row without Hash-Mode header");
            benchmarks.push(Benchmark {
                hash_mode: hash_type,
                ..Benchmark::default()
            });
        }
        if let Some(current) = benchmarks.last_mut() {
            current.device_results.push(result);
        }
    }

    BenchmarkResponse {
        benchmarks,
        ..BenchmarkResponse::default()
    }
}
