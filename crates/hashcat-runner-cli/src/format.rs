// ABOUTME: Terminal presentation helpers for speeds, durations, and progress bars
// ABOUTME: Pure string formatting shared by the crack and benchmark subcommands
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::time::Duration;

use hashcat_runner::ProgressStats;

const SPEED_UNITS: [&str; 4] = ["H/s", "kH/s", "MH/s", "GH/s"];

/// Format a hash rate with the largest unit that keeps the value >= 1
pub fn format_speed(hashes_per_sec: u64) -> String {
    let mut value = hashes_per_sec as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < SPEED_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{hashes_per_sec} {}", SPEED_UNITS[0])
    } else {
        format!("{value:.2} {}", SPEED_UNITS[unit])
    }
}

/// Format a duration as `1h 02m 03s`, dropping leading zero components
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Render `[#####-----]` for a percentage clamped to 0..=100
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One status line for a progress snapshot
pub fn status_line(stats: &ProgressStats) -> String {
    format!(
        "{} {:5.1}% | {} | elapsed {} | eta {} | recovered {}/{}",
        progress_bar(stats.percent_complete, 30),
        stats.percent_complete,
        format_speed(stats.total_speed),
        format_duration(stats.elapsed),
        format_duration(stats.estimated_remaining),
        stats.hashes_recovered,
        stats.total_hashes,
    )
}
