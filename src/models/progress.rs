// ABOUTME: Progress snapshot emitted by hashcat's --status-json output and derived statistics
// ABOUTME: Decodes status codes, guess details, per-device speeds, and computes ProgressStats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Engine run state as reported in the `status` field
///
/// Variants are declared in the engine's numeric order so that `Ord`
/// follows the reported code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CrackingStatus {
    /// Unrecognised or missing status code
    Unknown,
    /// Engine is initialising
    Init,
    /// Engine is running
    Running,
    /// Keyspace exhausted without cracking every hash
    Exhausted,
    /// Every target hash was cracked
    Cracked,
    /// Run was aborted
    Aborted,
    /// Run was quit by the user
    Quit,
    /// Run is paused
    Paused,
}

impl CrackingStatus {
    /// Numeric code used by the engine
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Init => 1,
            Self::Running => 3,
            Self::Exhausted => 5,
            Self::Cracked => 6,
            Self::Aborted => 7,
            Self::Quit => 8,
            Self::Paused => 9,
        }
    }

    /// Whether no further progress is expected after this status
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Cracked | Self::Aborted)
    }
}

impl From<i64> for CrackingStatus {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Init,
            3 => Self::Running,
            5 => Self::Exhausted,
            6 => Self::Cracked,
            7 => Self::Aborted,
            8 => Self::Quit,
            9 => Self::Paused,
            _ => Self::Unknown,
        }
    }
}

impl From<CrackingStatus> for i64 {
    fn from(status: CrackingStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for CrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Init => "init",
            Self::Running => "running",
            Self::Exhausted => "exhausted",
            Self::Cracked => "cracked",
            Self::Aborted => "aborted",
            Self::Quit => "quit",
            Self::Paused => "paused",
        };
        f.write_str(label)
    }
}

/// Candidate-generation details for the current guess
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guess {
    /// Base wordlist or mask
    pub guess_base: Option<String>,
    /// Number of base entries
    pub guess_base_count: u64,
    /// Current offset into the base entries
    pub guess_base_offset: u64,
    /// Percent of base entries processed
    pub guess_base_percent: f64,
    /// Length of the current mask
    pub guess_mask_length: u32,
    /// Modifier (rules file, second wordlist)
    pub guess_mod: Option<String>,
    /// Number of modifier entries
    pub guess_mod_count: u64,
    /// Current offset into the modifier entries
    pub guess_mod_offset: u64,
    /// Percent of modifier entries processed
    pub guess_mod_percent: f64,
    /// Guess mode identifier
    pub guess_mode: i64,
}

/// Per-device snapshot inside a progress record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Backend device id
    pub device_id: u32,
    /// Device name
    #[serde(default)]
    pub device_name: String,
    /// Device type (CPU, GPU)
    #[serde(default)]
    pub device_type: String,
    /// Hashes per second
    #[serde(default)]
    pub speed: u64,
    /// Temperature in degrees Celsius, when the driver reports it
    #[serde(default, rename = "temp", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    /// Utilisation percentage, when the driver reports it
    #[serde(default, rename = "util", skip_serializing_if = "Option::is_none")]
    pub utilization: Option<i32>,
}

/// One status snapshot from the engine's primary output stream
///
/// `session`, `status` and `progress` are required so that arbitrary JSON
/// objects on stdout are not mistaken for status lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Session name the engine was started with
    pub session: String,
    /// Current guess details
    #[serde(default)]
    pub guess: Guess,
    /// Run state
    pub status: CrackingStatus,
    /// Target description (hash or hash file)
    #[serde(default)]
    pub target: String,
    /// Candidates processed and total keyspace
    pub progress: [u64; 2],
    /// Restore checkpoint
    #[serde(default)]
    pub restore_point: u64,
    /// Recovered and total hashes
    #[serde(default)]
    pub recovered_hashes: [u32; 2],
    /// Recovered and total salts
    #[serde(default)]
    pub recovered_salts: [u32; 2],
    /// Rejected candidates
    #[serde(default)]
    pub rejected: u64,
    /// Per-device snapshots
    #[serde(default)]
    pub devices: Vec<DeviceStatus>,
    /// Unix timestamp the run started
    #[serde(default)]
    pub time_start: i64,
    /// Unix timestamp the engine estimates the run will stop
    #[serde(default)]
    pub estimated_stop: i64,
}

/// Statistics derived from a [`Progress`] snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressStats {
    /// Percent of the keyspace processed (0.0 when the total is not yet known)
    pub percent_complete: f64,
    /// Time since the run started
    pub elapsed: Duration,
    /// Time until the estimated stop
    pub estimated_remaining: Duration,
    /// Sum of device speeds in hashes per second
    pub total_speed: u64,
    /// Hashes recovered so far
    pub hashes_recovered: u32,
    /// Total target hashes
    pub total_hashes: u32,
    /// Salts recovered so far
    pub salts_recovered: u32,
    /// Total target salts
    pub total_salts: u32,
}

impl Progress {
    /// Compute statistics relative to the current wall clock
    #[must_use]
    pub fn calculate_stats(&self) -> ProgressStats {
        self.calculate_stats_at(Utc::now().timestamp())
    }

    /// Compute statistics relative to `now` (Unix seconds)
    #[must_use]
    pub fn calculate_stats_at(&self, now: i64) -> ProgressStats {
        let [done, total] = self.progress;
        let percent_complete = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64 * 100.0
        };

        ProgressStats {
            percent_complete,
            elapsed: seconds_between(self.time_start, now),
            estimated_remaining: seconds_between(now, self.estimated_stop),
            total_speed: self.total_speed(),
            hashes_recovered: self.recovered_hashes[0],
            total_hashes: self.recovered_hashes[1],
            salts_recovered: self.recovered_salts[0],
            total_salts: self.recovered_salts[1],
        }
    }

    /// Aggregate speed across all devices in hashes per second
    #[must_use]
    pub fn total_speed(&self) -> u64 {
        self.devices
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.speed))
    }
}

/// Non-negative duration from `from` to `to`, both in Unix seconds
fn seconds_between(from: i64, to: i64) -> Duration {
    Duration::from_secs(u64::try_from(to.saturating_sub(from)).unwrap_or(0))
}
