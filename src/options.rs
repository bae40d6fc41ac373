// ABOUTME: Typed crack parameters and the engine argument list built from them
// ABOUTME: Validates attack mode and workload tier before anything is spawned
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MAX_ATTACK_MODE;
use crate::types::HashcatError;

/// Lowest workload profile accepted by the engine
pub const MIN_WORKLOAD: u8 = 1;

/// Highest workload profile accepted by the engine
pub const MAX_WORKLOAD: u8 = 4;

/// Parameters for one cracking run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrackOptions {
    /// Engine hash-mode id (0 = MD5)
    pub hash_type: u32,
    /// Engine attack-mode id (0 = dictionary, 3 = mask)
    pub attack_mode: u8,
    /// Mask or wordlist path, passed as the final positional argument
    pub mask: String,
    /// Rule files applied in order
    pub rules: Vec<String>,
    /// Whether to pass `--optimized-kernel-enable`
    pub optimized_kernel: bool,
    /// Workload profile tier (1..=4), engine default when `None`
    pub workload: Option<u8>,
    /// Device type ids to restrict the run to
    pub device_ids: Vec<u32>,
}

impl Default for CrackOptions {
    fn default() -> Self {
        Self {
            hash_type: 0,
            attack_mode: 0,
            mask: String::new(),
            rules: Vec::new(),
            optimized_kernel: true,
            workload: None,
            device_ids: Vec::new(),
        }
    }
}

impl CrackOptions {
    /// Create options for a hash type, attack mode and mask
    #[must_use]
    pub fn new(hash_type: u32, attack_mode: u8, mask: impl Into<String>) -> Self {
        Self {
            hash_type,
            attack_mode,
            mask: mask.into(),
            ..Self::default()
        }
    }

    /// Append a rule file
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Enable or disable optimized kernels
    #[must_use]
    pub const fn with_optimized_kernel(mut self, enabled: bool) -> Self {
        self.optimized_kernel = enabled;
        self
    }

    /// Set the workload profile tier
    #[must_use]
    pub const fn with_workload(mut self, workload: u8) -> Self {
        self.workload = Some(workload);
        self
    }

    /// Restrict the run to the given device type ids
    #[must_use]
    pub fn with_devices(mut self, device_ids: Vec<u32>) -> Self {
        self.device_ids = device_ids;
        self
    }

    /// Reject values the engine would refuse
    ///
    /// # Errors
    ///
    /// Returns a config error for an out-of-range attack mode or workload.
    pub fn validate(&self) -> Result<(), HashcatError> {
        if self.attack_mode > MAX_ATTACK_MODE {
            return Err(HashcatError::config(format!(
                "invalid attack mode {}, must be between 0 and {MAX_ATTACK_MODE}",
                self.attack_mode
            )));
        }
        if let Some(w) = self.workload {
            if !(MIN_WORKLOAD..=MAX_WORKLOAD).contains(&w) {
                return Err(HashcatError::config(format!(
                    "invalid workload {w}, must be between {MIN_WORKLOAD} and {MAX_WORKLOAD}"
                )));
            }
        }
        Ok(())
    }
}

/// Working-file locations and identity of one session run
#[derive(Debug, Clone, Copy)]
pub struct SessionPaths<'a> {
    /// Name passed via `--session`
    pub session: &'a str,
    /// Hash file, or the literal hash when no file is used
    pub target: &'a str,
    /// Results file the engine appends to
    pub outfile: &'a Path,
    /// Potfile private to this session
    pub potfile: &'a Path,
}

/// Build the engine argument list for a crack run
///
/// Ordering follows what the engine parser expects: typed flags first,
/// status reporting, session files, optional tuning, then the positional
/// target and mask.
#[must_use]
pub fn build_crack_args(
    options: &CrackOptions,
    paths: SessionPaths<'_>,
    extra_args: &[String],
) -> Vec<String> {
    let mut args = vec![
        format!("--hash-type={}", options.hash_type),
        format!("--attack-mode={}", options.attack_mode),
    ];

    if options.optimized_kernel {
        args.push("--optimized-kernel-enable".to_owned());
    }

    args.extend(
        [
            "--quiet",
            "--status",
            "--status-json",
            "--status-timer",
            "1",
            "--session",
        ]
        .map(str::to_owned),
    );
    args.push(paths.session.to_owned());
    args.push("--outfile".to_owned());
    args.push(paths.outfile.display().to_string());
    args.push("--potfile-path".to_owned());
    args.push(paths.potfile.display().to_string());

    if let Some(w) = options.workload {
        args.push(format!("--workload-profile={w}"));
    }
    for rule in &options.rules {
        args.push(format!("--rule={rule}"));
    }
    for id in &options.device_ids {
        args.push(format!("--opencl-device-types={id}"));
    }

    args.extend(extra_args.iter().cloned());
    args.push(paths.target.to_owned());
    args.push(options.mask.clone());
    args
}
