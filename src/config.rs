// ABOUTME: Client configuration for driving the hashcat binary
// ABOUTME: Builder-style defaults, validation, environment overrides, and optional TOML loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config-file")]
use serde::Deserialize;

use crate::types::HashcatError;

/// Binary name looked up on `PATH` when no explicit path is configured
pub const DEFAULT_BINARY_NAME: &str = "hashcat";

/// Environment variable that overrides the binary path
pub const BINARY_ENV_KEY: &str = "HASHCAT_BINARY";

/// Default timeout for one-shot commands such as `--backend-info` (120 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default results-file poll interval
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of unread progress records retained per session
pub const DEFAULT_PROGRESS_CAPACITY: usize = 10;

/// Highest attack mode accepted by the engine
pub const MAX_ATTACK_MODE: u8 = 9;

/// Configuration shared by a client and every session it creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashcatConfig {
    /// Path (or bare name) of the hashcat binary
    pub binary_path: PathBuf,
    /// Directory for per-session working files (system temp dir when `None`)
    pub work_dir: Option<PathBuf>,
    /// Attack mode used when callers do not pick one
    pub default_attack_mode: u8,
    /// Hash type used when callers do not pick one
    pub default_hash_type: u32,
    /// Extra arguments appended to every crack invocation
    pub extra_args: Vec<String>,
    /// Timeout for one-shot commands (devices, hash info, benchmark, version)
    pub command_timeout: Duration,
    /// Interval between results-file polls
    pub poll_interval: Duration,
    /// Unread progress records retained before the oldest is dropped
    pub progress_capacity: usize,
    /// Environment variable keys passed through to the engine
    pub allowed_env_keys: Vec<String>,
}

impl Default for HashcatConfig {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_BINARY_NAME))
    }
}

impl HashcatConfig {
    /// Create a configuration for the given binary path
    #[must_use]
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            work_dir: None,
            default_attack_mode: 0,
            default_hash_type: 0,
            extra_args: Vec::new(),
            command_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            allowed_env_keys: default_allowed_env_keys(),
        }
    }

    /// Build a configuration from `HASHCAT_*` environment variables
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a config error when `HASHCAT_TIMEOUT_SECS` is not an integer.
    pub fn from_env() -> Result<Self, HashcatError> {
        let mut config = Self::default();

        if let Ok(path) = env::var(BINARY_ENV_KEY) {
            config.binary_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("HASHCAT_WORK_DIR") {
            config.work_dir = Some(PathBuf::from(dir));
        }
        if let Ok(raw) = env::var("HASHCAT_TIMEOUT_SECS") {
            config.command_timeout = parse_timeout(&raw).map_err(|e| {
                HashcatError::config(format!("Invalid HASHCAT_TIMEOUT_SECS '{raw}': {e}"))
            })?;
        }
        if let Ok(raw) = env::var("HASHCAT_EXTRA_ARGS") {
            config.extra_args = parse_list(&raw);
        }
        if let Ok(raw) = env::var("HASHCAT_ALLOWED_ENV") {
            config.allowed_env_keys = parse_list(&raw);
        }

        Ok(config)
    }

    /// Set the directory for per-session working files
    #[must_use]
    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    /// Set the default attack mode
    #[must_use]
    pub const fn with_default_attack_mode(mut self, mode: u8) -> Self {
        self.default_attack_mode = mode;
        self
    }

    /// Set the default hash type
    #[must_use]
    pub const fn with_default_hash_type(mut self, hash_type: u32) -> Self {
        self.default_hash_type = hash_type;
        self
    }

    /// Append extra arguments to every crack invocation
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Set the one-shot command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the results-file poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how many unread progress records a session retains
    #[must_use]
    pub const fn with_progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = capacity;
        self
    }

    /// Set the environment variable keys passed through to the engine
    #[must_use]
    pub fn with_allowed_env_keys(mut self, keys: Vec<String>) -> Self {
        self.allowed_env_keys = keys;
        self
    }

    /// Check the configuration for values the engine would reject
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first invalid value.
    pub fn validate(&self) -> Result<(), HashcatError> {
        if self.binary_path.as_os_str().is_empty() {
            return Err(HashcatError::config("invalid hashcat binary path"));
        }
        if self
            .work_dir
            .as_ref()
            .is_some_and(|d| d.as_os_str().is_empty())
        {
            return Err(HashcatError::config("invalid work directory"));
        }
        if self.default_attack_mode > MAX_ATTACK_MODE {
            return Err(HashcatError::config(format!(
                "invalid attack mode {}, must be between 0 and {MAX_ATTACK_MODE}",
                self.default_attack_mode
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(HashcatError::config("poll interval must be non-zero"));
        }
        if self.progress_capacity == 0 {
            return Err(HashcatError::config("progress capacity must be non-zero"));
        }
        Ok(())
    }

    /// Directory that holds session working files
    #[must_use]
    pub fn resolved_work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Default set of environment variable keys safe to pass through to the engine
///
/// Includes the device-visibility variables GPU runtimes consult.
#[must_use]
pub fn default_allowed_env_keys() -> Vec<String> {
    [
        "HOME",
        "PATH",
        "TERM",
        "USER",
        "LANG",
        "TMPDIR",
        "LD_LIBRARY_PATH",
        "CUDA_VISIBLE_DEVICES",
        "HIP_VISIBLE_DEVICES",
    ]
    .iter()
    .map(|k| (*k).to_owned())
    .collect()
}

/// Parse a comma-separated list, dropping empty entries
#[must_use]
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse a timeout value from a string (in seconds)
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a `u64`.
pub fn parse_timeout(input: &str) -> Result<Duration, ParseIntError> {
    input.trim().parse::<u64>().map(Duration::from_secs)
}

// ============================================================================
// Config File
// ============================================================================

/// On-disk representation; every key is optional
#[cfg(feature = "config-file")]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    binary_path: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    default_attack_mode: Option<u8>,
    default_hash_type: Option<u32>,
    extra_args: Option<Vec<String>>,
    command_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    progress_capacity: Option<usize>,
    allowed_env_keys: Option<Vec<String>>,
}

#[cfg(feature = "config-file")]
impl HashcatConfig {
    /// Parse a TOML document, applying its keys over the defaults
    ///
    /// # Errors
    ///
    /// Returns a config error when the document is not valid TOML or has
    /// unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, HashcatError> {
        let file: FileConfig = toml::from_str(input)
            .map_err(|e| HashcatError::config(format!("Invalid config file: {e}")))?;

        let mut config = Self::default();
        if let Some(path) = file.binary_path {
            config.binary_path = path;
        }
        config.work_dir = file.work_dir.or(config.work_dir);
        if let Some(mode) = file.default_attack_mode {
            config.default_attack_mode = mode;
        }
        if let Some(hash_type) = file.default_hash_type {
            config.default_hash_type = hash_type;
        }
        if let Some(args) = file.extra_args {
            config.extra_args = args;
        }
        if let Some(secs) = file.command_timeout_secs {
            config.command_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = file.progress_capacity {
            config.progress_capacity = capacity;
        }
        if let Some(keys) = file.allowed_env_keys {
            config.allowed_env_keys = keys;
        }
        Ok(config)
    }

    /// Load `<config dir>/hashcat-runner/config.toml`, or defaults if absent
    ///
    /// # Errors
    ///
    /// Returns a config error when the file exists but cannot be read or parsed.
    pub fn load_default_file() -> Result<Self, HashcatError> {
        let Some(path) = dirs::config_dir().map(|d| d.join("hashcat-runner").join("config.toml"))
        else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(HashcatError::config(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}
