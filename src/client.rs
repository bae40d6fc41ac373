// ABOUTME: Entry point holding immutable configuration and the resolved hashcat binary
// ABOUTME: Runs one-shot info commands and creates supervised crack sessions
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::benchmark::parse_benchmark_output;
use crate::compat::{EngineCapabilities, MIN_VERSION};
use crate::config::{HashcatConfig, DEFAULT_BINARY_NAME};
use crate::devices::parse_device_output;
use crate::discovery::{discover_hashcat, resolve_binary};
use crate::hashes::parse_hash_info_output;
use crate::models::{BenchmarkResponse, DeviceList, HashFile, SupportedHashes};
use crate::options::CrackOptions;
use crate::process::{run_cli_command, CliOutput};
use crate::sandbox::SandboxPolicy;
use crate::session::{HashcatSession, SessionTarget};
use crate::types::{CrackSession, HashcatError, ProgressStream};

/// Output cap for one-shot commands (hash-info for every mode is the largest)
const MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// Client for one hashcat installation
///
/// Holds no per-run state: every crack run is an independent
/// [`HashcatSession`] that owns its own process.
#[derive(Debug, Clone)]
pub struct HashcatClient {
    config: HashcatConfig,
    binary: PathBuf,
}

impl HashcatClient {
    /// Validate `config` and locate the binary
    ///
    /// The default binary name triggers discovery of every known hashcat
    /// binary name on `PATH`; any other value must resolve as given.
    ///
    /// # Errors
    ///
    /// Returns a config error for invalid settings or a binary-not-found
    /// error when the binary cannot be located.
    pub fn new(config: HashcatConfig) -> Result<Self, HashcatError> {
        config.validate()?;

        let binary = if config.binary_path.as_os_str() == DEFAULT_BINARY_NAME {
            discover_hashcat()?
        } else {
            resolve_binary(&config.binary_path.to_string_lossy(), None)?
        };
        info!(binary = %binary.display(), "Using hashcat binary");

        Ok(Self { config, binary })
    }

    /// Resolved binary path
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &HashcatConfig {
        &self.config
    }

    /// Options seeded with the configured default hash type and attack mode
    #[must_use]
    pub fn default_options(&self, mask: impl Into<String>) -> CrackOptions {
        CrackOptions::new(
            self.config.default_hash_type,
            self.config.default_attack_mode,
            mask,
        )
    }

    /// Run a one-shot command in the work directory sandbox, failing on a non-zero exit
    async fn run(&self, operation: &str, args: &[String]) -> Result<CliOutput, HashcatError> {
        let policy = SandboxPolicy::for_config(&self.config)
            .map_err(|e| HashcatError::config(e.message))?;
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        policy.apply(&mut cmd);

        let output = run_cli_command(&mut cmd, self.config.command_timeout, MAX_OUTPUT_BYTES).await?;

        if output.exit_code != 0 {
            let stderr = output.stderr_text();
            let detail = if stderr.trim().is_empty() {
                output.stdout_text()
            } else {
                stderr
            };
            return Err(HashcatError::execution(
                operation,
                format!("exited with code {}: {}", output.exit_code, detail.trim()),
            ));
        }

        debug!(operation, duration = ?output.duration, "hashcat command succeeded");
        Ok(output)
    }

    /// List backend platforms and devices
    ///
    /// # Errors
    ///
    /// Returns an execution error if the command fails or a parse error if
    /// no platform is reported.
    pub async fn devices(&self) -> Result<DeviceList, HashcatError> {
        let output = self
            .run("device info", &to_args(&["--backend-info", "--quiet"]))
            .await?;
        parse_device_output(&output.stdout_text())
    }

    /// List every supported hash type, sorted by id
    ///
    /// # Errors
    ///
    /// Returns an execution or parse error.
    pub async fn supported_hashes(&self) -> Result<SupportedHashes, HashcatError> {
        let output = self
            .run(
                "hash info",
                &to_args(&["--machine-readable", "--hash-info", "--quiet"]),
            )
            .await?;
        parse_hash_info_output(&output.stdout_text())
    }

    /// Benchmark one hash type
    ///
    /// # Errors
    ///
    /// Returns an execution error if the benchmark command fails.
    pub async fn benchmark(&self, hash_type: u32) -> Result<BenchmarkResponse, HashcatError> {
        let args = vec![
            "--hash-type".to_owned(),
            hash_type.to_string(),
            "--benchmark".to_owned(),
            "--quiet".to_owned(),
        ];
        let output = self.run("benchmark", &args).await?;
        let mut response = parse_benchmark_output(&output.stdout_text(), hash_type);
        response.summarize();
        Ok(response)
    }

    /// Benchmark every supported hash type
    ///
    /// Failures for individual hash types are logged and listed in
    /// `failed_hash_types`; they do not fail the call.
    ///
    /// # Errors
    ///
    /// Returns an error only if the hash-type list cannot be obtained.
    #[instrument(skip_all, fields(operation = "benchmark_all"))]
    pub async fn benchmark_all(&self) -> Result<BenchmarkResponse, HashcatError> {
        let hashes = self.supported_hashes().await?;
        let mut response = BenchmarkResponse::default();

        for hash_type in &hashes.hash_types {
            match self.benchmark(hash_type.id).await {
                Ok(result) => response.benchmarks.extend(result.benchmarks),
                Err(e) => {
                    warn!(hash_type = hash_type.id, error = %e, "Benchmark failed, skipping");
                    response.failed_hash_types.push(hash_type.id);
                }
            }
        }

        response.summarize();
        info!(
            benchmarked = response.benchmarks.len(),
            failed = response.failed_hash_types.len(),
            "Benchmark run complete"
        );
        Ok(response)
    }

    /// Detect the installed version and its capabilities
    ///
    /// # Errors
    ///
    /// Returns a parse error when no version can be read, or a config error
    /// when the binary is older than the minimum supported release.
    pub async fn version(&self) -> Result<EngineCapabilities, HashcatError> {
        let output = self.run("version", &to_args(&["--version"])).await?;
        let caps = EngineCapabilities::from_version_output(&output.stdout_text());

        if caps.version.is_none() {
            return Err(HashcatError::parse(format!(
                "unrecognised version output: {}",
                caps.version_string
            )));
        }
        if !caps.meets_minimum_version {
            return Err(HashcatError::config(format!(
                "hashcat {} is older than the minimum supported {}.{}.{}",
                caps.display_version(),
                MIN_VERSION.0,
                MIN_VERSION.1,
                MIN_VERSION.2
            )));
        }
        Ok(caps)
    }

    /// Prepare a session cracking a single hash
    ///
    /// # Errors
    ///
    /// Returns a config or construction error.
    pub fn new_session(
        &self,
        cancel: &CancellationToken,
        hash: &str,
        options: &CrackOptions,
    ) -> Result<HashcatSession, HashcatError> {
        HashcatSession::new(
            &self.config,
            self.binary.clone(),
            SessionTarget::Hash(hash.to_owned()),
            options,
            cancel,
        )
    }

    /// Prepare a session cracking every hash in a file
    ///
    /// # Errors
    ///
    /// Returns a config or construction error.
    pub fn new_file_session(
        &self,
        cancel: &CancellationToken,
        path: &Path,
        options: &CrackOptions,
    ) -> Result<HashcatSession, HashcatError> {
        HashcatSession::new(
            &self.config,
            self.binary.clone(),
            SessionTarget::File(path.to_path_buf()),
            options,
            cancel,
        )
    }

    /// Create and start a single-hash session, returning it with its progress stream
    ///
    /// # Errors
    ///
    /// Returns construction, launch, or internal errors.
    pub async fn crack(
        &self,
        cancel: &CancellationToken,
        hash: &str,
        options: &CrackOptions,
    ) -> Result<(HashcatSession, ProgressStream), HashcatError> {
        let session = self.new_session(cancel, hash, options)?;
        start_with_progress(session).await
    }

    /// Create and start a hash-file session, returning it with its progress stream
    ///
    /// The file's hash type overrides the one in `options`.
    ///
    /// # Errors
    ///
    /// Returns construction, launch, or internal errors.
    pub async fn crack_file(
        &self,
        cancel: &CancellationToken,
        hash_file: &HashFile,
        options: &CrackOptions,
    ) -> Result<(HashcatSession, ProgressStream), HashcatError> {
        let options = CrackOptions {
            hash_type: hash_file.hash_type,
            ..options.clone()
        };
        let session = self.new_file_session(cancel, &hash_file.path, &options)?;
        start_with_progress(session).await
    }
}

async fn start_with_progress(
    session: HashcatSession,
) -> Result<(HashcatSession, ProgressStream), HashcatError> {
    let progress = session
        .progress()
        .await
        .ok_or_else(|| HashcatError::internal("progress stream already taken"))?;
    session.start().await?;
    Ok((session, progress))
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| (*a).to_owned()).collect()
}
