// ABOUTME: Execution environment for hashcat subprocesses built from the client configuration
// ABOUTME: Snapshots whitelisted host variables and pins the engine to the session work directory
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::env;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::config::HashcatConfig;
use crate::types::HashcatError;

/// Environment and working directory every engine invocation runs with
///
/// Host variables are resolved once, when the policy is built, so a
/// session's engine sees the same environment however late it is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    working_directory: PathBuf,
    env: Vec<(String, String)>,
}

impl SandboxPolicy {
    /// Policy for `config`: its work directory, created if missing, and the
    /// allowed host variables as they are set right now
    ///
    /// hashcat resolves relative wordlist, rule and restore paths against
    /// its current directory, so the work directory must exist before the
    /// engine starts.
    ///
    /// # Errors
    ///
    /// Returns a construction error if the work directory cannot be created.
    pub fn for_config(config: &HashcatConfig) -> Result<Self, HashcatError> {
        let dir = config.resolved_work_dir();
        std::fs::create_dir_all(&dir).map_err(|e| {
            HashcatError::construction(format!(
                "cannot create work directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self::capture(dir, &config.allowed_env_keys))
    }

    /// Snapshot the allowed host variables for an engine running in `working_directory`
    #[must_use]
    pub fn capture(working_directory: PathBuf, allowed_env_keys: &[String]) -> Self {
        Self::from_lookup(working_directory, allowed_env_keys, |key| env::var(key).ok())
    }

    fn from_lookup<F>(working_directory: PathBuf, allowed_env_keys: &[String], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut resolved: Vec<(String, String)> = Vec::with_capacity(allowed_env_keys.len());
        let mut missing = Vec::new();
        for key in allowed_env_keys {
            if resolved.iter().any(|(k, _)| k == key) {
                continue;
            }
            match lookup(key) {
                Some(value) => resolved.push((key.clone(), value)),
                None => missing.push(key.as_str()),
            }
        }

        debug!(
            cwd = %working_directory.display(),
            resolved_count = resolved.len(),
            ?missing,
            "Captured engine environment"
        );

        Self {
            working_directory,
            env: resolved,
        }
    }

    /// Directory the engine runs in and session files are written to
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Clear the command's inherited environment, then apply this policy
    pub fn apply(&self, cmd: &mut Command) {
        cmd.env_clear()
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.working_directory);
    }
}
