// ABOUTME: Binary auto-detection for the hashcat engine
// ABOUTME: Resolves an explicit path, an environment override, or known binary names on PATH
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::BINARY_ENV_KEY;
use crate::types::HashcatError;

/// Binary names probed on `PATH`, in priority order
const CANDIDATE_NAMES: &[&str] = &["hashcat", "hashcat.bin", "hashcat64.bin"];

/// Discover the hashcat binary on this host
///
/// Checks the `HASHCAT_BINARY` override first, then probes each known
/// binary name on `PATH`.
///
/// # Errors
///
/// Returns a binary-not-found error if no candidate resolves.
pub fn discover_hashcat() -> Result<PathBuf, HashcatError> {
    if let Ok(override_path) = env::var(BINARY_ENV_KEY) {
        return resolve_binary(CANDIDATE_NAMES[0], Some(&override_path));
    }

    for name in CANDIDATE_NAMES {
        match which::which(name) {
            Ok(path) => {
                debug!(binary = name, path = %path.display(), "Discovered hashcat binary");
                return Ok(path);
            }
            Err(_) => debug!(binary = name, "Not on PATH, trying next"),
        }
    }

    Err(HashcatError::binary_not_found(CANDIDATE_NAMES.join(", ")))
}

/// Resolve a configured binary path
///
/// Resolution order:
/// 1. If `env_override` is `Some`, that path must exist
/// 2. A path with more than one component must exist as given
/// 3. A bare name is searched on `PATH` using `which`
///
/// # Errors
///
/// Returns a binary-not-found error if the binary cannot be located.
pub fn resolve_binary(name: &str, env_override: Option<&str>) -> Result<PathBuf, HashcatError> {
    if let Some(override_path) = env_override {
        let path = PathBuf::from(override_path);
        if path.exists() {
            debug!(binary = name, path = %path.display(), "Resolved via env override");
            return Ok(path);
        }
        return Err(HashcatError::binary_not_found(format!(
            "{override_path} (from {BINARY_ENV_KEY})"
        )));
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
        return Err(HashcatError::binary_not_found(name));
    }

    which::which(name)
        .map_err(|e| HashcatError::binary_not_found(format!("{name} on PATH: {e}")))
}
