// ABOUTME: Version compatibility and capability detection for the hashcat binary
// ABOUTME: Parses --version output and maps it to the flags this crate relies on
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Oldest release that emits `--status-json`
pub const MIN_VERSION: (u32, u32, u32) = parse_const_version("6.0.0");

/// First release with machine-readable `--hash-info`
const HASH_INFO_VERSION: (u32, u32, u32) = parse_const_version("6.2.0");

/// Detected capabilities of an installed hashcat binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCapabilities {
    /// Raw `--version` output, trimmed
    pub version_string: String,
    /// Parsed (major, minor, patch)
    pub version: Option<(u32, u32, u32)>,
    /// Whether `--status-json` is available
    pub status_json: bool,
    /// Whether `--backend-info` replaces the older `--opencl-info`
    pub backend_info: bool,
    /// Whether `--machine-readable --hash-info` prints JSON
    pub hash_info_json: bool,
    /// Whether the binary meets [`MIN_VERSION`]
    pub meets_minimum_version: bool,
}

impl EngineCapabilities {
    /// Derive capabilities from raw `--version` output
    #[must_use]
    pub fn from_version_output(raw: &str) -> Self {
        let version_string = raw.trim().to_owned();
        let version = parse_semver(&version_string);
        let at_least = |min| version.is_some_and(|v| compare_versions(v, min));
        let meets_minimum_version = at_least(MIN_VERSION);

        if !meets_minimum_version {
            warn!(
                detected = %version_string,
                minimum = format!("{}.{}.{}", MIN_VERSION.0, MIN_VERSION.1, MIN_VERSION.2),
                "hashcat version is below minimum supported version",
            );
        }

        Self {
            version_string,
            version,
            status_json: meets_minimum_version,
            backend_info: meets_minimum_version,
            hash_info_json: at_least(HASH_INFO_VERSION),
            meets_minimum_version,
        }
    }

    /// Whether sessions can be supervised with this binary
    #[must_use]
    pub const fn is_compatible(&self) -> bool {
        self.meets_minimum_version && self.status_json
    }

    /// Parsed version as `major.minor.patch`, or the raw string when unparsed
    #[must_use]
    pub fn display_version(&self) -> String {
        self.version.map_or_else(
            || self.version_string.clone(),
            |(major, minor, patch)| format!("{major}.{minor}.{patch}"),
        )
    }
}

/// Parse a semantic version string into (major, minor, patch)
///
/// Handles formats like "6.2.6", "v6.2.6" and git builds such as
/// "v6.2.6-813-gf7b5a0a3a".
#[must_use]
pub fn parse_semver(version_str: &str) -> Option<(u32, u32, u32)> {
    let cleaned = version_str.split_whitespace().find(|word| {
        let stripped = word.strip_prefix('v').unwrap_or(word);
        let dot_count = stripped.split('.').count();
        dot_count >= 3
            && stripped.split('.').take(3).all(|part| {
                let numeric = part.split(['-', '+']).next().unwrap_or(part);
                numeric.parse::<u32>().is_ok()
            })
    })?;

    let stripped = cleaned.strip_prefix('v').unwrap_or(cleaned);
    let mut parts = stripped.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.split(['-', '+']).next()?.parse().ok()?;
    Some((major, minor, patch))
}

/// Parse a version string at compile time (only handles simple "X.Y.Z" format)
const fn parse_const_version(s: &str) -> (u32, u32, u32) {
    let bytes = s.as_bytes();
    let mut parts = [0u32; 3];
    let mut index = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'.' {
            index += 1;
        } else if index < 3 {
            parts[index] = parts[index] * 10 + (b - b'0') as u32;
        }
        i += 1;
    }
    (parts[0], parts[1], parts[2])
}

/// Returns true if `actual >= minimum`
#[must_use]
pub const fn compare_versions(actual: (u32, u32, u32), minimum: (u32, u32, u32)) -> bool {
    if actual.0 != minimum.0 {
        return actual.0 > minimum.0;
    }
    if actual.1 != minimum.1 {
        return actual.1 > minimum.1;
    }
    actual.2 >= minimum.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semver_release() {
        assert_eq!(parse_semver("v6.2.6"), Some((6, 2, 6)));
        assert_eq!(parse_semver("6.1.1"), Some((6, 1, 1)));
    }

    #[test]
    fn test_parse_semver_git_build() {
        assert_eq!(parse_semver("v6.2.6-813-gf7b5a0a3a"), Some((6, 2, 6)));
        assert_eq!(parse_semver("v7.0.0+12"), Some((7, 0, 0)));
    }

    #[test]
    fn test_parse_semver_invalid() {
        assert_eq!(parse_semver("hashcat"), None);
        assert_eq!(parse_semver("v6.2"), None);
        assert_eq!(parse_semver(""), None);
    }

    #[test]
    fn test_compare_versions() {
        assert!(compare_versions((6, 0, 0), (6, 0, 0)));
        assert!(compare_versions((6, 2, 6), (6, 0, 0)));
        assert!(!compare_versions((5, 1, 0), (6, 0, 0)));
        assert!(!compare_versions((6, 2, 5), (6, 2, 6)));
    }

    #[test]
    fn test_const_parse_version() {
        assert_eq!(MIN_VERSION, (6, 0, 0));
        assert_eq!(parse_const_version("6.2.12"), (6, 2, 12));
    }

    #[test]
    fn test_modern_release_is_compatible() {
        let caps = EngineCapabilities::from_version_output("v6.2.6\n");
        assert!(caps.is_compatible());
        assert!(caps.hash_info_json);
        assert_eq!(caps.display_version(), "6.2.6");
    }

    #[test]
    fn test_old_release_is_incompatible() {
        let caps = EngineCapabilities::from_version_output("v5.1.0");
        assert!(!caps.is_compatible());
        assert!(!caps.backend_info);
        assert!(!caps.hash_info_json);
    }

    #[test]
    fn test_unparseable_version_is_incompatible() {
        let caps = EngineCapabilities::from_version_output("unknown build");
        assert!(caps.version.is_none());
        assert!(!caps.is_compatible());
        assert_eq!(caps.display_version(), "unknown build");
    }
}
