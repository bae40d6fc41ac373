// ABOUTME: Cracked-result record read from hashcat's outfile
// ABOUTME: Pairs the original hash with the recovered plaintext and discovery time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successfully cracked hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrackedHash {
    /// Hash as written by the engine
    pub hash: String,
    /// Recovered plaintext with delimiter escapes removed
    pub plaintext: String,
    /// When the poller discovered the result
    pub cracked_at: DateTime<Utc>,
}

impl CrackedHash {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(hash: impl Into<String>, plaintext: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            plaintext: plaintext.into(),
            cracked_at: Utc::now(),
        }
    }
}
