// ABOUTME: Hash-type catalogue entries and hash-file descriptors
// ABOUTME: Lookup helpers over the engine's supported hash types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A hash type (hash mode) supported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashType {
    /// Hash mode id passed as `--hash-type`
    pub id: u32,
    /// Display name, e.g. `MD5`
    pub name: String,
    /// Category, e.g. `Raw Hash`
    pub category: String,
    /// Free-form description (the engine does not report one today)
    #[serde(default)]
    pub description: String,
}

/// A file of hashes to crack in one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFile {
    /// Path to the hash list
    pub path: PathBuf,
    /// Hash mode of every entry
    pub hash_type: u32,
    /// Number of entries, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Hash types the engine supports, sorted by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedHashes {
    /// Hash types in ascending id order
    pub hash_types: Vec<HashType>,
}

impl SupportedHashes {
    /// Find a hash type by id
    #[must_use]
    pub fn by_id(&self, id: u32) -> Option<&HashType> {
        self.hash_types.iter().find(|h| h.id == id)
    }

    /// Find a hash type by exact (case-sensitive) name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&HashType> {
        self.hash_types.iter().find(|h| h.name == name)
    }

    /// Id of the hash type with the given exact name
    #[must_use]
    pub fn id_by_name(&self, name: &str) -> Option<u32> {
        self.by_name(name).map(|h| h.id)
    }

    /// All hash types in a category, ignoring case
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&HashType> {
        self.hash_types
            .iter()
            .filter(|h| h.category.eq_ignore_ascii_case(category))
            .collect()
    }
}
