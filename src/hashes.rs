// ABOUTME: Parser for the machine-readable JSON printed by hashcat --hash-info
// ABOUTME: Converts the id-keyed object into hash types sorted by id
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{HashType, SupportedHashes};
use crate::types::HashcatError;

/// Fields read from one hash-info entry; everything else is ignored
#[derive(Debug, Deserialize)]
struct HashInfoEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
}

/// Parse `--machine-readable --hash-info` output
///
/// # Errors
///
/// Returns a parse error if the document is not a JSON object of objects or
/// a key is not a numeric hash mode.
pub fn parse_hash_info_output(output: &str) -> Result<SupportedHashes, HashcatError> {
    let raw: HashMap<String, HashInfoEntry> = serde_json::from_str(output.trim())
        .map_err(|e| HashcatError::parse(format!("failed to parse hash info JSON: {e}")))?;

    let mut hash_types = raw
        .into_iter()
        .map(|(key, entry)| {
            let id = key.trim().parse::<u32>().map_err(|e| {
                HashcatError::parse(format!("invalid hash ID format '{key}': {e}"))
            })?;
            Ok(HashType {
                id,
                name: entry.name,
                category: entry.category,
                description: String::new(),
            })
        })
        .collect::<Result<Vec<_>, HashcatError>>()?;

    hash_types.sort_by_key(|h| h.id);
    Ok(SupportedHashes { hash_types })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    const HASH_INFO: &str = r#"{
        "1000": { "name": "NTLM", "category": "Operating System", "slow_hash": false },
        "0": { "name": "MD5", "category": "Raw Hash", "password_len_min": 0 },
        "100": { "name": "SHA1", "category": "Raw Hash" },
        "3200": { "name": "bcrypt $2*$, Blowfish (Unix)", "category": "Operating System" }
    }"#;

    #[test]
    fn test_parses_and_sorts_by_id() {
        let hashes = parse_hash_info_output(HASH_INFO).unwrap();
        let ids: Vec<u32> = hashes.hash_types.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 100, 1000, 3200]);
        assert_eq!(hashes.hash_types[0].name, "MD5");
        assert!(hashes.hash_types.iter().all(|h| h.description.is_empty()));
    }

    #[test]
    fn test_lookups_over_parsed_output() {
        let hashes = parse_hash_info_output(HASH_INFO).unwrap();
        assert_eq!(hashes.id_by_name("NTLM"), Some(1000));
        assert_eq!(hashes.id_by_name("ntlm"), None);
        assert_eq!(hashes.by_category("raw hash").len(), 2);
        assert_eq!(hashes.by_id(3200).map(|h| h.category.as_str()), Some("Operating System"));
    }

    #[test]
    fn test_non_numeric_key_is_parse_error() {
        let err = parse_hash_info_output(r#"{"md5": {"name": "MD5"}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.contains("'md5'"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_hash_info_output("Hash mode #0").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
