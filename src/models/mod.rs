// ABOUTME: Data model for engine output: progress snapshots, cracked results, devices, hash types and benchmarks
// ABOUTME: Serde-backed structs shared by the session layer, parsers, and the CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

/// Benchmark responses and summaries
pub mod benchmark;
/// Cracked-result records
pub mod cracked;
/// Backend platforms and devices
pub mod device;
/// Hash types and hash files
pub mod hash;
/// Progress snapshots and derived statistics
pub mod progress;

pub use benchmark::{Benchmark, BenchmarkResponse, BenchmarkResult, BenchmarkSummary};
pub use cracked::CrackedHash;
pub use device::{Device, DeviceList, Platform};
pub use hash::{HashFile, HashType, SupportedHashes};
pub use progress::{CrackingStatus, DeviceStatus, Guess, Progress, ProgressStats};
