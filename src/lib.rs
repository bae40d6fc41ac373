// ABOUTME: Supervisory library driving the hashcat password-recovery engine as a subprocess
// ABOUTME: Re-exports the client, session controller, output parsers, and data model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # hashcat-runner
//!
//! Runs hashcat as a child process and turns its output into typed data.
//! A [`HashcatClient`] answers one-shot questions (devices, hash types,
//! benchmarks, version) and creates [`HashcatSession`]s. Each session owns
//! one engine process and streams:
//!
//! - progress snapshots decoded from `--status-json`, through a bounded
//!   queue that keeps the most recent records
//! - cracked results polled from the session's outfile
//!
//! Anything the engine writes to stderr becomes the session's error,
//! reported by [`CrackSession::wait`]. Working files are removed on every
//! path out of a session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use hashcat_runner::{CrackOptions, CrackSession, HashcatClient, HashcatConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), hashcat_runner::HashcatError> {
//! let client = HashcatClient::new(HashcatConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//! let options = CrackOptions::new(0, 3, "?l?l?l?l?l?l?l?l");
//!
//! let (session, mut progress) = client
//!     .crack(&cancel, "5f4dcc3b5aa765d61d8327deb882cf99", &options)
//!     .await?;
//! while let Some(update) = progress.next().await {
//!     println!("{:.1}%", update.calculate_stats().percent_complete);
//! }
//! session.wait().await?;
//! let (cracked, _) = session.results().await;
//! for hash in cracked {
//!     println!("{}:{}", hash.hash, hash.plaintext);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: error type, stream aliases and the `CrackSession` trait
//! - [`config`]: client configuration, environment and file loading
//! - [`client`]: one-shot commands and session factories
//! - [`session`]: process ownership, lifecycle and cleanup
//! - [`reader`], [`poller`], [`diagnostics`]: the three per-session consumers
//! - [`devices`], [`hashes`], [`benchmark`]: parsers for info commands

/// Core types: errors, stream aliases, and the session trait
pub mod types;

/// Benchmark output parser
pub mod benchmark;
/// Client entry point
pub mod client;
/// Version compatibility and capability detection
pub mod compat;
/// Client configuration
pub mod config;
/// `--backend-info` output parser
pub mod devices;
/// Single-slot error holder and diagnostic-stream drain
pub mod diagnostics;
/// Binary auto-detection and discovery
pub mod discovery;
/// `--hash-info` output parser
pub mod hashes;
/// Data model for engine output
pub mod models;
/// Crack options and engine argument construction
pub mod options;
/// Results-file poller
pub mod poller;
/// Subprocess spawning with safety limits
pub mod process;
/// Progress stream reader
pub mod reader;
/// Environment sandboxing
pub mod sandbox;
/// Session controller
pub mod session;
/// Latest-wins progress queue
pub mod stream;

pub use client::HashcatClient;
pub use compat::EngineCapabilities;
pub use config::HashcatConfig;
pub use discovery::{discover_hashcat, resolve_binary};
pub use models::{
    Benchmark, BenchmarkResponse, BenchmarkResult, BenchmarkSummary, CrackedHash, CrackingStatus,
    Device, DeviceList, DeviceStatus, HashFile, HashType, Platform, Progress, ProgressStats,
    SupportedHashes,
};
pub use options::CrackOptions;
pub use session::{HashcatSession, SessionState, SessionTarget};
pub use types::{CrackSession, CrackedStream, ErrorKind, HashcatError, ProgressStream};
