// ABOUTME: Core types for hashcat supervision: the error taxonomy and the CrackSession contract
// ABOUTME: Provides HashcatError/ErrorKind and the async trait implemented by engine sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Core Types
//!
//! The error type shared by every module and the [`CrackSession`] trait that
//! describes one supervised engine run.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::models::{CrackedHash, Progress};

// ============================================================================
// Error Type
// ============================================================================

/// Error type for hashcat supervision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashcatError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

/// Categories of errors produced while driving the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The engine binary could not be spawned
    Launch,
    /// `start` was called on a session that is not idle
    AlreadyRunning,
    /// Session inputs were rejected before start (bad hash, missing file)
    Construction,
    /// The engine wrote to its diagnostic stream
    Engine,
    /// Reading the engine's primary output stream failed
    Stream,
    /// Results-file I/O failed for a reason other than "not created yet"
    File,
    /// A kill was requested for a process that already exited
    ProcessNotRunning,
    /// Binary not found or not executable
    BinaryNotFound,
    /// Configuration or option validation error
    Config,
    /// Engine output could not be parsed
    Parse,
    /// A one-shot engine command failed or timed out
    Execution,
    /// Internal error (bug, unexpected state)
    Internal,
}

impl HashcatError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a launch error
    pub fn launch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Launch, message)
    }

    /// Create an already-running error
    pub fn already_running(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyRunning, message)
    }

    /// Create a construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction, message)
    }

    /// Create an engine error from captured diagnostic output
    pub fn engine(output: impl Into<String>) -> Self {
        Self::new(ErrorKind::Engine, format!("hashcat error: {}", output.into()))
    }

    /// Create a primary-stream read error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Stream, message)
    }

    /// Create a results-file error
    pub fn file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::File, message)
    }

    /// Create a process-not-running error
    pub fn process_not_running(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProcessNotRunning, message)
    }

    /// Create a binary-not-found error
    pub fn binary_not_found(binary: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::BinaryNotFound,
            format!("Binary not found: {}", binary.into()),
        )
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Create an execution error for a failed one-shot command
    pub fn execution(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Execution,
            format!("hashcat {} failed: {}", operation.into(), message.into()),
        )
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for HashcatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HashcatError {}

// ============================================================================
// Streams
// ============================================================================

/// Stream of progress snapshots emitted by a running session
pub type ProgressStream = Pin<Box<dyn Stream<Item = Progress> + Send>>;

/// Stream of cracked results discovered by the results-file poller
pub type CrackedStream = Pin<Box<dyn Stream<Item = CrackedHash> + Send>>;

// ============================================================================
// Session Trait
// ============================================================================

/// One supervised run of the engine against one input
///
/// A session moves `idle -> running -> terminated` exactly once. Working
/// files are removed on every path into `terminated`.
#[async_trait]
pub trait CrackSession: Send + Sync {
    /// Unique session name passed to the engine via `--session`
    fn name(&self) -> &str;

    /// Spawn the engine and its consumer tasks
    async fn start(&self) -> Result<(), HashcatError>;

    /// Cancel the run, kill the engine, and remove working files (idempotent)
    async fn stop(&self) -> Result<(), HashcatError>;

    /// Take the progress stream; returns `None` once it has been taken
    async fn progress(&self) -> Option<ProgressStream>;

    /// Block until every consumer task has finished and return the recorded error
    async fn wait(&self) -> Result<(), HashcatError>;

    /// Snapshot of accumulated results and the terminal error, if any
    async fn results(&self) -> (Vec<CrackedHash>, Option<HashcatError>);
}
