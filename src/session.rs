// ABOUTME: Supervised hashcat run owning the engine process, its consumer tasks, and working files
// ABOUTME: Implements CrackSession with an idle -> running -> terminated lifecycle and one-shot cleanup
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Session Controller
//!
//! A [`HashcatSession`] is created with its working files already in place
//! and is started at most once. Starting spawns the engine and a driver task
//! that owns the process. The driver runs three consumers concurrently:
//!
//! - the progress reader on stdout, feeding a latest-wins queue
//! - the diagnostic drain on stderr, feeding the session's error slot
//! - the results poller on the outfile, feeding the results accumulator
//!
//! All three share a cancellation token derived from the caller's token.
//! When the process exits (or is killed) the token fires, the poller drains
//! the outfile one last time, and working files are removed exactly once.

use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HashcatConfig;
use crate::diagnostics::{drain_diagnostics, ErrorSlot};
use crate::models::{CrackedHash, Progress};
use crate::options::{build_crack_args, CrackOptions, SessionPaths};
use crate::poller::{ResultPoller, ResultSink};
use crate::process::{spawn_engine, EngineHandle, EngineProcess};
use crate::reader::read_progress;
use crate::sandbox::SandboxPolicy;
use crate::stream::{latest_channel, LatestReceiver, LatestSender};
use crate::types::{CrackSession, CrackedStream, ErrorKind, HashcatError, ProgressStream};

/// What a session cracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    /// A single hash, written to a session-owned temporary file
    Hash(String),
    /// An existing hash list; the caller keeps ownership of the file
    File(PathBuf),
}

/// Observable lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, not yet started
    Idle,
    /// Engine spawned and consumers running
    Running,
    /// Finished, stopped, or never able to start; files removed
    Terminated,
}

enum Lifecycle {
    Idle {
        progress_tx: LatestSender<Progress>,
        cracked_tx: mpsc::UnboundedSender<CrackedHash>,
    },
    Running {
        done: watch::Receiver<bool>,
    },
    Terminated,
}

/// Files created for one session and removed when it terminates
#[derive(Debug)]
struct WorkFiles {
    hash_file: Option<TempPath>,
    outfile: PathBuf,
    potfile: PathBuf,
}

impl WorkFiles {
    fn remove(self) {
        if let Some(hash_file) = self.hash_file {
            let path = hash_file.to_path_buf();
            if let Err(e) = hash_file.close() {
                if e.kind() != IoErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove hash file");
                }
            }
        }
        remove_quietly(&self.outfile);
        remove_quietly(&self.potfile);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed working file"),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove working file"),
    }
}

type SharedFiles = Arc<StdMutex<Option<WorkFiles>>>;

/// Remove working files if they are still present; later calls are no-ops
fn cleanup(files: &SharedFiles) {
    let taken = files.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(files) = taken {
        files.remove();
    }
}

/// Unique engine session name from the clock and a random suffix
fn generate_session_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("hashcat-{nanos}-{}", &id[..8])
}

/// One supervised hashcat run
pub struct HashcatSession {
    name: String,
    binary: PathBuf,
    args: Vec<String>,
    policy: SandboxPolicy,
    poll_interval: std::time::Duration,
    outfile: PathBuf,
    potfile: PathBuf,
    hash_path: Option<PathBuf>,
    files: SharedFiles,
    cancel: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
    progress_rx: StdMutex<Option<LatestReceiver<Progress>>>,
    cracked_rx: StdMutex<Option<mpsc::UnboundedReceiver<CrackedHash>>>,
    results: Arc<Mutex<Vec<CrackedHash>>>,
    errors: ErrorSlot,
}

impl HashcatSession {
    /// Prepare a session: validate options, create working files, build arguments
    ///
    /// The session's cancellation token is a child of `parent`, so cancelling
    /// the caller's token stops the run.
    ///
    /// # Errors
    ///
    /// Returns a config error for invalid options, or a construction error
    /// for an empty hash, a missing hash file, or an unusable work directory.
    pub fn new(
        config: &HashcatConfig,
        binary: PathBuf,
        target: SessionTarget,
        options: &CrackOptions,
        parent: &CancellationToken,
    ) -> Result<Self, HashcatError> {
        options.validate()?;

        let policy = SandboxPolicy::for_config(config)?;
        let work_dir = policy.working_directory().to_path_buf();

        let name = generate_session_name();

        let (hash_file, target_arg) = match target {
            SessionTarget::Hash(hash) => {
                let hash = hash.trim();
                if hash.is_empty() {
                    return Err(HashcatError::construction("hash must not be empty"));
                }
                let temp = write_hash_file(&work_dir, &name, hash)?;
                let arg = temp.display().to_string();
                (Some(temp), arg)
            }
            SessionTarget::File(path) => {
                if !path.is_file() {
                    return Err(HashcatError::construction(format!(
                        "hash file not found: {}",
                        path.display()
                    )));
                }
                (None, path.display().to_string())
            }
        };

        let outfile = work_dir.join(format!("{name}.out"));
        let potfile = work_dir.join(format!("{name}.pot"));

        let args = build_crack_args(
            options,
            SessionPaths {
                session: &name,
                target: &target_arg,
                outfile: &outfile,
                potfile: &potfile,
            },
            &config.extra_args,
        );

        let (progress_tx, progress_rx) = latest_channel(config.progress_capacity);
        let (cracked_tx, cracked_rx) = mpsc::unbounded_channel();
        let hash_path = hash_file.as_ref().map(|t| t.to_path_buf());

        debug!(session = %name, args = ?args, "Prepared hashcat session");

        Ok(Self {
            name,
            binary,
            args,
            policy,
            poll_interval: config.poll_interval,
            outfile: outfile.clone(),
            potfile: potfile.clone(),
            hash_path,
            files: Arc::new(StdMutex::new(Some(WorkFiles {
                hash_file,
                outfile,
                potfile,
            }))),
            cancel: parent.child_token(),
            lifecycle: Mutex::new(Lifecycle::Idle {
                progress_tx,
                cracked_tx,
            }),
            progress_rx: StdMutex::new(Some(progress_rx)),
            cracked_rx: StdMutex::new(Some(cracked_rx)),
            results: Arc::new(Mutex::new(Vec::new())),
            errors: ErrorSlot::new(),
        })
    }

    /// Arguments the engine is (or will be) launched with
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Results file the engine appends to
    #[must_use]
    pub fn outfile(&self) -> &Path {
        &self.outfile
    }

    /// Every working file this session owns and removes on termination
    #[must_use]
    pub fn working_files(&self) -> Vec<PathBuf> {
        self.hash_path
            .iter()
            .cloned()
            .chain([self.outfile.clone(), self.potfile.clone()])
            .collect()
    }

    /// Current lifecycle phase
    pub async fn state(&self) -> SessionState {
        match &*self.lifecycle.lock().await {
            Lifecycle::Idle { .. } => SessionState::Idle,
            Lifecycle::Running { done } if !*done.borrow() => SessionState::Running,
            Lifecycle::Running { .. } | Lifecycle::Terminated => SessionState::Terminated,
        }
    }

    /// Take the live stream of cracked results; returns `None` once taken
    ///
    /// Every result is also kept for [`CrackSession::results`].
    pub fn cracked(&self) -> Option<CrackedStream> {
        self.cracked_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|rx| Box::pin(UnboundedReceiverStream::new(rx)) as CrackedStream)
    }

    /// Wait for a running driver to finish, then mark the session terminated
    async fn settle(&self, mut done: watch::Receiver<bool>) {
        let finished = done.wait_for(|finished| *finished).await.is_ok();
        if !finished {
            // Driver dropped its sender without finishing; files may remain
            self.errors
                .offer(HashcatError::internal("session driver ended unexpectedly"));
            cleanup(&self.files);
        }
        *self.lifecycle.lock().await = Lifecycle::Terminated;
    }

    /// Running driver's completion signal, or `None` after terminating an idle session
    async fn finish_or_watch(&self) -> Option<watch::Receiver<bool>> {
        let mut state = self.lifecycle.lock().await;
        match &*state {
            Lifecycle::Running { done } => Some(done.clone()),
            Lifecycle::Idle { .. } => {
                *state = Lifecycle::Terminated;
                drop(state);
                cleanup(&self.files);
                debug!(session = %self.name, "Session terminated before start");
                None
            }
            Lifecycle::Terminated => None,
        }
    }
}

fn write_hash_file(work_dir: &Path, session: &str, hash: &str) -> Result<TempPath, HashcatError> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{session}-"))
        .suffix("-hash.txt")
        .tempfile_in(work_dir)
        .map_err(|e| HashcatError::construction(format!("cannot create hash file: {e}")))?;
    writeln!(file, "{hash}")
        .and_then(|()| file.flush())
        .map_err(|e| HashcatError::construction(format!("cannot write hash file: {e}")))?;
    Ok(file.into_temp_path())
}

#[async_trait]
impl CrackSession for HashcatSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), HashcatError> {
        let mut state = self.lifecycle.lock().await;

        let (progress_tx, cracked_tx) =
            match std::mem::replace(&mut *state, Lifecycle::Terminated) {
                Lifecycle::Idle {
                    progress_tx,
                    cracked_tx,
                } => (progress_tx, cracked_tx),
                other => {
                    let message = if matches!(other, Lifecycle::Running { .. }) {
                        "session is already running"
                    } else {
                        "session has already finished"
                    };
                    *state = other;
                    return Err(HashcatError::already_running(message));
                }
            };

        let engine = match spawn_engine(&self.binary, &self.args, Some(&self.policy)) {
            Ok(engine) => engine,
            Err(e) => {
                // Lifecycle stays terminated; dropping the senders ends both streams
                drop(state);
                cleanup(&self.files);
                self.errors.offer(e.clone());
                return Err(e);
            }
        };

        let (done_tx, done_rx) = watch::channel(false);
        let driver = Driver {
            session: self.name.clone(),
            cancel: self.cancel.clone(),
            errors: self.errors.clone(),
            files: Arc::clone(&self.files),
            poller: ResultPoller::new(self.outfile.clone(), self.poll_interval),
            sink: ResultSink::new(Arc::clone(&self.results), cracked_tx),
            progress_tx,
        };
        tokio::spawn(async move {
            driver.run(engine).await;
            let _ = done_tx.send(true);
        });

        *state = Lifecycle::Running { done: done_rx };
        info!(session = %self.name, "hashcat session started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), HashcatError> {
        let Some(done) = self.finish_or_watch().await else {
            return Ok(());
        };
        debug!(session = %self.name, "Stopping hashcat session");
        self.cancel.cancel();
        self.settle(done).await;
        Ok(())
    }

    async fn progress(&self) -> Option<ProgressStream> {
        self.progress_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|rx| Box::pin(rx.into_stream()) as ProgressStream)
    }

    async fn wait(&self) -> Result<(), HashcatError> {
        if let Some(done) = self.finish_or_watch().await {
            self.settle(done).await;
        }
        self.errors.peek().map_or(Ok(()), Err)
    }

    async fn results(&self) -> (Vec<CrackedHash>, Option<HashcatError>) {
        let results = self.results.lock().await.clone();
        (results, self.errors.peek())
    }
}

impl Drop for HashcatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        // A running driver owns cleanup; otherwise do it here
        if !matches!(self.lifecycle.get_mut(), Lifecycle::Running { .. }) {
            cleanup(&self.files);
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Everything the background task needs, moved out of the session at start
struct Driver {
    session: String,
    cancel: CancellationToken,
    errors: ErrorSlot,
    files: SharedFiles,
    poller: ResultPoller,
    sink: ResultSink,
    progress_tx: LatestSender<Progress>,
}

impl Driver {
    async fn run(self, engine: EngineProcess) {
        let Self {
            session,
            cancel,
            errors,
            files,
            poller,
            sink,
            progress_tx,
        } = self;
        let EngineProcess {
            mut handle,
            stdout,
            stderr,
        } = engine;

        let diagnostics = tokio::spawn(drain_diagnostics(stderr, errors.clone()));
        let polling = tokio::spawn(poller.run(cancel.clone(), sink, errors.clone()));

        let reader = async {
            let mut stdout = BufReader::new(stdout);
            let outcome = read_progress(&mut stdout, &progress_tx, &errors).await;
            drop(progress_tx);
            // Keep the pipe open and drained until EOF so the engine never
            // blocks on a full buffer or dies of a broken pipe
            if let Err(e) = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await {
                debug!(error = %e, "Stopped draining hashcat stdout");
            }
            outcome
        };

        let (outcome, ()) = tokio::join!(reader, supervise_exit(&mut handle, &cancel, &session));
        debug!(session = %session, ?outcome, "Progress reader finished");

        // Process is gone: release the poller for its final drain
        cancel.cancel();

        if let Err(e) = diagnostics.await {
            warn!(session = %session, error = %e, "Diagnostic drain task failed");
        }
        if let Err(e) = polling.await {
            warn!(session = %session, error = %e, "Result poller task failed");
        }

        cleanup(&files);
        info!(session = %session, "hashcat session finished");
    }
}

/// Wait for the engine to exit, killing it first if `cancel` fires
async fn supervise_exit(handle: &mut EngineHandle, cancel: &CancellationToken, session: &str) {
    let exited = tokio::select! {
        result = handle.wait() => Some(result),
        () = cancel.cancelled() => None,
    };

    let result = match exited {
        Some(result) => result,
        None => {
            let pid = handle.id();
            match handle.kill().await {
                Ok(()) => info!(session, pid, "Killed hashcat on cancellation"),
                Err(e) if e.kind == ErrorKind::ProcessNotRunning => {
                    debug!(session, "hashcat exited before kill");
                }
                Err(e) => warn!(session, error = %e, "Failed to kill hashcat"),
            }
            handle.wait().await
        }
    };

    match result {
        Ok(status) => info!(session, code = ?status.code(), "hashcat exited"),
        Err(e) => warn!(session, error = %e, "Failed to reap hashcat"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> HashcatConfig {
        HashcatConfig::default().with_work_dir(dir.to_path_buf())
    }

    #[test]
    fn test_session_names_are_unique() {
        let a = generate_session_name();
        let b = generate_session_name();
        assert!(a.starts_with("hashcat-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_single_hash_is_written_to_owned_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::Hash("5f4dcc3b5aa765d61d8327deb882cf99".to_owned()),
            &CrackOptions::new(0, 3, "?l?l?l?l?l?l?l?l"),
            &CancellationToken::new(),
        )
        .unwrap();

        let files = session.working_files();
        assert_eq!(files.len(), 3);
        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert_eq!(contents, "5f4dcc3b5aa765d61d8327deb882cf99\n");
        assert_eq!(session.args()[session.args().len() - 2], files[0].display().to_string());
        assert_eq!(session.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_empty_hash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::Hash("   ".to_owned()),
            &CrackOptions::default(),
            &CancellationToken::new(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind, ErrorKind::Construction);
    }

    #[tokio::test]
    async fn test_missing_hash_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::File(dir.path().join("missing.txt")),
            &CrackOptions::default(),
            &CancellationToken::new(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind, ErrorKind::Construction);
        assert!(err.message.contains("missing.txt"));
    }

    #[tokio::test]
    async fn test_invalid_options_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::Hash("abc".to_owned()),
            &CrackOptions::new(0, 3, "?a").with_workload(9),
            &CancellationToken::new(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_caller_hash_file_survives_stop() {
        let dir = tempfile::tempdir().unwrap();
        let hashes = dir.path().join("hashes.txt");
        std::fs::write(&hashes, "abc\n").unwrap();
        let session = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::File(hashes.clone()),
            &CrackOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(session.working_files().len(), 2);
        session.stop().await.unwrap();
        assert!(hashes.exists());
        assert_eq!(session.state().await, SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_drop_removes_idle_session_files() {
        let dir = tempfile::tempdir().unwrap();
        let session = HashcatSession::new(
            &config(dir.path()),
            PathBuf::from("hashcat"),
            SessionTarget::Hash("abc".to_owned()),
            &CrackOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        let files = session.working_files();
        drop(session);
        assert!(files.iter().all(|f| !f.exists()));
    }
}
