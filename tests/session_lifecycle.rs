// ABOUTME: Integration tests for the session lifecycle against a scripted stand-in engine
// ABOUTME: Covers start/stop/wait transitions, result polling, error aggregation, and file cleanup
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use hashcat_runner::{
    CrackOptions, CrackSession, CrackingStatus, ErrorKind, HashcatClient, HashcatConfig,
    HashcatSession, SessionState,
};
use tempfile::TempDir;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const MD5_PASSWORD: &str = "5f4dcc3b5aa765d61d8327deb882cf99";

/// Finds the `--outfile` argument the session passes to the engine
const FIND_OUTFILE: &str = r#"outfile=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--outfile" ]; then outfile="$arg"; fi
  prev="$arg"
done"#;

const RUNNING_LINE: &str = r#"{"session":"t","status":3,"progress":[50,200],"recovered_hashes":[0,1],"devices":[{"device_id":1,"device_name":"cpu","device_type":"CPU","speed":1000}]}"#;
const CRACKED_LINE: &str = r#"{"session":"t","status":6,"progress":[200,200],"recovered_hashes":[1,1],"devices":[]}"#;

/// Engine that reports progress, writes one result, and finishes
fn cracking_engine() -> String {
    format!(
        "{FIND_OUTFILE}\necho 'not a status line'\necho '{RUNNING_LINE}'\nprintf '%s\\n' '{MD5_PASSWORD}:password' >> \"$outfile\"\necho '{CRACKED_LINE}'\nexit 0"
    )
}

/// Engine that echoes raw candidate bytes between status lines before cracking
fn raw_bytes_engine() -> String {
    format!(
        "{FIND_OUTFILE}\necho '{RUNNING_LINE}'\nprintf 'Guess.Base.......: \\377\\376\\n'\nsleep 0.2\necho '{RUNNING_LINE}'\nprintf '%s\\n' 'abc:pw' >> \"$outfile\"\necho '{CRACKED_LINE}'\nexit 0"
    )
}

/// Engine that reports once and then runs until killed
fn long_running_engine() -> String {
    format!("echo '{RUNNING_LINE}'\nexec sleep 30")
}

/// Engine that rejects its input on stderr
fn failing_engine() -> String {
    "echo 'No hashes loaded.' >&2\nexit 255".to_owned()
}

struct Harness {
    dir: TempDir,
    binary: PathBuf,
    client: HashcatClient,
}

fn harness(body: &str) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let binary = dir.path().join("fake-hashcat");
    std::fs::write(&binary, format!("#!/bin/sh\n{body}\n")).expect("write engine");
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
        .expect("chmod engine");

    let work_dir = dir.path().join("work");
    let config = HashcatConfig::new(binary.clone())
        .with_work_dir(work_dir)
        .with_poll_interval(Duration::from_millis(20));
    let client = HashcatClient::new(config).expect("client");
    Harness {
        dir,
        binary,
        client,
    }
}

fn session(h: &Harness, cancel: &CancellationToken) -> HashcatSession {
    h.client
        .new_session(cancel, MD5_PASSWORD, &CrackOptions::new(0, 3, "?l?l?l?l?l?l?l?l"))
        .expect("session")
}

fn assert_removed(files: &[PathBuf]) {
    for file in files {
        assert!(!file.exists(), "working file left behind: {}", file.display());
    }
}

async fn within<F: std::future::Future>(fut: F) -> F::Output {
    timeout(Duration::from_secs(10), fut)
        .await
        .expect("operation timed out")
}

// ============================================================================
// Successful runs
// ============================================================================

#[tokio::test]
async fn completed_run_streams_progress_and_collects_results() {
    let h = harness(&cracking_engine());
    let session = session(&h, &CancellationToken::new());
    let files = session.working_files();
    assert!(files[0].exists(), "hash file created at construction");

    let progress = session.progress().await.expect("progress stream");
    let cracked = session.cracked().expect("cracked stream");
    session.start().await.expect("start");

    let updates: Vec<_> = within(progress.collect::<Vec<_>>()).await;
    let statuses: Vec<CrackingStatus> = updates.iter().map(|p| p.status).collect();
    assert_eq!(statuses, vec![CrackingStatus::Running, CrackingStatus::Cracked]);
    let first = updates[0].calculate_stats();
    assert!((first.percent_complete - 25.0).abs() < 1e-9);

    within(session.wait()).await.expect("wait");
    assert_eq!(session.state().await, SessionState::Terminated);

    let (results, error) = session.results().await;
    assert!(error.is_none());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].hash, MD5_PASSWORD);
    assert_eq!(results[0].plaintext, "password");

    let live: Vec<_> = within(cracked.collect::<Vec<_>>()).await;
    assert_eq!(live.len(), 1);

    assert_removed(&files);
}

#[tokio::test]
async fn non_utf8_output_line_does_not_end_the_run() {
    let h = harness(&raw_bytes_engine());
    let session = session(&h, &CancellationToken::new());
    let progress = session.progress().await.expect("progress stream");
    session.start().await.expect("start");

    let updates: Vec<_> = within(progress.collect::<Vec<_>>()).await;
    let statuses: Vec<CrackingStatus> = updates.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            CrackingStatus::Running,
            CrackingStatus::Running,
            CrackingStatus::Cracked
        ]
    );

    within(session.wait()).await.expect("wait");
    let (results, error) = session.results().await;
    assert!(error.is_none());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].hash, "abc");
    assert_eq!(results[0].plaintext, "pw");
}

#[tokio::test]
async fn progress_and_cracked_streams_are_taken_once() {
    let h = harness(&cracking_engine());
    let session = session(&h, &CancellationToken::new());
    assert!(session.progress().await.is_some());
    assert!(session.progress().await.is_none());
    assert!(session.cracked().is_some());
    assert!(session.cracked().is_none());
}

#[tokio::test]
async fn crack_helper_starts_session() {
    let h = harness(&cracking_engine());
    let (session, progress) = h
        .client
        .crack(
            &CancellationToken::new(),
            MD5_PASSWORD,
            &CrackOptions::new(0, 3, "?a"),
        )
        .await
        .expect("crack");
    let updates: Vec<_> = within(progress.collect::<Vec<_>>()).await;
    assert_eq!(updates.last().map(|p| p.status), Some(CrackingStatus::Cracked));
    within(session.wait()).await.expect("wait");
}

// ============================================================================
// Lifecycle transitions
// ============================================================================

#[tokio::test]
async fn second_start_fails_and_stop_is_idempotent() {
    let h = harness(&long_running_engine());
    let session = session(&h, &CancellationToken::new());
    let files = session.working_files();

    session.start().await.expect("start");
    assert_eq!(session.state().await, SessionState::Running);

    let err = session.start().await.expect_err("second start");
    assert_eq!(err.kind, ErrorKind::AlreadyRunning);

    within(session.stop()).await.expect("first stop");
    within(session.stop()).await.expect("second stop");
    assert_eq!(session.state().await, SessionState::Terminated);
    assert_removed(&files);

    let err = session.start().await.expect_err("start after stop");
    assert_eq!(err.kind, ErrorKind::AlreadyRunning);
}

#[tokio::test]
async fn stop_and_wait_on_never_started_session_only_clean_up() {
    let h = harness(&long_running_engine());
    let session = session(&h, &CancellationToken::new());
    let files = session.working_files();

    session.stop().await.expect("stop");
    session.wait().await.expect("wait");
    assert_removed(&files);

    let (results, error) = session.results().await;
    assert!(results.is_empty());
    assert!(error.is_none());
}

#[tokio::test]
async fn cancelling_caller_token_kills_engine() {
    let h = harness(&long_running_engine());
    let cancel = CancellationToken::new();
    let session = session(&h, &cancel);
    let files = session.working_files();

    let mut progress = session.progress().await.expect("progress stream");
    session.start().await.expect("start");
    let first = within(progress.next()).await.expect("first update");
    assert_eq!(first.status, CrackingStatus::Running);

    cancel.cancel();
    within(session.wait()).await.expect("wait after cancel");
    assert!(within(progress.next()).await.is_none());
    assert_removed(&files);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn diagnostic_output_is_reported_by_wait() {
    let h = harness(&failing_engine());
    let session = session(&h, &CancellationToken::new());
    let files = session.working_files();

    session.start().await.expect("start");
    let err = within(session.wait()).await.expect_err("engine error");
    assert_eq!(err.kind, ErrorKind::Engine);
    assert!(err.message.contains("No hashes loaded."));

    let (_, error) = session.results().await;
    assert_eq!(error.map(|e| e.kind), Some(ErrorKind::Engine));
    assert_removed(&files);
}

#[tokio::test]
async fn unspawnable_binary_is_launch_error_and_cleans_up() {
    let h = harness(&cracking_engine());
    let session = session(&h, &CancellationToken::new());
    let files = session.working_files();
    std::fs::remove_file(&h.binary).expect("remove engine");

    let err = session.start().await.expect_err("launch failure");
    assert_eq!(err.kind, ErrorKind::Launch);
    assert_removed(&files);
    assert_eq!(session.state().await, SessionState::Terminated);
    session.stop().await.expect("stop after failed start");
}

#[tokio::test]
async fn file_session_keeps_caller_hash_file() {
    let h = harness(&cracking_engine());
    let hashes = h.dir.path().join("hashes.txt");
    std::fs::write(&hashes, format!("{MD5_PASSWORD}\n")).expect("write hashes");

    let session = h
        .client
        .new_file_session(&CancellationToken::new(), &hashes, &CrackOptions::new(0, 3, "?a"))
        .expect("file session");
    assert!(session.args().iter().any(|a| Path::new(a) == hashes));

    session.start().await.expect("start");
    within(session.wait()).await.expect("wait");
    assert!(hashes.exists());
    assert_eq!(session.results().await.0.len(), 1);
}
