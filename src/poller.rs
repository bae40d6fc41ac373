// ABOUTME: Polls hashcat's outfile for newly appended cracked results
// ABOUTME: Tracks a byte offset, decodes complete hash:plaintext lines, and fans results out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::io::{ErrorKind as IoErrorKind, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::diagnostics::ErrorSlot;
use crate::models::CrackedHash;
use crate::types::HashcatError;

/// Field delimiter in outfile lines
const DELIMITER: char = ':';

/// Escape character protecting a delimiter inside the plaintext
const ESCAPE: char = '\\';

/// Split a line on unescaped delimiters, consuming the escape characters
#[must_use]
pub fn split_unescaped(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            DELIMITER => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse an outfile line into `(hash, plaintext)`
///
/// The hash is the first field; every later field is the plaintext, so an
/// unescaped delimiter inside the plaintext is kept rather than truncated.
#[must_use]
pub fn parse_result_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }
    let mut fields = split_unescaped(line).into_iter();
    let hash = fields.next()?;
    let rest: Vec<String> = fields.collect();
    if rest.is_empty() || hash.is_empty() {
        return None;
    }
    Some((hash, rest.join(&DELIMITER.to_string())))
}

/// Destination for results found by the poller
#[derive(Debug, Clone)]
pub struct ResultSink {
    results: Arc<Mutex<Vec<CrackedHash>>>,
    live: mpsc::UnboundedSender<CrackedHash>,
}

impl ResultSink {
    /// Create a sink appending to `results` and forwarding to `live`
    #[must_use]
    pub fn new(
        results: Arc<Mutex<Vec<CrackedHash>>>,
        live: mpsc::UnboundedSender<CrackedHash>,
    ) -> Self {
        Self { results, live }
    }

    async fn push(&self, hash: CrackedHash) {
        self.results.lock().await.push(hash.clone());
        // The live stream is optional; a dropped receiver is not an error
        let _ = self.live.send(hash);
    }
}

/// Incremental reader over the engine's outfile
#[derive(Debug)]
pub struct ResultPoller {
    path: PathBuf,
    offset: u64,
    last_size: u64,
    interval: Duration,
}

impl ResultPoller {
    /// Create a poller for `path` checking every `interval`
    #[must_use]
    pub fn new(path: PathBuf, interval: Duration) -> Self {
        Self {
            path,
            offset: 0,
            last_size: 0,
            interval,
        }
    }

    /// Bytes consumed so far
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Check the file once and return results appended since the last check
    ///
    /// A missing file yields no results. A trailing line without a newline
    /// is left for the next check. A file smaller than the consumed offset
    /// is read again from the start.
    ///
    /// # Errors
    ///
    /// Returns a file error for any I/O failure other than not-found.
    pub async fn poll_once(&mut self) -> Result<Vec<CrackedHash>, HashcatError> {
        let size = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HashcatError::file(format!(
                    "error checking output file: {e}"
                )))
            }
        };

        if size == self.last_size {
            return Ok(Vec::new());
        }

        if size < self.offset {
            debug!(path = %self.path.display(), size, offset = self.offset, "Outfile shrank, rereading");
            self.offset = 0;
        }

        let mut file = File::open(&self.path)
            .await
            .map_err(|e| HashcatError::file(format!("error opening output file: {e}")))?;
        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|e| HashcatError::file(format!("error seeking in output file: {e}")))?;

        let mut appended = Vec::new();
        file.read_to_end(&mut appended)
            .await
            .map_err(|e| HashcatError::file(format!("error reading output file: {e}")))?;
        // Only a completed read counts; a failed one is retried at the same size
        self.last_size = size;

        let complete = appended
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);

        let found: Vec<CrackedHash> = appended[..complete]
            .split(|b| *b == b'\n')
            .filter_map(|raw| parse_result_line(&String::from_utf8_lossy(raw)))
            .map(|(hash, plaintext)| CrackedHash::new(hash, plaintext))
            .collect();

        self.offset += complete as u64;
        Ok(found)
    }

    /// Poll until `cancel` fires, then drain once more and return
    ///
    /// I/O failures are offered to `errors` and polling continues.
    pub async fn run(mut self, cancel: CancellationToken, sink: ResultSink, errors: ErrorSlot) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.deliver(&sink, &errors).await,
            }
        }

        self.deliver(&sink, &errors).await;
        debug!(path = %self.path.display(), offset = self.offset, "Result poller stopped");
    }

    async fn deliver(&mut self, sink: &ResultSink, errors: &ErrorSlot) {
        match self.poll_once().await {
            Ok(found) => {
                for hash in found {
                    debug!(hash = %hash.hash, "Cracked hash found");
                    sink.push(hash).await;
                }
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Result poll failed");
                errors.offer(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn test_splits_plain_line() {
        assert_eq!(
            parse_result_line("5f4dcc3b5aa765d61d8327deb882cf99:password"),
            Some((
                "5f4dcc3b5aa765d61d8327deb882cf99".to_owned(),
                "password".to_owned()
            ))
        );
    }

    #[test]
    fn test_escaped_delimiter_is_unescaped() {
        assert_eq!(
            parse_result_line(r"abc123:pass\:word"),
            Some(("abc123".to_owned(), "pass:word".to_owned()))
        );
        assert_eq!(split_unescaped(r"a\\:b"), vec![r"a\", "b"]);
    }

    #[test]
    fn test_unescaped_delimiter_in_plaintext_is_kept() {
        assert_eq!(
            parse_result_line("abc123:pa:ss"),
            Some(("abc123".to_owned(), "pa:ss".to_owned()))
        );
    }

    #[test]
    fn test_lines_without_plaintext_are_ignored() {
        assert!(parse_result_line("").is_none());
        assert!(parse_result_line("justahash").is_none());
        assert!(parse_result_line(":password").is_none());
        assert_eq!(
            parse_result_line("abc123:"),
            Some(("abc123".to_owned(), String::new()))
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut poller = ResultPoller::new(dir.path().join("none.out"), Duration::from_millis(10));
        assert!(poller.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_only_appended_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.out");
        let mut file = std::fs::File::create(&path).unwrap();
        let mut poller = ResultPoller::new(path.clone(), Duration::from_millis(10));

        writeln!(file, "5f4dcc3b5aa765d61d8327deb882cf99:password").unwrap();
        write!(file, "e10adc3949ba59abbe56e057f20f883e:1234").unwrap();
        file.flush().unwrap();

        let first = poller.poll_once().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].hash, "5f4dcc3b5aa765d61d8327deb882cf99");
        assert_eq!(first[0].plaintext, "password");

        assert!(poller.poll_once().await.unwrap().is_empty());

        writeln!(file, "56").unwrap();
        file.flush().unwrap();
        let second = poller.poll_once().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].plaintext, "123456");
        assert_eq!(poller.offset(), std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn test_truncated_file_is_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.out");
        std::fs::write(&path, "aaaa:one\nbbbb:two\n").unwrap();
        let mut poller = ResultPoller::new(path.clone(), Duration::from_millis(10));
        assert_eq!(poller.poll_once().await.unwrap().len(), 2);

        std::fs::write(&path, "cccc:three\n").unwrap();
        let again = poller.poll_once().await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].hash, "cccc");
    }

    #[tokio::test]
    async fn test_failed_read_is_reported_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.out");
        // A directory in place of the outfile: metadata succeeds, reading fails
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("entry"), "x").unwrap();
        let blocked_size = std::fs::metadata(&path).unwrap().len();
        assert!(blocked_size >= 4, "directory size {blocked_size} too small for this check");

        let results = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ResultSink::new(Arc::clone(&results), tx);
        let errors = ErrorSlot::new();
        let mut poller = ResultPoller::new(path.clone(), Duration::from_millis(10));

        poller.deliver(&sink, &errors).await;
        assert_eq!(errors.peek().map(|e| e.kind), Some(ErrorKind::File));
        assert!(results.lock().await.is_empty());

        // Same size as the failed attempt, so only a retry can pick it up
        std::fs::remove_dir_all(&path).unwrap();
        let padding = usize::try_from(blocked_size).unwrap() - "abc:\n".len();
        let line = format!("abc:{}\n", "p".repeat(padding));
        std::fs::write(&path, &line).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), blocked_size);

        poller.deliver(&sink, &errors).await;
        let stored = results.lock().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].hash, "abc");
        assert_eq!(rx.recv().await.map(|h| h.hash), Some("abc".to_owned()));
        assert_eq!(poller.offset(), blocked_size);
    }

    #[tokio::test]
    async fn test_run_delivers_to_sink_and_drains_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.out");
        let results = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ResultSink::new(Arc::clone(&results), tx);
        let cancel = CancellationToken::new();
        let errors = ErrorSlot::new();

        let poller = ResultPoller::new(path.clone(), Duration::from_secs(3600));
        let task = tokio::spawn(poller.run(cancel.clone(), sink, errors.clone()));

        std::fs::write(&path, "5f4dcc3b5aa765d61d8327deb882cf99:password\n").unwrap();
        cancel.cancel();
        task.await.unwrap();

        let stored = results.lock().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(rx.recv().await.map(|h| h.plaintext), Some("password".to_owned()));
        assert!(!errors.is_occupied());
    }
}
