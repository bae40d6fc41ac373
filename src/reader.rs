// ABOUTME: Decodes hashcat's --status-json stdout into Progress records for the session queue
// ABOUTME: Skips undecodable or non-UTF-8 lines and stops at the first terminal status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::diagnostics::ErrorSlot;
use crate::models::{CrackingStatus, Progress};
use crate::stream::LatestSender;
use crate::types::HashcatError;

/// Why the reader stopped consuming the primary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A terminal status was decoded; later lines were not read
    Terminal(CrackingStatus),
    /// The stream reached EOF
    Closed,
    /// A read failed; the error was offered to the slot
    Failed,
}

/// Decode one stdout line, returning `None` for anything that is not a status record
///
/// Lines are taken as raw bytes: the engine echoes guesses and candidates
/// verbatim, so a line need not be valid UTF-8.
#[must_use]
pub fn decode_progress_line(line: &[u8]) -> Option<Progress> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_slice(trimmed) {
        Ok(progress) => Some(progress),
        Err(e) => {
            trace!(error = %e, "Skipping non-status line");
            None
        }
    }
}

/// Forward decoded progress records from `reader` into `queue`
///
/// The reader is borrowed so the caller can keep draining whatever the
/// engine writes after a terminal status.
pub async fn read_progress<R>(
    reader: &mut R,
    queue: &LatestSender<Progress>,
    errors: &ErrorSlot,
) -> ReadOutcome
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut forwarded = 0u64;

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                debug!(forwarded, dropped = queue.evicted(), "hashcat stdout closed");
                return ReadOutcome::Closed;
            }
            Ok(_) => {}
            Err(e) => {
                errors.offer(HashcatError::stream(format!("error reading output: {e}")));
                return ReadOutcome::Failed;
            }
        }

        let Some(progress) = decode_progress_line(&line) else {
            continue;
        };

        let status = progress.status;
        if queue.push(progress).is_some() {
            trace!("Progress queue full, dropped oldest snapshot");
        }
        forwarded += 1;

        if status.is_terminal() {
            debug!(%status, forwarded, dropped = queue.evicted(), "Terminal status observed");
            return ReadOutcome::Terminal(status);
        }
    }
}
