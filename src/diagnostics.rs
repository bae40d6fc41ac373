// ABOUTME: Single-slot error holder and the diagnostic-stream drain that feeds it
// ABOUTME: First error offered wins; later errors are dropped without blocking the sender
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

use crate::types::HashcatError;

/// Shared holder for at most one error per session
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    inner: Arc<Mutex<Option<HashcatError>>>,
}

impl ErrorSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `err` if the slot is empty; returns whether it was stored
    pub fn offer(&self, err: HashcatError) -> bool {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!(error = %err, "Error slot occupied, dropping error");
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Clone of the stored error, leaving it in place
    #[must_use]
    pub fn peek(&self) -> Option<HashcatError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an error is currently held
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Drain the engine's diagnostic stream to EOF
///
/// Every line is accumulated, with invalid UTF-8 replaced rather than ending
/// the drain. If any text was captured a single engine error carrying all
/// of it is offered to `slot`. Returns the captured text.
pub async fn drain_diagnostics<R>(stream: R, slot: ErrorSlot) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut captured = String::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                captured.push_str(text.trim_end_matches(['\r', '\n']));
                captured.push('\n');
            }
            Err(e) => {
                debug!(error = %e, "Diagnostic stream read failed");
                break;
            }
        }
    }

    if !captured.is_empty() {
        warn!(output = %captured.trim_end(), "hashcat wrote diagnostics");
        slot.offer(HashcatError::engine(captured.clone()));
    }

    captured
}
