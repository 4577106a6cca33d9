//! Background tokenization for large documents.
//!
//! A scan runs on a blocking worker and is stamped with the session's
//! edit generation at spawn time. Any edit arriving while the scan is in
//! flight supersedes it: the stale result is discarded, never merged
//! (last-edit-wins).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::buffer::EditorSession;
use crate::syntax::TokenMap;

/// Documents below this size are cheaper to scan inline.
pub const BACKGROUND_SCAN_THRESHOLD: usize = 64 * 1024;

/// A finished scan, still stamped with the generation it saw.
#[derive(Debug)]
pub struct CompletedScan {
    pub(crate) generation: u64,
    pub(crate) map: TokenMap,
}

/// An in-flight background scan.
#[derive(Debug)]
pub struct ScanTask {
    stamped: u64,
    current: Arc<AtomicU64>,
    join: JoinHandle<TokenMap>,
}

impl ScanTask {
    /// Whether an edit has already superseded this scan.
    pub fn is_superseded(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.stamped
    }

    /// Wait for the scan and return its result, or `None` if it was
    /// superseded or the worker failed.
    pub async fn finish(self) -> Option<CompletedScan> {
        let map = self.join.await.ok()?;
        if self.current.load(Ordering::SeqCst) != self.stamped {
            debug!("background scan superseded by a newer edit");
            return None;
        }
        Some(CompletedScan {
            generation: self.stamped,
            map,
        })
    }
}

/// Spawn a full re-scan of the session's current text.
///
/// Must be called within a tokio runtime. Install the result with
/// [`EditorSession::try_install_scan`], which re-checks the generation.
pub fn spawn_rescan(session: &EditorSession) -> ScanTask {
    let stamped = session.generation();
    let current = session.generation_handle();
    let text = session.save();
    let join = tokio::task::spawn_blocking(move || TokenMap::scan(&text));
    ScanTask {
        stamped,
        current,
        join,
    }
}
