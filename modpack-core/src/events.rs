//! Progress and warning events emitted by the pipeline.
//!
//! The core never talks to a logging backend directly; it hands [`Event`]s to
//! an injected [`EventSink`]. [`TracingSink`] is the default.

use crate::error::{ModpackError, Result};
use crate::hash::Digest;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    HashingFile { path: &'a str },
    FileHashed { path: &'a str, size: u64 },
    WritingEntry { index: usize, path: &'a str, size: u64 },
    ArchivePublished { dest: &'a Path, entries: usize },
    EntryVerified { path: &'a str },
    EntryMismatch { path: &'a str, expected: &'a Digest, actual: &'a Digest },
    EntryMissing { path: &'a str },
    EntryExtra { path: &'a str, size: u64 },
    ExtractedFile { path: &'a str },
    Warning { message: &'a str },
}

pub trait EventSink: Send + Sync {
    fn event(&self, event: &Event<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn event(&self, event: &Event<'_>) {
        match *event {
            Event::HashingFile { path } => tracing::debug!(path, "hashing file"),
            Event::FileHashed { path, size } => tracing::debug!(path, size, "hashed file"),
            Event::WritingEntry { index, path, size } => {
                tracing::debug!(index, path, size, "writing entry")
            }
            Event::ArchivePublished { dest, entries } => {
                tracing::info!(dest = %dest.display(), entries, "archive published")
            }
            Event::EntryVerified { path } => tracing::debug!(path, "entry verified"),
            Event::EntryMismatch {
                path,
                expected,
                actual,
            } => tracing::warn!(path, %expected, %actual, "digest mismatch"),
            Event::EntryMissing { path } => tracing::warn!(path, "entry missing from archive"),
            Event::EntryExtra { path, size } => {
                tracing::warn!(path, size, "unexpected body in archive")
            }
            Event::ExtractedFile { path } => tracing::debug!(path, "extracted"),
            Event::Warning { message } => tracing::warn!("{message}"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn event(&self, _event: &Event<'_>) {}
}

/// Event sink plus a shared cancellation flag, cloned into every option set.
#[derive(Clone)]
pub struct Hooks {
    sink: Arc<dyn EventSink>,
    cancelled: Arc<AtomicBool>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Hooks {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn emit(&self, event: Event<'_>) {
        self.sink.event(&event);
    }

    /// Raise the flag; every clone of these hooks observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ModpackError::Cancelled)
        } else {
            Ok(())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn cancel_is_shared_between_clones() {
        let hooks = Hooks::silent();
        let other = hooks.clone();
        assert!(other.check().is_ok());
        hooks.cancel();
        assert!(matches!(other.check(), Err(ModpackError::Cancelled)));
    }

    #[test]
    fn events_reach_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let hooks = Hooks::new(sink.clone());
        hooks.emit(Event::HashingFile { path: "a.txt" });
        hooks.emit(Event::EntryMissing { path: "b.txt" });
        assert_eq!(sink.count("HashingFile"), 1);
        assert_eq!(sink.count("EntryMissing"), 1);
    }
}
