//! `Inbox` – the only seam between the transport and the frame loop.
//!
//! ```text
//! transport task / thread         │  frame loop
//! ──────────────────────────────  │ ──────────────────────────────
//! InboxSender::push(raw)          │  Inbox::drain(&decoder)
//!   → queue.push_back(raw)        │    → keep newest, discard rest
//!                                 │    → decode newest
//! ```
//!
//! The queue is unbounded; staleness is bounded instead, because a drain
//! always discards everything but the newest message.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use parking_lot::Mutex;

use crate::protocol::{DecodeError, Snapshot, SnapshotDecoder};

type Queue = Arc<Mutex<VecDeque<Bytes>>>;

/// Result of draining a non-empty inbox.
#[derive(Debug)]
pub struct Drain {
    /// Decoded newest message.
    pub snapshot: Result<Snapshot, DecodeError>,
    /// Older messages thrown away without being decoded.
    pub discarded: usize,
}

/// Consumer side, owned by the frame loop.
#[derive(Debug, Default)]
pub struct Inbox {
    queue: Queue,
}

/// Producer side, cloned into the transport.
#[derive(Debug, Clone)]
pub struct InboxSender {
    queue: Queue,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> InboxSender {
        InboxSender {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Remove every queued message and return the newest one, untouched.
    pub fn take_latest(&self) -> Option<(Bytes, usize)> {
        let mut queue = self.queue.lock();
        let latest = queue.pop_back()?;
        let discarded = queue.len();
        queue.clear();
        Some((latest, discarded))
    }

    /// Drain the queue and decode the newest message.
    ///
    /// Returns `None` (and changes nothing) when the queue is empty.
    pub fn drain(&self, decoder: &SnapshotDecoder) -> Option<Drain> {
        // Decode outside the lock so the transport is never blocked on parsing.
        let (latest, discarded) = self.take_latest()?;
        if discarded > 0 {
            debug!("Discarding {} stale snapshot(s)", discarded);
        }
        Some(Drain {
            snapshot: decoder.decode(&latest),
            discarded,
        })
    }
}

impl InboxSender {
    pub fn push(&self, raw: impl Into<Bytes>) {
        self.queue.lock().push_back(raw.into());
    }
}
