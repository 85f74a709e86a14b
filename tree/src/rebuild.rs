//! Deferred rebuild queue.
//!
//! Structural mutations never rebuild child nodes inline: the UI event that
//! triggered them may still be holding on to the old nodes. Instead they
//! push a [`RebuildRequest`], and the host drains the queue once per UI
//! tick through [`TreeObject::process_pending_rebuilds`](crate::TreeObject::process_pending_rebuilds).

use std::fmt;

/// Why a rebuild was requested. Informational only: every reason leads to
/// the same full child reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    Resize,
    Insert,
    Remove,
    Swap,
    SetElementValue,
    SetValue,
}

/// A pending rebuild of the children under `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildRequest {
    pub path: String,
    pub reason: RebuildReason,
}

/// FIFO of rebuild requests.
pub struct RebuildQueue {
    pending: Vec<RebuildRequest>,
    coalesce: bool,
    scheduled_total: u64,
}

impl RebuildQueue {
    pub fn new(coalesce: bool) -> Self {
        Self {
            pending: Vec::new(),
            coalesce,
            scheduled_total: 0,
        }
    }

    /// Enqueues a request. With coalescing on, a request for a path that is
    /// already pending only updates its reason.
    pub fn push(&mut self, path: impl Into<String>, reason: RebuildReason) {
        let path = path.into();
        self.scheduled_total += 1;
        if self.coalesce {
            if let Some(existing) = self.pending.iter_mut().find(|r| r.path == path) {
                log::debug!(
                    "Coalescing rebuild of '{}' ({:?} -> {:?})",
                    path,
                    existing.reason,
                    reason
                );
                existing.reason = reason;
                return;
            }
        }
        self.pending.push(RebuildRequest { path, reason });
    }

    /// Takes all pending requests in submission order.
    pub fn drain(&mut self) -> Vec<RebuildRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[RebuildRequest] {
        &self.pending
    }

    /// Every request ever pushed, coalesced or not.
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total
    }
}

impl Default for RebuildQueue {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for RebuildQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildQueue")
            .field("pending", &self.pending.len())
            .field("scheduled_total", &self.scheduled_total)
            .finish()
    }
}
