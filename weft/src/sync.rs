//! Snapshot-ordered synchronization between the command channel and the
//! patch push channel.
//!
//! A command's response can race the patch that carries its effect. Callers
//! learn the snapshot id the effect lands in and await
//! [`SnapshotSync::wait_for_patch`] before reading state that must reflect
//! it. The synchronizer never reorders patches; it only reconciles patch
//! arrival against waits.

use crate::config::TeardownPolicy;
use crate::error::{Error, Result};
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

struct PendingWait {
    tx: oneshot::Sender<()>,
    rx: Shared<oneshot::Receiver<()>>,
}

pub struct SnapshotSync {
    /// None until the first patch: "negative infinity".
    last_seen: Option<u64>,
    pending: HashMap<u64, PendingWait>,
    policy: TeardownPolicy,
}

impl Default for SnapshotSync {
    fn default() -> Self {
        SnapshotSync::new(TeardownPolicy::default())
    }
}

impl SnapshotSync {
    pub fn new(policy: TeardownPolicy) -> Self {
        SnapshotSync { last_seen: None, pending: HashMap::new(), policy }
    }

    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Record an arriving patch. Call once per patch, in arrival order.
    pub fn notify_patch(&mut self, snapshot_id: u64) {
        match self.last_seen {
            Some(prev) if snapshot_id < prev => {
                tracing::warn!(snapshot_id, last_seen = prev, "snapshot id went backwards");
            }
            _ => self.last_seen = Some(snapshot_id),
        }
        if let Some(w) = self.pending.remove(&snapshot_id) {
            tracing::trace!(snapshot_id, "resolving snapshot wait");
            // receivers may all be gone already; nothing to do then
            let _ = w.tx.send(());
        }
    }

    /// Future that completes once the patch with `snapshot_id` has arrived.
    /// Completes immediately if that id (or a later one) was already seen.
    /// Repeated waits for the same pending id share one registration.
    pub fn wait_for_patch(&mut self, snapshot_id: u64) -> PatchWait {
        if self.last_seen.is_some_and(|seen| snapshot_id <= seen) {
            return PatchWait { snapshot_id, policy: self.policy, inner: WaitInner::Ready };
        }
        let w = self.pending.entry(snapshot_id).or_insert_with(|| {
            tracing::trace!(snapshot_id, "registering snapshot wait");
            let (tx, rx) = oneshot::channel();
            PendingWait { tx, rx: rx.shared() }
        });
        PatchWait { snapshot_id, policy: self.policy, inner: WaitInner::Pending(w.rx.clone()) }
    }

    /// Session teardown: forget the last seen id and drop every pending wait
    /// without resolving it.
    pub fn clear_stalled_promises(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(pending = self.pending.len(), policy = ?self.policy, "discarding stalled snapshot waits");
        }
        self.pending.clear();
        self.last_seen = None;
    }
}

enum WaitInner {
    Ready,
    Pending(Shared<oneshot::Receiver<()>>),
    Abandoned,
}

/// Returned by [`SnapshotSync::wait_for_patch`].
///
/// Under [`TeardownPolicy::Abandon`] a wait discarded by
/// `clear_stalled_promises` stays pending forever; under
/// [`TeardownPolicy::Reject`] it completes with `Error::WaitAbandoned`.
#[must_use = "futures do nothing unless polled"]
pub struct PatchWait {
    snapshot_id: u64,
    policy: TeardownPolicy,
    inner: WaitInner,
}

impl PatchWait {
    /// True when the wait was satisfied at creation time.
    pub fn is_immediate(&self) -> bool {
        matches!(self.inner, WaitInner::Ready)
    }
}

impl Future for PatchWait {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            WaitInner::Ready => Poll::Ready(Ok(())),
            WaitInner::Abandoned => Poll::Pending,
            WaitInner::Pending(rx) => match rx.poll_unpin(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(())) => {
                    this.inner = WaitInner::Ready;
                    Poll::Ready(Ok(()))
                }
                Poll::Ready(Err(oneshot::Canceled)) => match this.policy {
                    TeardownPolicy::Abandon => {
                        this.inner = WaitInner::Abandoned;
                        Poll::Pending
                    }
                    TeardownPolicy::Reject => Poll::Ready(Err(Error::WaitAbandoned { snapshot_id: this.snapshot_id })),
                },
            },
        }
    }
}
