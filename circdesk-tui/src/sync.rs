//! Fetch-and-sync engine: one handle per remote read view.
//!
//! Each [`SyncHandle`] keeps the last observed snapshot of a resource
//! (`data` / `loading` / `error`) and the bookkeeping for its single
//! outstanding request. Issuing a new request supersedes the previous one:
//! its cancellation token fires (dropping the request future aborts the
//! transfer itself) and its sequence number goes stale, so a completion that
//! already reached the event channel is discarded on apply. The last request
//! *issued* wins, never the last to resolve.
//!
//! There is no retry, no backoff, and no polling here; the refresh protocol
//! in `app.rs` decides when a handle re-fetches.

use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ApiResult;

/// Read-only view of one remote resource, as last observed.
///
/// On failure `data` keeps its previous value: a view goes stale, not blank.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<crate::api::ApiError>,
}

pub struct SyncHandle<T> {
    snapshot: Snapshot<T>,
    seq: u64,
    cancel: CancellationToken,
}

impl<T: Send + 'static> SyncHandle<T> {
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot {
                data: None,
                loading: false,
                error: None,
            },
            seq: 0,
            cancel: CancellationToken::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot<T> {
        &self.snapshot
    }

    /// Issue a new request, superseding any in-flight one. The spawned task
    /// posts `wrap(seq, result)` to the event channel unless it is cancelled
    /// first.
    pub fn refresh<E, F, W>(&mut self, fut: F, tx: UnboundedSender<E>, wrap: W)
    where
        E: Send + 'static,
        F: Future<Output = ApiResult<T>> + Send + 'static,
        W: FnOnce(u64, ApiResult<T>) -> E + Send + 'static,
    {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.seq += 1;
        self.snapshot.loading = true;

        let seq = self.seq;
        let token = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(seq, "request cancelled");
                }
                result = fut => {
                    // The receiver is gone during shutdown; nothing to do then.
                    let _ = tx.send(wrap(seq, result));
                }
            }
        });
    }

    /// Apply a completed request to the snapshot. Results tagged with a
    /// superseded sequence number are discarded.
    pub fn apply(&mut self, seq: u64, result: ApiResult<T>) {
        if seq != self.seq {
            debug!(seq, current = self.seq, "discarding stale response");
            return;
        }
        self.snapshot.loading = false;
        match result {
            Ok(data) => {
                self.snapshot.data = Some(data);
                self.snapshot.error = None;
            }
            Err(error) => {
                self.snapshot.error = Some(error);
            }
        }
    }

    /// Unmount: abort any in-flight request without touching the snapshot.
    /// The sequence bump also invalidates a completion that reached the
    /// channel before the token fired.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.seq += 1;
    }
}
