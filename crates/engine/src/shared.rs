// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared between the driver, the worker pool, and the saver.

use gleaner_core::Manifest;
use gleaner_storage::{save_manifest, SessionLayout, StorageError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// The manifest plus the pipeline's progress accounting.
///
/// The manifest mutex is the only lock; work under it is bounded to
/// arithmetic and slice appends. Counters are atomics so progress checks
/// never contend with mutations.
pub(crate) struct Shared {
    pub manifest: Mutex<Manifest>,
    dirty: AtomicBool,
    /// Cumulative items pushed into the work channel
    pub fed: AtomicU64,
    /// Cumulative items driven to a terminal-for-the-run status
    /// (skipped, failed, or extracted) — never incremented at pickup
    pub done: AtomicU64,
    /// Threads currently extracted or ranked (the early-stop goal)
    goal_hits: AtomicU64,
    target: u64,
    /// Signalled on every done/goal increment so waiters re-check
    pub progress: Notify,
    /// Last saver failure, surfaced at run end
    save_error: Mutex<Option<StorageError>>,
}

impl Shared {
    pub fn new(manifest: Manifest, target: usize) -> Arc<Self> {
        let goal = manifest.goal_count() as u64;
        Arc::new(Self {
            manifest: Mutex::new(manifest),
            dirty: AtomicBool::new(false),
            fed: AtomicU64::new(0),
            done: AtomicU64::new(0),
            goal_hits: AtomicU64::new(goal),
            target: target as u64,
            progress: Notify::new(),
            save_error: Mutex::new(None),
        })
    }

    /// Run a closure under the manifest mutex and mark the manifest dirty.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Manifest) -> T) -> T {
        let out = f(&mut self.manifest.lock());
        self.dirty.store(true, Ordering::SeqCst);
        out
    }

    /// Read-only access under the manifest mutex.
    pub fn read<T>(&self, f: impl FnOnce(&Manifest) -> T) -> T {
        f(&self.manifest.lock())
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// `extracted + ranked >= L`
    pub fn goal_met(&self) -> bool {
        self.goal_hits.load(Ordering::SeqCst) >= self.target
    }

    pub fn note_goal_hit(&self) {
        self.goal_hits.fetch_add(1, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    /// Record that one fed item reached a terminal-for-the-run status.
    pub fn note_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    /// All fed items have completed.
    pub fn round_drained(&self) -> bool {
        self.done.load(Ordering::SeqCst) >= self.fed.load(Ordering::SeqCst)
    }

    pub fn record_save_error(&self, error: StorageError) {
        *self.save_error.lock() = Some(error);
    }

    pub fn take_save_error(&self) -> Option<StorageError> {
        self.save_error.lock().take()
    }

    /// Snapshot under the mutex, then write outside it. Used by the saver
    /// and for the forced final save.
    pub fn save_snapshot(&self, layout: &SessionLayout) -> Result<(), StorageError> {
        let snapshot = self.manifest.lock().clone();
        save_manifest(layout, &snapshot)
    }

    /// Save if dirty; on failure keep the dirty flag so the next tick
    /// retries, and record the error for run-end reporting.
    pub fn save_if_dirty(&self, layout: &SessionLayout) {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.save_snapshot(layout) {
            tracing::warn!(error = %e, "periodic manifest save failed");
            self.dirty.store(true, Ordering::SeqCst);
            self.record_save_error(e);
        }
    }
}

/// Background task that flushes dirty manifest state every few seconds,
/// batching disk writes off the critical path.
pub(crate) async fn run_saver(
    shared: Arc<Shared>,
    layout: SessionLayout,
    interval: std::time::Duration,
    shutdown: CancellationToken,
) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so saves are spaced out.
    tick.tick().await;
    loop {
        tokio::select! {
            _ = tick.tick() => shared.save_if_dirty(&layout),
            _ = shutdown.cancelled() => break,
        }
    }
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
