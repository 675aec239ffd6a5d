// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming pipeline driver: multi-round discovery feeding a persistent
//! worker pool over one bounded channel.

use crate::config::{MAX_ROUNDS, OVERPROVISION_FACTOR, ROUND_POLL_INTERVAL, WORK_CHANNEL_CAPACITY};
use crate::discovery::discover_round;
use crate::worker::{worker_loop, WorkItem, WorkerCtx};
use gleaner_adapters::SortMode;
use gleaner_core::{Clock, ThreadState, ThreadStatus};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex as AsyncMutex;

pub(crate) struct Pipeline<C: Clock> {
    pub ctx: Arc<WorkerCtx<C>>,
    pub query: String,
    pub subreddits: Vec<String>,
    pub sort: SortMode,
    pub target: usize,
    pub worker_count: usize,
}

impl<C: Clock> Pipeline<C> {
    /// Drive discovery rounds and the worker pool until the goal is met,
    /// the rounds are exhausted, or the run is cancelled.
    pub async fn run(&self) {
        let (tx, rx) = mpsc::channel::<WorkItem>(WORK_CHANNEL_CAPACITY);
        let rx = Arc::new(AsyncMutex::new(rx));

        let workers: Vec<_> = (0..self.worker_count)
            .map(|_| tokio::spawn(worker_loop(self.ctx.clone(), rx.clone())))
            .collect();
        tracing::info!(workers = self.worker_count, "worker pool started");

        // Post ids ever pushed into the channel. Each id is fed at most
        // once, which is what makes a worker the sole owner of its item.
        let mut fed_ids: HashSet<String> = HashSet::new();

        // Resume case: already-collected threads go straight to extraction.
        let resume: Vec<ThreadState> = self.ctx.shared.read(|m| {
            m.threads_in(ThreadStatus::Collected)
                .into_iter()
                .cloned()
                .collect()
        });
        if !resume.is_empty() {
            tracing::info!(count = resume.len(), "re-feeding collected threads");
            for state in resume {
                self.feed(
                    &tx,
                    &mut fed_ids,
                    WorkItem {
                        state,
                        needs_eval: false,
                    },
                );
            }
        }

        for round in 0..MAX_ROUNDS {
            if self.ctx.cancel.is_cancelled() || self.ctx.shared.goal_met() {
                break;
            }

            let actionable = self.ctx.shared.read(|m| m.actionable_count());
            let overprovision = self.target * OVERPROVISION_FACTOR;
            let remaining = overprovision.saturating_sub(actionable);
            if remaining > 0 {
                let posts = discover_round(
                    &self.ctx.deps,
                    &self.ctx.form,
                    &self.query,
                    &self.subreddits,
                    remaining,
                    self.sort,
                    &self.ctx.layout,
                    &self.ctx.cancel,
                )
                .await;
                let now = self.ctx.clock.now_utc();
                let added = self.ctx.shared.mutate(|m| {
                    posts.iter().filter(|p| m.add_thread(p, now)).count()
                });
                tracing::info!(round, found = posts.len(), added, "discovery round");
            }

            let pending: Vec<ThreadState> = self.ctx.shared.read(|m| {
                m.threads_in(ThreadStatus::Pending)
                    .into_iter()
                    .filter(|t| !fed_ids.contains(&t.post_id))
                    .cloned()
                    .collect()
            });
            for state in pending {
                self.feed(
                    &tx,
                    &mut fed_ids,
                    WorkItem {
                        state,
                        needs_eval: true,
                    },
                );
            }

            if !self.wait_round().await {
                break; // cancelled
            }

            if round == 0 && self.circuit_broken() {
                tracing::warn!(
                    "round 0 produced no extractable threads, aborting further discovery"
                );
                break;
            }
        }

        // Closing the channel releases workers blocked on recv.
        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        tracing::debug!("worker pool drained");
    }

    /// Push one item, non-blocking. The goal is re-checked before every
    /// push, and a full channel drops the item (it stays `pending` in the
    /// manifest and is re-fed next round), so the feeder can never
    /// deadlock against early-exiting workers.
    fn feed(
        &self,
        tx: &mpsc::Sender<WorkItem>,
        fed_ids: &mut HashSet<String>,
        item: WorkItem,
    ) {
        if self.ctx.shared.goal_met() {
            return;
        }
        if !fed_ids.insert(item.state.post_id.clone()) {
            return;
        }
        match tx.try_send(item) {
            Ok(()) => {
                self.ctx.shared.fed.fetch_add(1, Ordering::SeqCst);
            }
            Err(TrySendError::Full(item)) => {
                fed_ids.remove(&item.state.post_id);
                tracing::debug!(post_id = %item.state.post_id, "work channel full, deferring item");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Block until every fed item reached a terminal status, the goal is
    /// met, or the run is cancelled. Progress notifications wake the
    /// waiter; the tick is a safety net.
    async fn wait_round(&self) -> bool {
        loop {
            if self.ctx.cancel.is_cancelled() {
                return false;
            }
            if self.ctx.shared.round_drained() || self.ctx.shared.goal_met() {
                return true;
            }
            tokio::select! {
                _ = self.ctx.shared.progress.notified() => {}
                _ = tokio::time::sleep(ROUND_POLL_INTERVAL) => {}
                _ = self.ctx.cancel.cancelled() => {}
            }
        }
    }

    /// After round 0: everything fed has completed, nothing was
    /// extracted, and every thread ended skipped or failed. More rounds
    /// would only burn discovery budget on a broken corpus or form.
    fn circuit_broken(&self) -> bool {
        if !self.ctx.shared.round_drained() {
            return false;
        }
        self.ctx.shared.read(|m| {
            let extracted =
                m.count_in(ThreadStatus::Extracted) + m.count_in(ThreadStatus::Ranked);
            let dead = m.count_in(ThreadStatus::Skipped) + m.count_in(ThreadStatus::Failed);
            let open = m.count_in(ThreadStatus::Pending) + m.count_in(ThreadStatus::Collected);
            extracted == 0 && dead > 0 && open == 0
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
