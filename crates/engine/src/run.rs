// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run entry point: session open, phase 0, streaming pipeline, ranking,
//! and run-level accounting.

use crate::config::{RunConfig, RunDeps, SAVE_INTERVAL};
use crate::discovery::ensure_subreddits;
use crate::error::EngineError;
use crate::pipeline::Pipeline;
use crate::rank::rank_session;
use crate::session::open_session;
use crate::shared::{run_saver, Shared};
use crate::worker::WorkerCtx;
use gleaner_core::{Clock, Form, RunStatus, ThreadStatus};
use gleaner_storage::ExtractionLog;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a run ended. Cancellation is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

gleaner_core::simple_display! {
    RunOutcome {
        Completed => "completed",
        Interrupted => "interrupted",
    }
}

/// What a finished run reports back
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Session directory, always suitable for resume
    pub session_dir: PathBuf,
    pub totals: BTreeMap<ThreadStatus, usize>,
    pub threads_processed: u64,
    /// Set when periodic saves failed during the run (the final save
    /// still succeeded)
    pub save_warning: Option<String>,
}

/// Execute one run over a new or resumed session.
///
/// A `Completed` or `Interrupted` report guarantees the manifest on disk
/// reflects the final state. Errors after the session was opened mark the
/// run log `failed` and flush state on a best-effort basis.
pub async fn run<C: Clock>(
    deps: RunDeps,
    config: RunConfig,
    clock: C,
    cancel: CancellationToken,
) -> Result<RunReport, EngineError> {
    if config.target_entries == 0 {
        return Err(EngineError::Config(
            "target entry count must be positive".to_string(),
        ));
    }

    // Configuration errors surface before any session is touched.
    let (form, form_raw) = Form::load(&config.form_path)?;
    let form = Arc::new(form);
    let query = if config.query.trim().is_empty() {
        form.default_query().to_string()
    } else {
        config.query.clone()
    };

    let opened = open_session(&config, &form, &form_raw, &query, &clock)?;
    let layout = opened.layout;
    let shared = Shared::new(opened.manifest, config.target_entries);

    let run_id = uuid::Uuid::new_v4().to_string();
    shared.mutate(|m| m.start_run(run_id.clone(), clock.now_utc()));
    shared.save_snapshot(&layout)?;
    tracing::info!(%run_id, session = %layout.dir().display(), goal = config.target_entries, "run started");

    let saver_shutdown = CancellationToken::new();
    let saver = tokio::spawn(run_saver(
        shared.clone(),
        layout.clone(),
        SAVE_INTERVAL,
        saver_shutdown.clone(),
    ));

    let result = drive(
        &deps,
        &config,
        &form,
        &query,
        &layout,
        &shared,
        &clock,
        &cancel,
    )
    .await;

    // Run-level accounting, then the forced final save on every exit path.
    let processed = shared.done.load(Ordering::SeqCst);
    let status = match &result {
        Err(_) => RunStatus::Failed,
        Ok(()) if cancel.is_cancelled() => RunStatus::Interrupted,
        Ok(()) => RunStatus::Completed,
    };
    shared.mutate(|m| m.complete_run(status, processed, clock.now_utc()));

    saver_shutdown.cancel();
    let _ = saver.await;

    let final_save = shared.save_snapshot(&layout);
    let save_warning = shared.take_save_error().map(|e| e.to_string());
    if let Some(warning) = &save_warning {
        tracing::warn!(error = %warning, "periodic manifest saves failed during the run");
    }

    result?;
    final_save?;

    let totals = shared.read(|m| m.counts_by_status());
    let outcome = if cancel.is_cancelled() {
        RunOutcome::Interrupted
    } else {
        RunOutcome::Completed
    };
    tracing::info!(
        outcome = %outcome,
        processed,
        extracted = totals.get(&ThreadStatus::Extracted).copied().unwrap_or(0),
        ranked = totals.get(&ThreadStatus::Ranked).copied().unwrap_or(0),
        skipped = totals.get(&ThreadStatus::Skipped).copied().unwrap_or(0),
        failed = totals.get(&ThreadStatus::Failed).copied().unwrap_or(0),
        "run finished"
    );

    Ok(RunReport {
        outcome,
        session_dir: layout.dir().to_path_buf(),
        totals,
        threads_processed: processed,
        save_warning,
    })
}

/// Phase 0 plus the streaming pipeline plus ranking. Per-thread errors
/// stay on their threads; only storage problems abort.
#[allow(clippy::too_many_arguments)]
async fn drive<C: Clock>(
    deps: &RunDeps,
    config: &RunConfig,
    form: &Arc<Form>,
    query: &str,
    layout: &gleaner_storage::SessionLayout,
    shared: &Arc<Shared>,
    clock: &C,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    let extraction_log = Arc::new(ExtractionLog::open(layout)?);

    let subreddits = ensure_subreddits(deps, form, query, shared, cancel).await;

    let ctx = Arc::new(WorkerCtx {
        deps: deps.clone(),
        form: form.clone(),
        layout: layout.clone(),
        shared: shared.clone(),
        extraction_log,
        cancel: cancel.clone(),
        clock: clock.clone(),
    });
    let pipeline = Pipeline {
        ctx,
        query: query.to_string(),
        subreddits,
        sort: config.sort,
        target: config.target_entries,
        worker_count: config.worker_count(),
    };
    pipeline.run().await;

    if !cancel.is_cancelled() {
        rank_session(deps, form, shared, cancel, clock).await;
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
