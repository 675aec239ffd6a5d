// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end pipeline behavior: discovery, early stop, interruption,
//! and resume.

use crate::prelude::*;
use gleaner_core::{FakeClock, RunStatus, ThreadStatus};
use gleaner_engine::{run, RunOutcome};
use gleaner_storage::{load_manifest, SessionLayout};
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn happy_path_discovers_evaluates_extracts_and_ranks() {
    let round0: Vec<_> = (0..15).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![round0], 10);

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    let manifest = load_manifest(&SessionLayout::new(&report.session_dir))
        .unwrap()
        .unwrap();

    // Phase 0 ran once and stored the normalized community list.
    assert!(manifest.discovered_subreddits);
    assert_eq!(
        manifest.subreddits,
        vec!["travel", "familytravel", "solotravel"]
    );

    // The goal was met and every landed thread carries ranked entries.
    assert!(manifest.count_in(ThreadStatus::Ranked) >= 10);
    for thread in &manifest.threads {
        if thread.status == ThreadStatus::Ranked {
            assert!(!thread.entries.is_empty());
            assert!(thread.collected_at.is_some());
            assert!(thread.extracted_at.is_some());
        }
    }
    assert_eq!(manifest.runs.last().unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn skip_verdicts_record_reasons_and_spare_the_extractor() {
    let round0 = vec![post("keepme"), post("skipme")];
    let world = World::new(vec![round0], 1);
    world.evaluator.skip("skipme", "rule discussion, no recommendations");

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let manifest = load_manifest(&SessionLayout::new(&report.session_dir))
        .unwrap()
        .unwrap();
    let skipped = manifest.thread("skipme").unwrap();
    assert_eq!(skipped.status, ThreadStatus::Skipped);
    assert_eq!(
        skipped.skip_reason.as_deref(),
        Some("rule discussion, no recommendations")
    );
    assert!(!world.extractor.calls().contains(&"skipme".to_string()));
}

#[tokio::test]
async fn transport_failures_land_on_the_thread_not_the_run() {
    let round0 = vec![post("good"), post("bad")];
    let world = World::new(vec![round0], 2);
    // The evaluator keeps both but saves neither; fetching "bad" fails.
    world.searcher.fail_thread("/r/travel/comments/bad/trip/");

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    let manifest = load_manifest(&SessionLayout::new(&report.session_dir))
        .unwrap()
        .unwrap();
    let bad = manifest.thread("bad").unwrap();
    assert_eq!(bad.status, ThreadStatus::Failed);
    assert!(bad.error.as_deref().unwrap().contains("fetch failed"));
    assert_eq!(
        manifest.thread("good").unwrap().status,
        ThreadStatus::Ranked
    );
}

#[tokio::test]
async fn interruption_preserves_state_and_resume_extends_it() {
    let round0: Vec<_> = (0..6).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![round0.clone()], 6);
    world
        .extractor
        .set_delay(std::time::Duration::from_millis(100));
    let mut config = world.config.clone();
    config.workers = Some(1);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        canceller.cancel();
    });

    let report = run(world.deps.clone(), config, FakeClock::new(), cancel)
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Interrupted);

    let layout = SessionLayout::new(&report.session_dir);
    let manifest = load_manifest(&layout).unwrap().unwrap();
    assert_eq!(
        manifest.runs.last().unwrap().status,
        RunStatus::Interrupted
    );
    let before: BTreeSet<String> = manifest
        .threads
        .iter()
        .filter(|t| matches!(t.status, ThreadStatus::Extracted | ThreadStatus::Ranked))
        .map(|t| t.post_id.clone())
        .collect();

    // Fresh fast collaborators, same session directory.
    let world2 = World::new(vec![round0], 6);
    let mut resume_config = world2.config.clone();
    resume_config.session_dir = Some(report.session_dir.clone());

    let second = run(
        world2.deps.clone(),
        resume_config,
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(second.outcome, RunOutcome::Completed);

    let manifest = load_manifest(&layout).unwrap().unwrap();
    let after: BTreeSet<String> = manifest
        .threads
        .iter()
        .filter(|t| matches!(t.status, ThreadStatus::Extracted | ThreadStatus::Ranked))
        .map(|t| t.post_id.clone())
        .collect();
    assert!(after.is_superset(&before), "resume lost extracted work");
    assert_eq!(after.len(), 6);
}

#[tokio::test]
async fn rerunning_a_completed_session_is_idempotent() {
    let round0: Vec<_> = (0..4).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![round0.clone()], 3);

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    let layout = SessionLayout::new(&report.session_dir);
    let first = load_manifest(&layout).unwrap().unwrap();
    let before: BTreeSet<String> = first
        .threads
        .iter()
        .filter(|t| matches!(t.status, ThreadStatus::Extracted | ThreadStatus::Ranked))
        .map(|t| t.post_id.clone())
        .collect();

    let world2 = World::new(vec![round0], 3);
    let mut resume_config = world2.config.clone();
    resume_config.session_dir = Some(report.session_dir.clone());
    run(
        world2.deps.clone(),
        resume_config,
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let second = load_manifest(&layout).unwrap().unwrap();
    let after: BTreeSet<String> = second
        .threads
        .iter()
        .filter(|t| matches!(t.status, ThreadStatus::Extracted | ThreadStatus::Ranked))
        .map(|t| t.post_id.clone())
        .collect();
    assert!(after.is_superset(&before));
}
