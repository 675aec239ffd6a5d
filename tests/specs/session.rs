// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-substrate behavior: atomic saves, corrupt artifacts, and
//! manifest invariants observable through the public surface.

use crate::prelude::*;
use gleaner_core::{Clock, FakeClock, Form, FormRef, Manifest, ThreadStatus};
use gleaner_engine::{run, RunOutcome};
use gleaner_storage::{load_manifest, save_manifest, SessionLayout};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn manifest_on_disk_is_always_a_complete_snapshot() {
    let round0: Vec<_> = (0..5).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![round0], 5);

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let layout = SessionLayout::new(&report.session_dir);
    // The canonical file parses and no staging file is left behind.
    assert!(load_manifest(&layout).unwrap().is_some());
    assert!(!layout.manifest_path().with_extension("json.tmp").exists());
}

#[tokio::test]
async fn session_directory_carries_every_artifact_kind() {
    let round0 = vec![post("abc")];
    let world = World::new(vec![round0], 1);
    // Evaluator persists the canonical payload itself this time.
    world
        .evaluator
        .keep_with_thread("abc", thread_for(&post("abc")), 1);

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let dir = &report.session_dir;
    assert!(dir.join("manifest.json").exists());
    assert!(dir.join("thread_abc.json").exists());
    assert!(dir.join("eval_abc.json").exists());
    assert!(dir.join("extraction.log").exists());
}

#[tokio::test]
async fn corrupt_canonical_thread_payload_is_refetched_on_resume() {
    // Stage a session as an interrupted run would have left it: one
    // collected thread whose canonical payload went bad on disk.
    let world = World::new(vec![], 1);
    let clock = FakeClock::new();
    let session_dir = world.out.path().join("sessions").join("staged");
    let layout = SessionLayout::new(&session_dir);

    let mut manifest = Manifest::new(
        FormRef {
            title: "Family vacation ideas".to_string(),
            path: "form.json".to_string(),
            hash: World::form_hash(),
        },
        "family vacation",
        clock.now_utc(),
    );
    manifest.add_thread(&post("abc"), clock.now_utc());
    manifest
        .set_thread_status("abc", ThreadStatus::Collected, clock.now_utc())
        .unwrap();
    save_manifest(&layout, &manifest).unwrap();
    std::fs::write(layout.thread_path("abc"), b"{truncated garbage").unwrap();

    world.searcher.set_thread(thread_for(&post("abc")));
    let mut config = world.config.clone();
    config.session_dir = Some(session_dir);

    let report = run(
        world.deps.clone(),
        config,
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    let manifest = load_manifest(&layout).unwrap().unwrap();
    assert_eq!(manifest.thread("abc").unwrap().status, ThreadStatus::Ranked);
    // The canonical copy was rewritten and parses again.
    let rewritten = layout.read_thread("abc").unwrap();
    assert_eq!(rewritten.id, "abc");
}

#[tokio::test]
async fn every_field_value_references_a_form_field() {
    let round0: Vec<_> = (0..3).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![round0], 3);

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
    let form = Form::parse(VACATION_FORM).unwrap();
    let mut seen_ids = std::collections::BTreeSet::new();
    for thread in &manifest.threads {
        assert!(
            seen_ids.insert(thread.post_id.clone()),
            "duplicate post id {}",
            thread.post_id
        );
        for entry in &thread.entries {
            entry.check_against(&form).unwrap();
            for fv in &entry.fields {
                assert!((0.0..=1.0).contains(&fv.confidence));
            }
        }
    }
}

#[tokio::test]
async fn resuming_with_an_edited_form_is_refused() {
    let round0 = vec![post("p0")];
    let world = World::new(vec![round0], 1);

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    // Edit the form on disk, then resume the same session.
    let edited = VACATION_FORM.replace("What destination?", "Which destination?");
    std::fs::write(&world.config.form_path, edited).unwrap();
    let mut config = world.config.clone();
    config.session_dir = Some(report.session_dir.clone());

    let err = run(
        world.deps.clone(),
        config,
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("form content changed"));
}
