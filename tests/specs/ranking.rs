// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ranking behavior over real session runs: duplicate clustering, thread
//! saturation, and degradation when the ranker agent fails.

use crate::prelude::*;
use gleaner_core::{Entry, FakeClock, FieldValue, RankFlag, ThreadStatus, Value};
use gleaner_engine::{project_results, run, RunOutcome};
use gleaner_storage::{load_manifest, SessionLayout};
use tokio_util::sync::CancellationToken;

fn entry(primary: &str, confidence: f64) -> Entry {
    Entry::new(vec![FieldValue::new(
        "destination",
        Value::String(primary.to_string()),
        confidence,
    )])
}

#[tokio::test]
async fn near_duplicate_destinations_cluster_and_penalize() {
    let posts: Vec<_> = (0..5).map(|i| post(&format!("p{i}"))).collect();
    let world = World::new(vec![posts], 5);
    world.extractor.set_entries("p0", vec![entry("Walt Disney World", 0.95)]);
    world.extractor.set_entries(
        "p1",
        vec![entry("Walt Disney World (Magic Kingdom, EPCOT)", 0.6)],
    );
    world.extractor.set_entries("p2", vec![entry("WDW", 0.9)]);
    world.extractor.set_entries("p3", vec![entry("Disneyland", 0.9)]);
    world.extractor.set_entries("p4", vec![entry("Yellowstone", 0.9)]);

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
    let entry_of = |id: &str| manifest.thread(id).unwrap().entries[0].clone();

    // The higher-confidence "Walt Disney World" wins its cluster; the
    // parenthetical variant normalizes to the same primary and loses 15.
    let winner = entry_of("p0");
    let loser = entry_of("p1");
    assert!(winner.rank_flags.is_empty());
    assert!(loser.rank_flags.contains(&RankFlag::Duplicate));
    assert_eq!(
        loser.rank_reason.as_deref(),
        Some("Similar to higher-scored entry: Walt Disney World")
    );
    // Identical engagement and completeness, so the gap is exactly the
    // confidence spread (0.40 × 35 points) plus the -15 penalty.
    let gap = winner.rank_score.unwrap() - loser.rank_score.unwrap();
    assert!((gap - 29.0).abs() < 1e-9, "got gap {gap}");

    // The abbreviation and the distinct parks stay unflagged singletons.
    for id in ["p2", "p3", "p4"] {
        assert!(entry_of(id).rank_flags.is_empty(), "{id} was penalized");
    }
}

#[tokio::test]
async fn entries_piling_up_in_one_thread_are_saturation_penalized() {
    let posts = vec![post("big"), post("solo")];
    let world = World::new(vec![posts], 2);
    let destinations = [
        ("Banff", 0.95),
        ("Zion", 0.9),
        ("Acadia", 0.85),
        ("Glacier", 0.8),
        ("Arches", 0.75),
        ("Denali", 0.7),
    ];
    world.extractor.set_entries(
        "big",
        destinations.iter().map(|(p, c)| entry(p, *c)).collect(),
    );
    world.extractor.set_entries("solo", vec![entry("Yosemite", 0.9)]);

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
    let big = manifest.thread("big").unwrap();
    let scores: Vec<f64> = big
        .entries
        .iter()
        .map(|e| e.rank_score.unwrap())
        .collect();
    // Same engagement for every entry, so the confidence order is the
    // rank order: gaps between neighbors grow by the -5·r ladder on top
    // of the confidence spread.
    for pair in scores.windows(2) {
        assert!(pair[0] > pair[1], "saturation must preserve order: {scores:?}");
    }
    // The top entry is unpenalized; the sole entry of the other thread
    // is untouched entirely.
    let solo = manifest.thread("solo").unwrap();
    let yosemite = solo.entries[0].rank_score.unwrap();
    let banff = scores[0];
    assert!((yosemite - banff).abs() < 3.0, "solo entry was penalized: {yosemite} vs {banff}");
}

#[tokio::test]
async fn ranker_agent_failure_degrades_to_algorithmic_ranking() {
    let posts = vec![post("a"), post("b")];
    let world = World::new(vec![posts], 2);
    world.extractor.set_entries("a", vec![entry("Banff", 0.95)]);
    world.extractor.set_entries("b", vec![entry("Banff National Park", 0.6)]);
    world.ranker.fail("model quota exhausted");

    let report = run(
        world.deps.clone(),
        world.config.clone(),
        FakeClock::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    // The run still completes; diversity flags survive untouched.
    assert_eq!(report.outcome, RunOutcome::Completed);
    let manifest = load_manifest(&SessionLayout::new(&report.session_dir))
        .unwrap()
        .unwrap();
    assert!(manifest
        .threads
        .iter()
        .all(|t| t.status == ThreadStatus::Ranked));
    let loser = &manifest.thread("b").unwrap().entries[0];
    assert!(loser.rank_flags.contains(&RankFlag::Duplicate));
    assert!(loser.rank_score.is_some());
}

#[tokio::test]
async fn projection_orders_by_final_score_and_hides_nothing_public() {
    let posts = vec![post("a"), post("b")];
    let world = World::new(vec![posts], 2);
    world.extractor.set_entries("a", vec![entry("Banff", 0.95)]);
    world.extractor.set_entries("b", vec![entry("Zion", 0.5)]);

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
    let form = gleaner_core::Form::parse(VACATION_FORM).unwrap();
    let results = project_results(&manifest, &form);

    assert_eq!(results.entries.len(), 2);
    assert_eq!(results.entries[0].primary, "Banff");
    assert_eq!(results.entries[1].primary, "Zion");
    let scores: Vec<f64> = results
        .entries
        .iter()
        .map(|e| e.rank_score.unwrap())
        .collect();
    assert!(scores[0] >= scores[1]);
    assert!(!results.runs.is_empty());
}
