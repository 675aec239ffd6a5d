// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::RankFieldValue;
use gleaner_core::ThreadStatus;
use tempfile::tempdir;

fn post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        title: format!("Post {}", id),
        permalink: format!("/r/travel/comments/{}/post/", id),
        subreddit: "travel".to_string(),
        score: 10,
        num_comments: 3,
        reason: None,
    }
}

fn thread(id: &str) -> Thread {
    Thread {
        id: id.to_string(),
        title: format!("Post {}", id),
        permalink: format!("/r/travel/comments/{}/post/", id),
        subreddit: "travel".to_string(),
        score: 10,
        num_comments: 3,
        selftext: String::new(),
        comments: Vec::new(),
    }
}

fn thread_state(id: &str) -> ThreadState {
    let mut ts = ThreadState::from_post(&post(id));
    ts.status = ThreadStatus::Pending;
    ts
}

#[tokio::test]
async fn searcher_records_calls_and_respects_limit() {
    let searcher = FakeSearcher::new();
    searcher.set_posts(vec![post("a"), post("b"), post("c")]);
    let cancel = CancellationToken::new();

    let results = searcher
        .search("family vacation", "travel", 2, &cancel)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        searcher.calls(),
        vec![SearchCall::Search {
            query: "family vacation".to_string(),
            subreddit: "travel".to_string(),
            limit: 2,
        }]
    );
}

#[tokio::test]
async fn searcher_transport_failure_injection() {
    let searcher = FakeSearcher::new();
    searcher.fail_searches("connection reset");
    let cancel = CancellationToken::new();

    let err = searcher.search("q", "all", 5, &cancel).await.unwrap_err();
    assert!(matches!(err, AdapterError::Transport(_)));
}

#[tokio::test]
async fn searcher_get_thread_by_permalink() {
    let searcher = FakeSearcher::new();
    searcher.set_thread(thread("abc"));
    let cancel = CancellationToken::new();

    let t = searcher
        .get_thread("/r/travel/comments/abc/post/", 100, &cancel)
        .await
        .unwrap();
    assert_eq!(t.id, "abc");

    let err = searcher
        .get_thread("/r/travel/comments/zzz/post/", 100, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Transport(_)));
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let searcher = FakeSearcher::new();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = searcher.search("q", "all", 5, &cancel).await.unwrap_err();
    assert!(matches!(err, AdapterError::Cancelled));
}

#[tokio::test]
async fn thread_discoverer_pops_one_round_per_call() {
    let discoverer = FakeThreadDiscoverer::new(vec![vec![post("a")], vec![post("b"), post("c")]]);
    let cancel = CancellationToken::new();
    let dir = tempdir().unwrap();
    let form = Form::test_single("destination");
    let subs = vec!["travel".to_string()];

    let r0 = discoverer
        .discover_threads(&form, "q", &subs, 10, dir.path(), &cancel)
        .await
        .unwrap();
    let r1 = discoverer
        .discover_threads(&form, "q", &subs, 10, dir.path(), &cancel)
        .await
        .unwrap();
    let r2 = discoverer
        .discover_threads(&form, "q", &subs, 10, dir.path(), &cancel)
        .await
        .unwrap();
    assert_eq!(r0.len(), 1);
    assert_eq!(r1.len(), 2);
    assert!(r2.is_empty());
    assert_eq!(discoverer.limits_seen(), vec![10, 10, 10]);
}

#[tokio::test]
async fn thread_discoverer_writes_results_file_when_asked() {
    let discoverer = FakeThreadDiscoverer::new(vec![vec![post("a")]]);
    discoverer.write_results_file();
    let cancel = CancellationToken::new();
    let dir = tempdir().unwrap();
    let form = Form::test_single("destination");

    discoverer
        .discover_threads(&form, "q", &["travel".to_string()], 5, dir.path(), &cancel)
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("discovery_results.json")).unwrap();
    let result: DiscoveryResult = serde_json::from_str(&raw).unwrap();
    assert_eq!(result.posts.len(), 1);
    assert_eq!(result.search_log[0].results, 1);
}

#[tokio::test]
async fn evaluator_keep_with_thread_persists_both_files() {
    let evaluator = FakeEvaluator::new();
    evaluator.keep_with_thread("abc", thread("abc"), 3);
    let cancel = CancellationToken::new();
    let dir = tempdir().unwrap();
    let form = Form::test_single("destination");

    let result = evaluator
        .evaluate_thread(&form, &thread_state("abc"), dir.path(), &cancel)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Keep);
    assert!(result.thread_saved);
    assert_eq!(result.estimated_entries, 3);
    assert!(dir.path().join("thread_abc.json").exists());
    assert!(dir.path().join("eval_abc.json").exists());
}

#[tokio::test]
async fn evaluator_skip_and_retry_scripts() {
    let evaluator = FakeEvaluator::new();
    evaluator.fail_once("abc", "agent crashed");
    evaluator.skip("abc", "not a recommendation thread");
    let cancel = CancellationToken::new();
    let dir = tempdir().unwrap();
    let form = Form::test_single("destination");
    let ts = thread_state("abc");

    let err = evaluator
        .evaluate_thread(&form, &ts, dir.path(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Agent(_)));

    let result = evaluator
        .evaluate_thread(&form, &ts, dir.path(), &cancel)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Skip);
    assert_eq!(result.reason, "not a recommendation thread");
    assert_eq!(evaluator.attempts("abc"), 2);
}

#[tokio::test]
async fn evaluator_defaults_to_keep_unsaved() {
    let evaluator = FakeEvaluator::new();
    let cancel = CancellationToken::new();
    let dir = tempdir().unwrap();
    let form = Form::test_single("destination");

    let result = evaluator
        .evaluate_thread(&form, &thread_state("xyz"), dir.path(), &cancel)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Keep);
    assert!(!result.thread_saved);
}

#[tokio::test]
async fn extractor_default_answers_primary_with_title() {
    let extractor = FakeExtractor::new();
    let cancel = CancellationToken::new();
    let form = Form::test_single("destination");

    let result = extractor
        .extract_fields(&thread("abc"), &form, &cancel)
        .await
        .unwrap();
    assert_eq!(result.entries.len(), 1);
    let fv = &result.entries[0].fields[0];
    assert_eq!(fv.id, "destination");
    assert_eq!(fv.value, Value::String("Post abc".to_string()));
    assert_eq!(extractor.calls(), vec!["abc".to_string()]);
}

#[tokio::test]
async fn extractor_failure_injection() {
    let extractor = FakeExtractor::new();
    extractor.fail("abc", "model refused");
    let cancel = CancellationToken::new();
    let form = Form::test_single("destination");

    let err = extractor
        .extract_fields(&thread("abc"), &form, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Agent(_)));
}

#[tokio::test]
async fn ranker_records_inputs_and_returns_script() {
    let ranker = FakeRanker::new(vec![RankAssessment {
        index: 0,
        flags: vec![gleaner_core::RankFlag::Spam],
        penalty: -20.0,
        reason: Some("promotional".to_string()),
    }]);
    let cancel = CancellationToken::new();
    let form = Form::test_single("destination");
    let inputs = vec![RankInput {
        index: 0,
        algo_score: 75.0,
        fields: vec![RankFieldValue {
            id: "destination".to_string(),
            value: Value::String("Banff".to_string()),
            confidence: 0.9,
        }],
    }];

    let out = ranker.rank_entries(&form, &inputs, &cancel).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(ranker.inputs_seen().len(), 1);

    ranker.fail("quota exhausted");
    let err = ranker.rank_entries(&form, &inputs, &cancel).await.unwrap_err();
    assert!(matches!(err, AdapterError::Agent(_)));
}
