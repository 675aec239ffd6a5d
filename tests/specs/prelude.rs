// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the behavioral specs.

use gleaner_adapters::{
    FakeEvaluator, FakeExtractor, FakeRanker, FakeSearcher, FakeSubredditDiscoverer,
    FakeThreadDiscoverer,
};
use gleaner_core::{Post, Thread};
use gleaner_engine::{RunConfig, RunDeps};
use std::sync::Arc;
use tempfile::TempDir;

pub const VACATION_FORM: &str = r#"{
    "title": "Family vacation ideas",
    "search_hints": ["family vacation"],
    "fields": [
        {"id": "destination", "type": "string", "question": "What destination?", "required": true},
        {"id": "activities", "type": "array", "question": "What activities?"}
    ]
}"#;

pub fn post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        title: format!("Trip report {}", id),
        permalink: format!("/r/travel/comments/{}/trip/", id),
        subreddit: "travel".to_string(),
        score: 80,
        num_comments: 25,
        reason: None,
    }
}

pub fn thread_for(p: &Post) -> Thread {
    Thread {
        id: p.id.clone(),
        title: p.title.clone(),
        permalink: p.permalink.clone(),
        subreddit: p.subreddit.clone(),
        score: p.score,
        num_comments: p.num_comments,
        selftext: String::new(),
        comments: Vec::new(),
    }
}

/// A full collaborator set plus its handles for scripting.
pub struct World {
    pub deps: RunDeps,
    pub config: RunConfig,
    pub searcher: FakeSearcher,
    pub evaluator: FakeEvaluator,
    pub extractor: FakeExtractor,
    pub ranker: FakeRanker,
    pub out: TempDir,
}

impl World {
    /// Collaborators for a run whose discoverer serves `rounds` and whose
    /// searcher can fetch every mentioned thread.
    pub fn new(rounds: Vec<Vec<Post>>, target: usize) -> Self {
        let out = TempDir::new().unwrap();
        let form_path = out.path().join("form.json");
        std::fs::write(&form_path, VACATION_FORM).unwrap();

        let searcher = FakeSearcher::new();
        for round in &rounds {
            for p in round {
                searcher.set_thread(thread_for(p));
            }
        }
        let evaluator = FakeEvaluator::new();
        let extractor = FakeExtractor::new();
        let ranker = FakeRanker::new(Vec::new());

        let deps = RunDeps {
            searcher: Arc::new(searcher.clone()),
            subreddit_discoverer: Some(Arc::new(FakeSubredditDiscoverer::new(vec![
                "travel".to_string(),
                "familytravel".to_string(),
                "solotravel".to_string(),
            ]))),
            thread_discoverer: Some(Arc::new(FakeThreadDiscoverer::new(rounds))),
            evaluator: Some(Arc::new(evaluator.clone())),
            extractor: Arc::new(extractor.clone()),
            ranker: Some(Arc::new(ranker.clone())),
        };

        let mut config = RunConfig::new(&form_path, out.path().join("sessions"));
        config.query = "family vacation".to_string();
        config.target_entries = target;
        config.workers = Some(4);

        Self {
            deps,
            config,
            searcher,
            evaluator,
            extractor,
            ranker,
            out,
        }
    }

    /// SHA-256 of the fixture form, matching what the engine records.
    pub fn form_hash() -> String {
        use sha2::{Digest, Sha256};
        format!("{:x}", Sha256::digest(VACATION_FORM.as_bytes()))
    }
}
