// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identity: directory resolution and create-or-resume.

use crate::config::RunConfig;
use crate::error::EngineError;
use gleaner_core::{slug, subreddit, Clock, Form, FormRef, Manifest};
use gleaner_storage::{load_manifest, save_manifest, SessionLayout};
use sha2::{Digest, Sha256};

/// SHA-256 of the form's raw content, hex encoded.
pub(crate) fn form_hash(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    format!("{:x}", digest)
}

#[derive(Debug)]
pub(crate) struct OpenedSession {
    pub layout: SessionLayout,
    pub manifest: Manifest,
    pub resumed: bool,
}

/// Resolve the session directory and load or create its manifest.
///
/// The directory is the explicit `session_dir` when given, else
/// `<output>/<slug>-<timestamp>` derived from the query (or first
/// subreddit). An existing manifest at the target path is resumed; its
/// form hash must match the current form content.
pub(crate) fn open_session<C: Clock>(
    config: &RunConfig,
    form: &Form,
    form_raw: &str,
    query: &str,
    clock: &C,
) -> Result<OpenedSession, EngineError> {
    let explicit_subs = subreddit::normalize_all(&config.subreddits);
    let dir = match &config.session_dir {
        Some(dir) => dir.clone(),
        None => config
            .output_dir
            .join(slug::session_dir_name(query, &explicit_subs, clock.now_utc())),
    };
    let layout = SessionLayout::new(dir);
    let hash = form_hash(form_raw);

    if let Some(manifest) = load_manifest(&layout)? {
        if manifest.form.hash != hash {
            return Err(EngineError::FormChanged);
        }
        tracing::info!(
            session = %layout.dir().display(),
            threads = manifest.threads.len(),
            "resuming session"
        );
        return Ok(OpenedSession {
            layout,
            manifest,
            resumed: true,
        });
    }

    let form_ref = FormRef {
        title: form.title.clone(),
        path: config.form_path.display().to_string(),
        hash,
    };
    let mut manifest = Manifest::new(form_ref, query, clock.now_utc());
    manifest.subreddits = explicit_subs;

    layout.ensure_dir()?;
    save_manifest(&layout, &manifest)?;
    tracing::info!(session = %layout.dir().display(), "created session");

    Ok(OpenedSession {
        layout,
        manifest,
        resumed: false,
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
