// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gleaner-storage: session directory layout and crash-safe manifest store

mod extraction_log;
mod layout;
mod store;

pub use extraction_log::ExtractionLog;
pub use layout::SessionLayout;
pub use store::{load_manifest, save_manifest, StorageError};
