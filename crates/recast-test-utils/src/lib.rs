// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recast tests.
//!
//! Provides collaborator doubles for fast, deterministic tests without a
//! real browser or database.
//!
//! # Components
//!
//! - [`FlakyStore`] - In-memory store with call counters and failure switches
//! - [`MockFetcher`] - Message source with canned content
//! - [`RecordingContainer`] - Insertion target that captures appended elements

pub mod container;
pub mod fetcher;
pub mod store;

pub use container::RecordingContainer;
pub use fetcher::MockFetcher;
pub use store::FlakyStore;
