// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The managers in `recast-pipeline` depend only on these traits, so the
//! storage backend, the message source and the insertion target can be
//! swapped without touching pipeline code. Async traits use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod container;
pub mod fetcher;
pub mod processing;
pub mod store;

pub use container::MediaContainer;
pub use fetcher::MessageFetcher;
pub use processing::{ExclusionChecker, MediaAnalyzer, TokenFilter, TokenParser};
pub use store::KeyValueStore;
