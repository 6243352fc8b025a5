// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Recast message-recycling pipeline.
//!
//! - [`ExclusionListManager`] keeps per-message lists of prior purchasers.
//! - [`MediaHandler`] re-extracts media and inserts it into a new message.
//! - [`MessageParser`] and [`MessageProcessor`] turn text into tokens and
//!   exclusion/media verdicts.
//! - [`MessageQueue`] holds outbound jobs with bounded retries.
//! - [`MessageHandler`] is the entry point, including messaging-channel dispatch.
//! - [`RecastContext`] builds all of the above from configuration.

pub mod context;
pub mod exclusion;
pub mod handler;
pub mod media;
pub mod parser;
pub mod processor;
pub mod queue;

pub use context::RecastContext;
pub use exclusion::{merge_and_deduplicate, ExclusionListManager};
pub use handler::{default_processor, Action, MessageHandler, RecycleJob};
pub use media::{validate_media_availability, MediaHandler, MediaReferenceAnalyzer};
pub use parser::MessageParser;
pub use processor::{KeywordExclusionChecker, MessageProcessor, ProcessorOptions};
pub use queue::{DropHook, MessageQueue, RetryOutcome};
