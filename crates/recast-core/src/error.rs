// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recast pipeline.

use thiserror::Error;

/// The primary error type used across all Recast collaborator traits and managers.
#[derive(Debug, Error)]
pub enum RecastError {
    /// Configuration errors (missing collaborator, invalid pattern, bad TOML).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value store failures (unavailable backend, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A value crossing the messaging boundary had the wrong shape.
    #[error("type error: expected {expected}, found {found}")]
    InvalidType {
        expected: &'static str,
        found: String,
    },

    /// A messaging-channel request named an unknown action or lacked a field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A media descriptor failed availability validation.
    #[error("{0}")]
    MediaUnavailable(String),

    /// The original message could not be fetched.
    #[error("failed to fetch message {message_id}: {message}")]
    Fetch {
        message_id: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A rendered element could not be attached to its container.
    #[error("insertion error: {0}")]
    Insertion(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecastError {
    /// Build an [`RecastError::InvalidType`] describing the JSON value actually received.
    pub fn invalid_type(expected: &'static str, found: &serde_json::Value) -> Self {
        RecastError::InvalidType {
            expected,
            found: crate::types::json_type_name(found).to_string(),
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RecastError::Storage {
            source: Box::new(err),
        }
    }
}
