// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message source backed by a directory of exported messages.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use recast_core::{MessageFetcher, RecastError};

/// File extensions tried in order for `<dir>/<message_id>.<ext>`.
const EXTENSIONS: &[&str] = &["json", "html"];

/// Reads `<dir>/<message_id>.json`, falling back to `<dir>/<message_id>.html`.
pub struct DirectoryFetcher {
    dir: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn fetch_error(message_id: &str, message: String) -> RecastError {
    RecastError::Fetch {
        message_id: message_id.to_string(),
        message,
        source: None,
    }
}

#[async_trait]
impl MessageFetcher for DirectoryFetcher {
    async fn fetch_original_message(&self, message_id: &str) -> Result<String, RecastError> {
        if message_id.is_empty()
            || message_id.contains(['/', '\\'])
            || message_id.starts_with('.')
        {
            return Err(fetch_error(message_id, "invalid message id".into()));
        }

        for ext in EXTENSIONS {
            let path = self.dir.join(format!("{message_id}.{ext}"));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    debug!(path = %path.display(), "message read");
                    return Ok(content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(RecastError::Fetch {
                        message_id: message_id.to_string(),
                        message: format!("cannot read {}", path.display()),
                        source: Some(Box::new(e)),
                    });
                }
            }
        }
        Err(fetch_error(
            message_id,
            format!("no {message_id}.json or {message_id}.html in {}", self.dir.display()),
        ))
    }
}
