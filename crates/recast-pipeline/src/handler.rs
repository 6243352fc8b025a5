// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry points for callers and the messaging channel.
//!
//! [`MessageHandler::dispatch`] is the only boundary where requests arrive
//! from outside; every failure behind it is turned into an error envelope.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tracing::{info, warn};
use uuid::Uuid;

use recast_config::RecastConfig;
use recast_core::{MediaElement, ProcessingResult, QueuedMessage, RecastError, Request, Response};

use crate::exclusion::ExclusionListManager;
use crate::media::{MediaHandler, MediaReferenceAnalyzer};
use crate::parser::MessageParser;
use crate::processor::{KeywordExclusionChecker, MessageProcessor};
use crate::queue::MessageQueue;

/// Actions accepted over the messaging channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Action {
    /// Process one message: `{message}`.
    GetMessageData,
    /// Process many messages: `{messages: [...]}`.
    ProcessBatch,
    /// `{messageId}`.
    GetExclusionList,
    /// `{messageId, buyers: [...]}`.
    UpdateExclusionList,
    /// `{messageId, text, candidates: [...]}`.
    InitiateRecycle,
    QueueStatus,
}

/// A recycled message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycleJob {
    pub job_id: String,
    pub message_id: String,
    pub text: String,
    /// Candidates not on the message's exclusion list, in candidate order.
    pub recipients: Vec<String>,
    pub excluded_count: usize,
    pub media: Vec<MediaElement>,
    pub processing: ProcessingResult,
    /// RFC 3339 creation time.
    pub created_at: String,
}

/// Build the processor used by [`MessageHandler`] from configuration.
///
/// The keyword checker is only attached when blocked keywords are configured.
pub fn default_processor(config: &RecastConfig) -> Result<MessageProcessor, RecastError> {
    let mut builder = MessageProcessor::builder()
        .parser(Arc::new(MessageParser::from_config(&config.parser)?))
        .media_analyzer(Arc::new(MediaReferenceAnalyzer));

    let checker = KeywordExclusionChecker::from_config(&config.processor);
    if !checker.is_empty() {
        builder = builder.exclusion_checker(Arc::new(checker));
    }
    builder.build()
}

pub struct MessageHandler {
    processor: MessageProcessor,
    exclusions: Arc<ExclusionListManager>,
    media: Arc<MediaHandler>,
    queue: Arc<MessageQueue>,
}

impl MessageHandler {
    pub fn new(
        processor: MessageProcessor,
        exclusions: Arc<ExclusionListManager>,
        media: Arc<MediaHandler>,
        queue: Arc<MessageQueue>,
    ) -> Self {
        Self {
            processor,
            exclusions,
            media,
            queue,
        }
    }

    pub async fn handle_message(&self, message: &Value) -> Result<ProcessingResult, RecastError> {
        self.processor.process(message).await
    }

    pub async fn handle_batch(&self, messages: &Value) -> Result<Vec<ProcessingResult>, RecastError> {
        self.processor.process_batch(messages).await
    }

    /// Build a recycle job for `message_id` and enqueue it.
    ///
    /// Fails if the processor marks the text as excluded. Media that cannot
    /// be obtained leaves the job without media. Returns the job and whether
    /// it was queued.
    pub async fn initiate_recycle(
        &self,
        message_id: &str,
        text: &str,
        candidates: &[String],
    ) -> Result<(RecycleJob, bool), RecastError> {
        let processing = self.processor.process_text(text).await?;
        if processing.excluded {
            return Err(RecastError::InvalidRequest(format!(
                "message {message_id} is excluded from recycling"
            )));
        }

        let recipients = self.exclusions.filter_recipients(message_id, candidates).await;
        let media = self
            .media
            .get_media_elements(message_id)
            .await
            .unwrap_or_else(|e| {
                warn!(message_id, error = %e, "recycling without media");
                Vec::new()
            });

        let job = RecycleJob {
            job_id: Uuid::new_v4().to_string(),
            message_id: message_id.to_string(),
            text: text.to_string(),
            excluded_count: candidates.len() - recipients.len(),
            recipients,
            media,
            processing,
            created_at: Utc::now().to_rfc3339(),
        };

        let queued = self
            .queue
            .enqueue(QueuedMessage::new(job.job_id.clone(), serde_json::to_value(&job)?))
            .await;
        info!(
            message_id,
            job_id = %job.job_id,
            recipients = job.recipients.len(),
            excluded = job.excluded_count,
            queued,
            "recycle job created"
        );
        Ok((job, queued))
    }

    /// Answer one messaging-channel request. Never fails.
    pub async fn dispatch(&self, request: Request) -> Response {
        let request_id = request.request_id.clone();
        match self.route(&request).await {
            Ok(data) => Response::success(data, request_id),
            Err(e) => {
                warn!(action = %request.action, source = %request.source, error = %e, "request failed");
                Response::error(e.to_string(), request_id)
            }
        }
    }

    async fn route(&self, request: &Request) -> Result<Value, RecastError> {
        let action = Action::from_str(&request.action).map_err(|_| {
            RecastError::InvalidRequest(format!("unknown action `{}`", request.action))
        })?;
        let payload = request.payload.as_ref().unwrap_or(&Value::Null);

        match action {
            Action::GetMessageData => {
                let message = payload.get("message").unwrap_or(&Value::Null);
                Ok(serde_json::to_value(self.handle_message(message).await?)?)
            }
            Action::ProcessBatch => {
                let messages = payload.get("messages").unwrap_or(&Value::Null);
                Ok(serde_json::to_value(self.handle_batch(messages).await?)?)
            }
            Action::GetExclusionList => {
                let message_id = required_str(payload, "messageId")?;
                let list = self.exclusions.get_or_create_list(message_id).await;
                Ok(json!({ "messageId": message_id, "exclusionList": list }))
            }
            Action::UpdateExclusionList => {
                let message_id = required_str(payload, "messageId")?;
                let buyers = payload.get("buyers").unwrap_or(&Value::Null);
                let list = self.exclusions.update_list_from_value(message_id, buyers).await;
                Ok(json!({ "messageId": message_id, "exclusionList": list }))
            }
            Action::InitiateRecycle => {
                let message_id = required_str(payload, "messageId")?;
                let text = required_str(payload, "text")?;
                let candidates = string_array(payload, "candidates")?;
                let (job, queued) = self.initiate_recycle(message_id, text, &candidates).await?;
                Ok(json!({ "job": job, "queued": queued }))
            }
            Action::QueueStatus => {
                let head = self.queue.peek().await.map(|m| m.id);
                Ok(json!({
                    "size": self.queue.size().await,
                    "retryLimit": self.queue.retry_limit(),
                    "head": head,
                }))
            }
        }
    }
}

fn required_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, RecastError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| RecastError::InvalidRequest(format!("missing string field `{field}`")))
}

/// An optional array of strings; absent means empty.
fn string_array(payload: &Value, field: &str) -> Result<Vec<String>, RecastError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
            RecastError::InvalidRequest(format!("field `{field}` must be an array of strings"))
        }),
    }
}
