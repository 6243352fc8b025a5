// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recast message-recycling pipeline.
//!
//! This crate provides the error type, the shared data model (media
//! descriptors, processing results, queued jobs, messaging envelopes) and the
//! collaborator traits the pipeline managers are written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RecastError;
pub use types::{
    ExclusionList, HealthStatus, InsertionResult, MediaElement, MediaKind, ProcessingResult,
    QueuedMessage, RenderedElement, Request, Response, ResponseStatus, TaggedToken,
};

pub use traits::{
    ExclusionChecker, KeyValueStore, MediaAnalyzer, MediaContainer, MessageFetcher, TokenFilter,
    TokenParser,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recast_error_displays_media_message_verbatim() {
        let err = RecastError::MediaUnavailable("Media source URL missing".into());
        assert_eq!(err.to_string(), "Media source URL missing");
    }

    #[test]
    fn invalid_type_names_the_json_type() {
        let err = RecastError::invalid_type("string", &json!(null));
        assert_eq!(err.to_string(), "type error: expected string, found null");

        let err = RecastError::invalid_type("array", &json!("not-an-array"));
        assert_eq!(err.to_string(), "type error: expected array, found string");
    }

    #[test]
    fn invalid_request_display() {
        let err = RecastError::InvalidRequest("unknown action `ping`".into());
        assert_eq!(err.to_string(), "invalid request: unknown action `ping`");
    }

    #[test]
    fn media_kind_keeps_unknown_types() {
        let element: MediaElement =
            serde_json::from_value(json!({"type": "audio", "src": "a.mp3"})).unwrap();
        assert_eq!(element.kind, MediaKind::Other("audio".into()));
        assert_eq!(element.kind.to_string(), "audio");

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "audio");
    }

    #[test]
    fn media_element_without_src_deserializes_empty() {
        let element: MediaElement = serde_json::from_value(json!({"type": "image"})).unwrap();
        assert_eq!(element.kind, MediaKind::Image);
        assert!(element.src.is_empty());
    }

    #[test]
    fn processing_result_uses_camel_case() {
        let result = ProcessingResult {
            tokens: vec!["hi".into()],
            excluded: false,
            media_analysis: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"tokens": ["hi"], "excluded": false, "mediaAnalysis": null}));
    }

    #[test]
    fn queued_message_defaults_retry_count() {
        let msg: QueuedMessage = serde_json::from_value(json!({"id": "a", "payload": 1})).unwrap();
        assert_eq!(msg.retry_count, 0);
        let value = serde_json::to_value(QueuedMessage { retry_count: 2, ..msg }).unwrap();
        assert_eq!(value["retryCount"], 2);
    }

    #[test]
    fn error_envelope_shape() {
        let resp = Response::error("boom", Some("r1".into()));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"status": "error", "error": "boom", "requestId": "r1"}));
    }

    #[test]
    fn closures_are_token_filters() {
        let drop_short = |tokens: Vec<String>| -> Vec<String> {
            tokens.into_iter().filter(|t| t.len() > 2).collect()
        };
        let filtered = TokenFilter::filter(&drop_short, vec!["a".into(), "abc".into()]);
        assert_eq!(filtered, vec!["abc".to_string()]);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_store<T: KeyValueStore>() {}
        fn _assert_fetcher<T: MessageFetcher>() {}
        fn _assert_container<T: MediaContainer>() {}
        fn _assert_parser<T: TokenParser>() {}
        fn _assert_checker<T: ExclusionChecker>() {}
        fn _assert_analyzer<T: MediaAnalyzer>() {}
    }
}
