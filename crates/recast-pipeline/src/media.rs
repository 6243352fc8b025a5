// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media extraction and re-insertion.
//!
//! The handler fetches the original message, parses its media descriptors
//! (JSON or HTML markup), caches them per message and inserts them one at a
//! time into a new message container. A descriptor that fails validation or
//! attachment yields a fallback placeholder; it never aborts its siblings.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use recast_config::model::MediaConfig;
use recast_core::{
    InsertionResult, KeyValueStore, MediaAnalyzer, MediaContainer, MediaElement, MediaKind,
    MessageFetcher, RecastError, RenderedElement,
};

/// Error text for a descriptor without a source.
pub const MISSING_SOURCE: &str = "Media source URL missing";

const FALLBACK_CLASS: &str = "recast-media-fallback";
const PLACEHOLDER_CLASS: &str = "recast-media-placeholder";

/// Attributes carried into [`MediaElement::metadata`] when scanning markup.
const METADATA_ATTRIBUTES: &[&str] = &["poster", "width", "height"];

/// Opening `img`/`video`/`source` tags and closing `video` tags.
static MEDIA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*(/?)\s*(img|video|source)\b([^>]*)>").expect("media tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern is valid")
});

/// Fails with [`MISSING_SOURCE`] when the descriptor has an empty `src`.
pub fn validate_media_availability(element: &MediaElement) -> Result<(), RecastError> {
    if element.src.is_empty() {
        return Err(RecastError::MediaUnavailable(MISSING_SOURCE.to_string()));
    }
    Ok(())
}

/// Build the element inserted for `media`.
///
/// Images and videos render as `img`/`video`; any other kind becomes a
/// placeholder `div` rather than an error.
pub fn render_element(media: &MediaElement, marker_class: &str) -> RenderedElement {
    let rendered = match &media.kind {
        MediaKind::Image => {
            let img = RenderedElement::new("img").with_attribute("src", &media.src);
            match &media.alt {
                Some(alt) => img.with_attribute("alt", alt),
                None => img,
            }
        }
        MediaKind::Video => RenderedElement::new("video")
            .with_attribute("src", &media.src)
            .with_attribute("controls", "controls"),
        MediaKind::Other(kind) => RenderedElement::new("div")
            .with_class(PLACEHOLDER_CLASS)
            .with_attribute("data-src", &media.src)
            .with_attribute("data-type", kind)
            .with_text(format!("[Media: {kind}]")),
    };
    let rendered = rendered.with_class(marker_class);
    match &media.id {
        Some(id) => rendered.with_attribute("data-media-id", id),
        None => rendered,
    }
}

/// Placeholder shown in place of a descriptor that could not be inserted.
pub fn fallback_element(media: &MediaElement, marker_class: &str) -> RenderedElement {
    RenderedElement::new("div")
        .with_class(marker_class)
        .with_class(FALLBACK_CLASS)
        .with_text(format!("[Media unavailable: {}]", media.kind))
}

/// Parse raw message content into media descriptors.
///
/// JSON content is either an array of descriptors or an object with a
/// `media` array. Anything that is not JSON is scanned as HTML markup.
pub fn parse_media_content(raw: &str) -> Result<Vec<MediaElement>, RecastError> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Array(items)) => Ok(serde_json::from_value(Value::Array(items))?),
        Ok(Value::Object(mut object)) => match object.remove("media") {
            Some(media @ Value::Array(_)) => Ok(serde_json::from_value(media)?),
            Some(other) => Err(RecastError::invalid_type("array", &other)),
            None => Ok(Vec::new()),
        },
        Ok(_) => Ok(Vec::new()),
        Err(_) => Ok(scan_markup(raw)),
    }
}

fn scan_markup(html: &str) -> Vec<MediaElement> {
    let mut found = Vec::new();
    let mut open_video: Option<MediaElement> = None;

    for tag in MEDIA_TAG.captures_iter(html) {
        let closing = !tag[1].is_empty();
        let name = tag[2].to_ascii_lowercase();
        let attributes = parse_attributes(&tag[3]);

        match (name.as_str(), closing) {
            ("video", true) => found.extend(open_video.take()),
            (_, true) => {}
            ("img", false) => found.push(element_from_attributes(MediaKind::Image, &attributes)),
            ("video", false) => {
                found.extend(open_video.take());
                open_video = Some(element_from_attributes(MediaKind::Video, &attributes));
            }
            ("source", false) => {
                if let (Some(video), Some(src)) = (open_video.as_mut(), attributes.get("src")) {
                    if video.src.is_empty() {
                        video.src = src.clone();
                    }
                }
            }
            _ => {}
        }
    }
    found.extend(open_video);
    found
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|cap| {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (cap[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn element_from_attributes(kind: MediaKind, attributes: &HashMap<String, String>) -> MediaElement {
    let metadata: Map<String, Value> = METADATA_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            attributes
                .get(*name)
                .map(|value| (name.to_string(), Value::String(value.clone())))
        })
        .collect();

    MediaElement {
        id: attributes.get("id").cloned(),
        kind,
        src: attributes.get("src").cloned().unwrap_or_default(),
        alt: attributes.get("alt").cloned(),
        metadata: (!metadata.is_empty()).then_some(Value::Object(metadata)),
    }
}

/// Extracts, caches and re-inserts the media of previously sent messages.
pub struct MediaHandler {
    fetcher: Arc<dyn MessageFetcher>,
    store: Option<Arc<dyn KeyValueStore>>,
    key_prefix: String,
    persist_cache: bool,
    marker_class: String,
    cache: RwLock<HashMap<String, Vec<MediaElement>>>,
}

impl MediaHandler {
    pub fn new(fetcher: Arc<dyn MessageFetcher>, config: &MediaConfig) -> Self {
        Self {
            fetcher,
            store: None,
            key_prefix: config.key_prefix.clone(),
            persist_cache: config.persist_cache,
            marker_class: config.marker_class.clone(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Persist extracted descriptors to `store` when `persist_cache` is enabled.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    fn persistent_store(&self) -> Option<&Arc<dyn KeyValueStore>> {
        self.store.as_ref().filter(|_| self.persist_cache)
    }

    fn storage_key(&self, message_id: &str) -> String {
        format!("{}{message_id}", self.key_prefix)
    }

    /// Fetch and parse the media of `message_id`, replacing any cached entry.
    pub async fn extract_media_from_message(
        &self,
        message_id: &str,
    ) -> Result<Vec<MediaElement>, RecastError> {
        let raw = self.fetcher.fetch_original_message(message_id).await?;
        let elements = parse_media_content(&raw)?;
        debug!(message_id, count = elements.len(), "media extracted");

        self.cache
            .write()
            .await
            .insert(message_id.to_string(), elements.clone());

        if let Some(store) = self.persistent_store() {
            let entries = serde_json::to_string(&elements)
                .map(|raw| HashMap::from([(self.storage_key(message_id), raw)]));
            let result = match entries {
                Ok(entries) => store.set(entries).await,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                warn!(message_id, error = %e, "failed to persist media cache");
            }
        }
        Ok(elements)
    }

    /// Cached descriptors for `message_id`, extracting them on a miss.
    pub async fn get_media_elements(
        &self,
        message_id: &str,
    ) -> Result<Vec<MediaElement>, RecastError> {
        if let Some(elements) = self.cache.read().await.get(message_id) {
            return Ok(elements.clone());
        }
        if let Some(elements) = self.load_persisted(message_id).await {
            self.cache
                .write()
                .await
                .insert(message_id.to_string(), elements.clone());
            return Ok(elements);
        }
        self.extract_media_from_message(message_id).await
    }

    async fn load_persisted(&self, message_id: &str) -> Option<Vec<MediaElement>> {
        let store = self.persistent_store()?;
        let key = self.storage_key(message_id);
        let raw = match store.get(&[key.as_str()]).await {
            Ok(mut found) => found.remove(&key)?,
            Err(e) => {
                warn!(message_id, error = %e, "failed to read media cache");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(elements) => Some(elements),
            Err(e) => {
                warn!(message_id, error = %e, "stored media cache is malformed, re-extracting");
                None
            }
        }
    }

    /// Insert every media descriptor of `message_id` into `container`.
    ///
    /// Insertions run one after another in descriptor order and the results
    /// keep that order. If the descriptors cannot be obtained the error is
    /// logged and no insertion is attempted.
    pub async fn insert_media_into_new_message(
        &self,
        message_id: &str,
        container: &dyn MediaContainer,
    ) -> Vec<InsertionResult> {
        let elements = match self.get_media_elements(message_id).await {
            Ok(elements) => elements,
            Err(e) => {
                error!(message_id, error = %e, "cannot insert media");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(elements.len());
        for element in &elements {
            results.push(self.insert_one(message_id, element, container).await);
        }

        let inserted = results.iter().filter(|r| r.is_success()).count();
        info!(message_id, inserted, failed = results.len() - inserted, "media inserted");
        results
    }

    async fn insert_one(
        &self,
        message_id: &str,
        media: &MediaElement,
        container: &dyn MediaContainer,
    ) -> InsertionResult {
        let attempt = async {
            validate_media_availability(media)?;
            let element = render_element(media, &self.marker_class);
            container.append_child(element.clone()).await?;
            Ok::<_, RecastError>(element)
        };

        match attempt.await {
            Ok(element) => InsertionResult::Inserted { element },
            Err(e) => {
                warn!(message_id, kind = %media.kind, src = %media.src, error = %e, "media insertion failed");
                InsertionResult::Failed {
                    error: e.to_string(),
                    fallback: fallback_element(media, &self.marker_class),
                }
            }
        }
    }
}

/// Counts the media references a message carries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaReferenceAnalyzer;

#[async_trait]
impl MediaAnalyzer for MediaReferenceAnalyzer {
    async fn analyze(&self, message: &str) -> Result<Value, RecastError> {
        let elements = parse_media_content(message).unwrap_or_else(|e| {
            warn!(error = %e, "message looks like media JSON but does not parse, counting none");
            Vec::new()
        });

        let (mut images, mut videos, mut others) = (0usize, 0usize, 0usize);
        for element in &elements {
            match element.kind {
                MediaKind::Image => images += 1,
                MediaKind::Video => videos += 1,
                MediaKind::Other(_) => others += 1,
            }
        }
        Ok(json!({
            "total": elements.len(),
            "images": images,
            "videos": videos,
            "others": others,
        }))
    }
}
