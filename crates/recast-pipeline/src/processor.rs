// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message processing pipeline.
//!
//! Stage order is fixed: parse, filter, exclusion check, media analysis.
//! Missing optional stages fall back to neutral defaults (unfiltered tokens,
//! `excluded = false`, no media analysis).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use recast_config::model::ProcessorConfig;
use recast_core::{
    ExclusionChecker, MediaAnalyzer, ProcessingResult, RecastError, TokenFilter, TokenParser,
};

/// Optional pipeline stages.
#[derive(Clone, Default)]
pub struct ProcessorOptions {
    pub filter: Option<Arc<dyn TokenFilter>>,
    pub exclusion_checker: Option<Arc<dyn ExclusionChecker>>,
    pub media_analyzer: Option<Arc<dyn MediaAnalyzer>>,
}

/// Runs messages through the parser and the optional stages.
pub struct MessageProcessor {
    parser: Arc<dyn TokenParser>,
    options: ProcessorOptions,
}

impl MessageProcessor {
    pub fn new(parser: Arc<dyn TokenParser>, options: ProcessorOptions) -> Self {
        Self { parser, options }
    }

    pub fn builder() -> MessageProcessorBuilder {
        MessageProcessorBuilder::default()
    }

    /// Process one untyped message; anything but a string is a type error.
    pub async fn process(&self, message: &Value) -> Result<ProcessingResult, RecastError> {
        let text = message
            .as_str()
            .ok_or_else(|| RecastError::invalid_type("string", message))?;
        self.process_text(text).await
    }

    pub async fn process_text(&self, text: &str) -> Result<ProcessingResult, RecastError> {
        let tokens = self.parser.parse(text);
        let tokens = match &self.options.filter {
            Some(filter) => filter.filter(tokens),
            None => tokens,
        };

        let excluded = match &self.options.exclusion_checker {
            Some(checker) => checker.is_excluded(text, &tokens).await?,
            None => false,
        };

        let media_analysis = match &self.options.media_analyzer {
            Some(analyzer) => Some(analyzer.analyze(text).await?),
            None => None,
        };

        debug!(tokens = tokens.len(), excluded, "message processed");
        Ok(ProcessingResult {
            tokens,
            excluded,
            media_analysis,
        })
    }

    /// Process every entry of an array concurrently.
    ///
    /// Results line up one-to-one with the input. The first failing entry
    /// fails the whole batch.
    pub async fn process_batch(&self, messages: &Value) -> Result<Vec<ProcessingResult>, RecastError> {
        let entries = messages
            .as_array()
            .ok_or_else(|| RecastError::invalid_type("array", messages))?;
        try_join_all(entries.iter().map(|entry| self.process(entry))).await
    }
}

/// Builder for [`MessageProcessor`]; the parser is mandatory.
#[derive(Default)]
pub struct MessageProcessorBuilder {
    parser: Option<Arc<dyn TokenParser>>,
    options: ProcessorOptions,
}

impl MessageProcessorBuilder {
    pub fn parser(mut self, parser: Arc<dyn TokenParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn filter(mut self, filter: Arc<dyn TokenFilter>) -> Self {
        self.options.filter = Some(filter);
        self
    }

    pub fn exclusion_checker(mut self, checker: Arc<dyn ExclusionChecker>) -> Self {
        self.options.exclusion_checker = Some(checker);
        self
    }

    pub fn media_analyzer(mut self, analyzer: Arc<dyn MediaAnalyzer>) -> Self {
        self.options.media_analyzer = Some(analyzer);
        self
    }

    pub fn build(self) -> Result<MessageProcessor, RecastError> {
        let parser = self
            .parser
            .ok_or_else(|| RecastError::Config("message processor requires a parser".into()))?;
        Ok(MessageProcessor::new(parser, self.options))
    }
}

/// Excludes a message when any of its tokens is a blocked keyword.
#[derive(Debug, Clone, Default)]
pub struct KeywordExclusionChecker {
    keywords: HashSet<String>,
}

impl KeywordExclusionChecker {
    /// Keywords are lowercased to match normalized tokens.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(&config.blocked_keywords)
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[async_trait]
impl ExclusionChecker for KeywordExclusionChecker {
    async fn is_excluded(&self, _message: &str, tokens: &[String]) -> Result<bool, RecastError> {
        Ok(tokens.iter().any(|t| self.keywords.contains(t)))
    }
}
