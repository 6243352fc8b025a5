// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message text normalization and tokenization.
//!
//! Text is trimmed, lowercased and stripped of punctuation, then split into
//! tokens by a configurable pattern. Tokens on the exclusion-token list are
//! dropped. An empty token list is a valid result.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use recast_config::model::ParserConfig;
use recast_core::types::json_type_name;
use recast_core::{RecastError, TaggedToken, TokenParser};

/// Default token pattern: maximal runs of word characters.
pub const DEFAULT_PATTERN: &str = r"\w+";

/// Everything that is neither a word character nor whitespace.
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s]").expect("punctuation pattern is valid")
});

/// Tokenizer configured with a match pattern and an exclusion-token list.
#[derive(Debug, Clone)]
pub struct MessageParser {
    pattern: Regex,
    exclusion_tokens: HashSet<String>,
}

impl MessageParser {
    /// Build a parser; fails with [`RecastError::Config`] if `pattern` does not compile.
    pub fn new<I, S>(pattern: &str, exclusion_tokens: I) -> Result<Self, RecastError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Regex::new(pattern)
            .map_err(|e| RecastError::Config(format!("invalid token pattern `{pattern}`: {e}")))?;
        Ok(Self {
            pattern,
            exclusion_tokens: exclusion_tokens.into_iter().map(Into::into).collect(),
        })
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self, RecastError> {
        Self::new(&config.pattern, config.exclusion_tokens.iter().cloned())
    }

    /// Trim, lowercase, and strip every character that is not a word character or whitespace.
    pub fn normalize(text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        PUNCTUATION.replace_all(&lowered, "").into_owned()
    }

    /// [`normalize`](Self::normalize) for untyped input; anything but a string yields `""`.
    pub fn normalize_value(value: &Value) -> String {
        match value.as_str() {
            Some(text) => Self::normalize(text),
            None => {
                warn!(found = json_type_name(value), "normalize called with non-string input");
                String::new()
            }
        }
    }

    /// Normalize `text` and return the pattern matches not on the exclusion-token list.
    pub fn parse(&self, text: &str) -> Vec<String> {
        let normalized = Self::normalize(text);
        self.pattern
            .find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|token| !self.exclusion_tokens.contains(*token))
            .map(str::to_string)
            .collect()
    }

    /// Pair each token with `msg-<n>`, `n` counting from 1 in input order.
    pub fn tag_ids<S: AsRef<str>>(tokens: &[S]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| TaggedToken {
                token: token.as_ref().to_string(),
                id: format!("msg-{}", i + 1),
            })
            .collect()
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_PATTERN).expect("default pattern is valid"),
            exclusion_tokens: HashSet::new(),
        }
    }
}

impl TokenParser for MessageParser {
    fn parse(&self, text: &str) -> Vec<String> {
        MessageParser::parse(self, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(MessageParser::normalize("Hello, WORLD!"), "hello world");
        assert_eq!(MessageParser::normalize("  spaced  out  "), "spaced  out");
        assert_eq!(MessageParser::normalize("snake_case stays"), "snake_case stays");
    }

    #[test]
    #[traced_test]
    fn normalize_non_string_is_empty() {
        assert_eq!(MessageParser::normalize_value(&json!(123)), "");
        assert_eq!(MessageParser::normalize_value(&json!(null)), "");
        assert!(logs_contain("non-string input"));
        assert_eq!(MessageParser::normalize_value(&json!("Hi!")), "hi");
    }

    #[test]
    fn parse_drops_exclusion_tokens() {
        let parser = MessageParser::new(DEFAULT_PATTERN, ["hello"]).unwrap();
        assert_eq!(parser.parse("Hello world"), vec!["world"]);
    }

    #[test]
    fn parse_without_matches_is_empty() {
        let parser = MessageParser::default();
        assert!(parser.parse("  ?!...  ").is_empty());
        assert!(parser.parse("").is_empty());
    }

    #[test]
    fn parse_uses_custom_pattern() {
        let parser = MessageParser::new(r"[a-z]{3,}", Vec::<String>::new()).unwrap();
        assert_eq!(parser.parse("An old cat sat, 42 times"), vec!["old", "cat", "sat", "times"]);
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = MessageParser::new("(", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, RecastError::Config(_)));
    }

    #[test]
    fn from_config_applies_settings() {
        let config = ParserConfig {
            pattern: DEFAULT_PATTERN.to_string(),
            exclusion_tokens: vec!["the".into()],
        };
        let parser = MessageParser::from_config(&config).unwrap();
        assert_eq!(parser.parse("The new drop"), vec!["new", "drop"]);
    }

    #[test]
    fn tag_ids_numbers_from_one() {
        let tagged = MessageParser::tag_ids(&["apple", "banana"]);
        assert_eq!(
            tagged,
            vec![
                TaggedToken { token: "apple".into(), id: "msg-1".into() },
                TaggedToken { token: "banana".into(), id: "msg-2".into() },
            ]
        );
        assert!(MessageParser::tag_ids::<String>(&[]).is_empty());
    }
}
