//! Boundary with the pattern suggestion service
//!
//! The service drafts, refines and converts patterns from natural language.
//! This crate does not talk to it directly; callers plug an implementation in
//! through [`PatternSuggester`] and the engine only consumes the find pattern
//! and replacement template it returns.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::MatchOptions;

/// Separator between the find and replace halves of a raw reply
pub const REPLY_SEPARATOR: &str = "|||";

/// An example string with an optional note on why it should (not) match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    #[serde(default)]
    pub note: String,
}

/// What the user asked the service to draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub description: String,
    #[serde(default)]
    pub match_examples: Vec<Example>,
    #[serde(default)]
    pub non_match_examples: Vec<Example>,
    /// Case and whole-word preferences; whole-word is a drafting hint only
    #[serde(flatten)]
    pub options: MatchOptions,
}

impl SuggestionRequest {
    /// Examples worth sending upstream; blank ones are dropped
    pub fn usable_examples(examples: &[Example]) -> impl Iterator<Item = &Example> {
        examples.iter().filter(|ex| !ex.text.trim().is_empty())
    }
}

/// A drafted find/replace pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub find_pattern: String,
    #[serde(default)]
    pub replace_template: String,
    /// Free text, passed through without inspection
    #[serde(default)]
    pub explanation: String,
}

impl Suggestion {
    /// Check that the service produced something the engine can compile
    pub fn validated(self) -> Result<Self> {
        if self.find_pattern.trim().is_empty() {
            return Err(Error::UpstreamFailure(
                "suggestion service returned an empty find pattern".to_string(),
            ));
        }
        Ok(self)
    }
}

/// A pattern pair rewritten for another dialect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedPattern {
    pub converted_find: String,
    pub converted_replace: String,
}

/// The external pattern suggestion service
pub trait PatternSuggester {
    /// Draft a pattern pair from a description and examples
    fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion>;

    /// Revise a previous pair given free-text feedback
    fn refine(&self, previous: &Suggestion, feedback: &str) -> Result<Suggestion>;

    /// Express a pair in another named dialect
    fn convert(&self, find: &str, replace: &str, target: &str) -> Result<ConvertedPattern>;
}

/// Split a raw `find|||replace` reply
///
/// Both halves are trimmed. Without a separator the whole reply is the find
/// pattern and the template is empty. An empty reply is an upstream failure.
pub fn parse_reply(raw: &str) -> Result<(String, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::UpstreamFailure(
            "no content received from suggestion service".to_string(),
        ));
    }

    let mut halves = raw.splitn(2, REPLY_SEPARATOR);
    let find = halves.next().unwrap_or_default().trim().to_string();
    let replace = halves.next().unwrap_or_default().trim().to_string();
    Ok((find, replace))
}

/// Build a validated [`Suggestion`] from a raw reply and an explanation
pub fn suggestion_from_reply(raw: &str, explanation: impl Into<String>) -> Result<Suggestion> {
    let (find_pattern, replace_template) = parse_reply(raw)?;
    Suggestion {
        find_pattern,
        replace_template,
        explanation: explanation.into(),
    }
    .validated()
}

/// Build a [`ConvertedPattern`] from a raw conversion reply
pub fn converted_from_reply(raw: &str) -> Result<ConvertedPattern> {
    let (converted_find, converted_replace) = parse_reply(raw)?;
    if converted_find.is_empty() {
        return Err(Error::UpstreamFailure(
            "conversion returned an empty find pattern".to_string(),
        ));
    }
    Ok(ConvertedPattern {
        converted_find,
        converted_replace,
    })
}
