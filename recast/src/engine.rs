//! Match and substitution engine
//!
//! Compiles a find pattern with the host engine (`fancy-regex`), enumerates
//! matches lazily with character offsets and context snippets, and performs
//! whole-text substitution with a translated template.
//!
//! The find pattern is handed to the host compiler as-is. Only the
//! replacement template is translated; pattern syntax the host does not
//! understand is reported as [`Error::InvalidPattern`].

use std::iter::FusedIterator;

use fancy_regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::options::CompilerFlags;
use crate::template::{HostTemplate, ReplacementPart};

/// Default number of characters shown on each side of a match
pub const DEFAULT_CONTEXT_RADIUS: usize = 50;

/// Marker for context that was cut off at a snippet edge
const ELLIPSIS: &str = "...";

/// Limits placed on the host engine for a single request
///
/// `None` leaves the host's own default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    /// Maximum backtracking steps for one match attempt
    pub backtrack_limit: Option<usize>,
    /// Maximum size in bytes of the compiled automaton
    pub size_limit: Option<usize>,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Characters of context on each side of a match
    pub context_radius: usize,
    /// Limits on compilation and execution
    pub budget: Budget,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            context_radius: DEFAULT_CONTEXT_RADIUS,
            budget: Budget::default(),
        }
    }
}

/// A match result
///
/// Offsets count characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// The matched text
    pub matched_text: String,
    /// The start position of the match
    pub start_offset: usize,
    /// The end position of the match (exclusive)
    pub end_offset: usize,
    /// Surrounding text for previews
    pub context_snippet: String,
}

impl Match {
    /// Length of the match in characters
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Check if the match is empty
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// A find pattern compiled by the host engine
#[derive(Debug)]
pub struct CompiledPattern {
    regex: Regex,
    context_radius: usize,
}

impl CompiledPattern {
    /// Compile a pattern with default configuration
    pub fn new(pattern: &str, flags: CompilerFlags) -> Result<Self> {
        compile(pattern, flags, &EngineConfig::default())
    }

    /// The source handed to the host compiler, flag prefix included
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of capture groups, excluding the whole match
    pub fn group_count(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    /// Names of the named capture groups, in pattern order
    pub fn group_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.regex.capture_names().flatten()
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, text: &str) -> Result<bool> {
        self.regex.is_match(text).map_err(execution_limit)
    }

    /// Lazily scan `text` for non-overlapping matches, leftmost first
    pub fn test<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            inner: self.regex.find_iter(text),
            text,
            radius: self.context_radius,
            byte_cursor: 0,
            char_cursor: 0,
            done: false,
        }
    }

    /// Collect every match, failing on the first execution error
    pub fn find_all(&self, text: &str) -> Result<Vec<Match>> {
        self.test(text).collect()
    }

    /// Replace every match in `text` with the expansion of `template`
    ///
    /// Text between matches is copied unchanged. With zero matches the input
    /// comes back as-is. No partial output is ever returned.
    pub fn substitute(&self, template: &HostTemplate, text: &str) -> Result<String> {
        self.check_template(template)?;

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut replaced = 0usize;

        for caps in self.regex.captures_iter(text) {
            let caps = caps.map_err(execution_limit)?;
            let Some(whole) = caps.get(0) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            template.expand(&caps, &mut output);
            last = whole.end();
            replaced += 1;
        }

        debug!(
            target: "recast",
            pattern = self.regex.as_str(),
            replaced,
            "substitution complete"
        );

        if replaced == 0 {
            return Ok(text.to_string());
        }
        output.push_str(&text[last..]);
        Ok(output)
    }

    /// Reject templates that reference groups the pattern does not define
    fn check_template(&self, template: &HostTemplate) -> Result<()> {
        for part in template.parts() {
            match part {
                ReplacementPart::BackrefNumber(n) if *n > self.group_count() => {
                    return Err(Error::InvalidReplacement(format!(
                        "reference to group {n}, but the pattern defines {} group(s)",
                        self.group_count()
                    )));
                }
                ReplacementPart::BackrefName(name)
                    if !self.group_names().any(|defined| defined == name.as_str()) =>
                {
                    return Err(Error::InvalidReplacement(format!(
                        "reference to undefined group name '{name}'"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Compile a find pattern under the given flags and configuration
pub fn compile(pattern: &str, flags: CompilerFlags, config: &EngineConfig) -> Result<CompiledPattern> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern("pattern is empty".to_string()));
    }

    let source = flags.apply(pattern);
    let mut builder = RegexBuilder::new(&source);
    if let Some(limit) = config.budget.backtrack_limit {
        builder.backtrack_limit(limit);
    }
    if let Some(limit) = config.budget.size_limit {
        builder.delegate_size_limit(limit);
    }

    let regex = builder
        .build()
        .map_err(|e| Error::InvalidPattern(e.to_string()))?;

    debug!(
        target: "recast",
        pattern = %source,
        groups = regex.captures_len().saturating_sub(1),
        "compiled pattern"
    );

    Ok(CompiledPattern {
        regex,
        context_radius: config.context_radius,
    })
}

fn execution_limit(err: fancy_regex::Error) -> Error {
    warn!(target: "recast", error = %err, "host engine aborted the scan");
    Error::ExecutionLimit(err.to_string())
}

/// Lazy sequence of matches produced by [`CompiledPattern::test`]
///
/// Yields at most one error, after which it is exhausted.
pub struct Matches<'r, 't> {
    inner: fancy_regex::Matches<'r, 't>,
    text: &'t str,
    radius: usize,
    byte_cursor: usize,
    char_cursor: usize,
    done: bool,
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let found = match self.inner.next() {
            Some(Ok(found)) => found,
            Some(Err(err)) => {
                self.done = true;
                return Some(Err(execution_limit(err)));
            }
            None => {
                self.done = true;
                return None;
            }
        };

        // Offsets are converted incrementally so a full scan stays linear
        let start_offset =
            self.char_cursor + self.text[self.byte_cursor..found.start()].chars().count();
        let end_offset = start_offset + found.as_str().chars().count();
        self.byte_cursor = found.end();
        self.char_cursor = end_offset;

        Some(Ok(Match {
            matched_text: found.as_str().to_string(),
            start_offset,
            end_offset,
            context_snippet: context_snippet(self.text, found.start(), found.end(), self.radius),
        }))
    }
}

impl FusedIterator for Matches<'_, '_> {}

/// Excerpt of `text` around the byte range `start..end`
///
/// Takes up to `radius` characters on each side. An edge that had to be cut
/// short of the text bounds is marked with `...`.
pub fn context_snippet(text: &str, start: usize, end: usize, radius: usize) -> String {
    let left = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(idx, _)| idx);
    let right = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(idx, _)| end + idx);

    let mut snippet = String::with_capacity(right - left + 2 * ELLIPSIS.len());
    if left > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&text[left..right]);
    if right < text.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}
