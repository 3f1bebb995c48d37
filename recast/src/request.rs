//! Per-request dispatch
//!
//! A request carries a find pattern, an optional replacement template, the
//! case option, the document text and the action. Each request compiles its
//! own pattern; nothing is cached or shared between requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{EngineConfig, Match, compile};
use crate::error::{Error, Result};
use crate::options::map_options;
use crate::template::{Dialect, translate_template};

/// What to do with the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Report every match with context
    Test,
    /// Replace every match
    Substitute,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test" => Ok(Action::Test),
            "substitute" => Ok(Action::Substitute),
            other => Err(Error::UnsupportedInput(format!(
                "invalid action '{other}' (must be \"test\" or \"substitute\")"
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Test => f.write_str("test"),
            Action::Substitute => f.write_str("substitute"),
        }
    }
}

/// A single find/replace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The find pattern, JavaScript dialect without delimiters
    pub find_pattern: String,
    /// The JavaScript replacement template; required for substitution
    #[serde(default)]
    pub replace_template: Option<String>,
    /// Match letters exactly as written
    pub case_sensitive: bool,
    /// The document text to scan
    pub text: String,
    /// Scan or substitute
    pub action: Action,
}

/// Successful result of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Matches {
        matches: Vec<Match>,
    },
    Substituted {
        #[serde(rename = "substitutedText")]
        substituted_text: String,
    },
}

/// Serve one request with the given configuration
///
/// Any failure aborts the whole request; there is never a partial result.
pub fn process(request: &Request, config: &EngineConfig) -> Result<Outcome> {
    if request.find_pattern.is_empty() {
        return Err(Error::UnsupportedInput("find pattern is required".to_string()));
    }
    // Checked before compiling so a missing template is reported as such
    let template = match (request.action, &request.replace_template) {
        (Action::Substitute, None) => {
            return Err(Error::UnsupportedInput(
                "replace template is required for substitute action".to_string(),
            ));
        }
        (Action::Substitute, Some(template)) => Some(translate_template(template, Dialect::JavaScript)),
        (Action::Test, _) => None,
    };

    let pattern = compile(&request.find_pattern, map_options(request.case_sensitive), config)?;

    match template {
        None => {
            let matches = pattern.find_all(&request.text)?;
            debug!(target: "recast", found = matches.len(), "scan complete");
            Ok(Outcome::Matches { matches })
        }
        Some(template) => {
            let substituted_text = pattern.substitute(&template, &request.text)?;
            Ok(Outcome::Substituted { substituted_text })
        }
    }
}
