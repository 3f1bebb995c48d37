//! Stored rule dictionaries
//!
//! Rules are saved find/replace pairs grouped into XML dictionaries. A rule
//! library is a directory tree laid out as
//! `<root>/<purpose>/<language>/<dictionary>.xml`, where each file holds
//!
//! ```xml
//! <dictionary name="Typography">
//!   <rule id="1" find="--" replace="–" active="true" caseSensitive="false" wholeWord="false"/>
//! </dictionary>
//! ```
//!
//! Rule fields may be given as attributes or as child elements. A flag is set
//! only when its value is exactly `true`.
//!
//! Plain rules find and replace literal text. Wildcard rules carry a pattern
//! and template in the JavaScript dialect, preferring the normalised form when
//! one is stored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::EngineConfig;
use crate::error::{Error, Result};
use crate::request::{Action, Outcome, Request, process};

/// A stored find/replace rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub description: String,
    /// Text to find, or a pattern when `wildcard` is set
    pub find: String,
    /// Replacement text, or a template when `wildcard` is set
    pub replace: String,
    /// Inactive rules are listed but never applied
    pub active: bool,
    pub case_sensitive: bool,
    /// Only match at the end of a line
    pub end_of_paragraph: bool,
    /// Only match at the start of a line
    pub start_of_paragraph: bool,
    /// Only match between word boundaries
    pub whole_word: bool,
    /// `find`/`replace` are a pattern and template rather than literal text
    pub wildcard: bool,
    pub word_rule: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalised_find: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalised_replace: Option<String>,
}

impl Rule {
    fn source_find(&self) -> &str {
        match &self.normalised_find {
            Some(find) if self.wildcard && !find.is_empty() => find,
            _ => &self.find,
        }
    }

    fn source_replace(&self) -> &str {
        match &self.normalised_replace {
            Some(replace) if self.wildcard && !replace.is_empty() => replace,
            _ => &self.replace,
        }
    }

    /// The find pattern this rule runs, with its anchoring options applied
    pub fn find_pattern(&self) -> String {
        let find = self.source_find();
        let mut pattern = if self.wildcard {
            find.to_string()
        } else {
            escape_literal(find)
        };

        if self.whole_word {
            pattern = format!(r"\b(?:{pattern})\b");
        }
        if self.start_of_paragraph {
            pattern = format!("(?m:^)(?:{pattern})");
        }
        if self.end_of_paragraph {
            pattern = format!("(?:{pattern})(?m:$)");
        }
        pattern
    }

    /// The JavaScript replacement template this rule runs
    pub fn replace_template(&self) -> String {
        let replace = self.source_replace();
        if self.wildcard {
            replace.to_string()
        } else {
            replace.replace('$', "$$")
        }
    }
}

/// A named list of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dictionary {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl Dictionary {
    /// Parse dictionary XML; `fallback_name` is used when the file names none
    pub fn parse(xml: &str, fallback_name: &str) -> Result<Self> {
        let raw: RawDictionary = quick_xml::de::from_str(xml)
            .map_err(|e| Error::UnsupportedInput(format!("malformed rule dictionary: {e}")))?;

        let name = raw
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_name.to_string());
        let rules = raw.rules.into_iter().map(Rule::from).collect();
        Ok(Dictionary { name, rules })
    }

    /// Rules that are switched on, in file order
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.active)
    }

    /// Substitute with every active rule in turn, each on the previous output
    ///
    /// Rules with nothing to find are skipped. The first failing rule aborts
    /// the run and names itself in the error.
    pub fn apply(&self, text: &str, config: &EngineConfig) -> Result<String> {
        let mut text = text.to_string();

        for rule in self.active_rules() {
            if rule.source_find().is_empty() {
                warn!(target: "recast", dictionary = %self.name, rule = %rule.id, "skipping rule with empty find");
                continue;
            }

            let request = Request {
                find_pattern: rule.find_pattern(),
                replace_template: Some(rule.replace_template()),
                case_sensitive: rule.case_sensitive,
                text,
                action: Action::Substitute,
            };
            let outcome = process(&request, config)
                .map_err(|e| e.with_context(&format!("rule '{}' of '{}'", rule.id, self.name)))?;
            text = match outcome {
                Outcome::Substituted { substituted_text } => substituted_text,
                Outcome::Matches { .. } => request.text,
            };
            debug!(target: "recast", dictionary = %self.name, rule = %rule.id, "rule applied");
        }
        Ok(text)
    }
}

/// A directory tree of rule dictionaries
#[derive(Debug, Clone)]
pub struct RuleLibrary {
    root: PathBuf,
}

impl RuleLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RuleLibrary { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level directories, sorted
    pub fn purposes(&self) -> Result<Vec<String>> {
        subdirectories(&self.root)
    }

    /// Language directories within a purpose, sorted
    pub fn languages(&self, purpose: &str) -> Result<Vec<String>> {
        subdirectories(&self.root.join(segment("purpose", purpose)?))
    }

    /// `.xml` files within a purpose and language, sorted
    pub fn dictionaries(&self, purpose: &str, language: &str) -> Result<Vec<String>> {
        let dir = self
            .root
            .join(segment("purpose", purpose)?)
            .join(segment("language", language)?);

        let mut files: Vec<String> = read_dir(&dir)?
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_ascii_lowercase().ends_with(".xml"))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Read and parse one dictionary
    pub fn load(&self, purpose: &str, language: &str, file: &str) -> Result<Dictionary> {
        let path = self
            .root
            .join(segment("purpose", purpose)?)
            .join(segment("language", language)?)
            .join(segment("dictionary", file)?);

        let xml = fs::read_to_string(&path).map_err(|e| {
            Error::UnsupportedInput(format!("cannot read dictionary '{}': {e}", path.display()))
        })?;
        let dictionary = Dictionary::parse(&xml, file)?;
        debug!(target: "recast", path = %path.display(), rules = dictionary.rules.len(), "loaded dictionary");
        Ok(dictionary)
    }
}

/// One path component supplied by the caller; never allowed to leave the root
fn segment<'a>(kind: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Error::UnsupportedInput(format!("invalid {kind} name '{value}'")));
    }
    Ok(value)
}

fn read_dir(dir: &Path) -> Result<impl Iterator<Item = fs::DirEntry>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::UnsupportedInput(format!("cannot read rule directory '{}': {e}", dir.display()))
    })?;
    Ok(entries.filter_map(|entry| entry.ok()))
}

fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = read_dir(dir)?
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}

fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if r"\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Deserialize)]
struct RawDictionary {
    #[serde(rename = "@name", alias = "name", default)]
    name: Option<String>,
    #[serde(rename = "rule", default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRule {
    #[serde(rename = "@id", alias = "id")]
    id: Option<String>,
    #[serde(rename = "@description", alias = "description")]
    description: Option<String>,
    #[serde(rename = "@find", alias = "find")]
    find: Option<String>,
    #[serde(rename = "@replace", alias = "replace")]
    replace: Option<String>,
    #[serde(rename = "@active", alias = "active")]
    active: Option<String>,
    #[serde(rename = "@caseSensitive", alias = "caseSensitive")]
    case_sensitive: Option<String>,
    #[serde(rename = "@endOfParagraph", alias = "endOfParagraph")]
    end_of_paragraph: Option<String>,
    #[serde(rename = "@startOfParagraph", alias = "startOfParagraph")]
    start_of_paragraph: Option<String>,
    #[serde(rename = "@wholeWord", alias = "wholeWord")]
    whole_word: Option<String>,
    #[serde(rename = "@wildcard", alias = "wildcard")]
    wildcard: Option<String>,
    #[serde(rename = "@wordRule", alias = "wordRule")]
    word_rule: Option<String>,
    #[serde(rename = "@style", alias = "style")]
    style: Option<String>,
    #[serde(rename = "@normalisedFind", alias = "normalisedFind")]
    normalised_find: Option<String>,
    #[serde(rename = "@normalisedReplace", alias = "normalisedReplace")]
    normalised_replace: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        Rule {
            active: flag(&raw.active),
            case_sensitive: flag(&raw.case_sensitive),
            end_of_paragraph: flag(&raw.end_of_paragraph),
            start_of_paragraph: flag(&raw.start_of_paragraph),
            whole_word: flag(&raw.whole_word),
            wildcard: flag(&raw.wildcard),
            word_rule: flag(&raw.word_rule),
            id: raw.id.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            find: raw.find.unwrap_or_default(),
            replace: raw.replace.unwrap_or_default(),
            style: raw.style,
            normalised_find: raw.normalised_find,
            normalised_replace: raw.normalised_replace,
        }
    }
}
