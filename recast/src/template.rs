//! Replacement template translation
//!
//! Templates arrive in a foreign dialect (JavaScript's `String.replace`
//! syntax) and are rewritten for the host engine:
//! - `$$` is a literal dollar and is consumed before anything else
//! - `$&` is the entire match
//! - `$N` refers to numbered group N (maximal run of digits)
//! - `${name}` refers to a named group
//!
//! Any other `$` is copied through literally. Whether the referenced groups
//! exist is checked later, against the compiled pattern.

use std::fmt;
use std::str::FromStr;

use fancy_regex::Captures;

use crate::error::Error;

/// Regex dialect a template was authored in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Dialect {
    /// ECMAScript `String.prototype.replace` templates
    #[default]
    JavaScript,
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "ecmascript" => Ok(Dialect::JavaScript),
            other => Err(Error::UnsupportedInput(format!(
                "unknown template dialect '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::JavaScript => f.write_str("javascript"),
        }
    }
}

/// A part of a translated template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementPart {
    /// Literal text, already unescaped
    Literal(String),
    /// Backreference by number
    BackrefNumber(usize),
    /// Backreference by name
    BackrefName(String),
    /// Entire match
    EntireMatch,
}

/// A template in host-native form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostTemplate {
    parts: Vec<ReplacementPart>,
}

impl HostTemplate {
    /// Get the parts of the template
    pub fn parts(&self) -> &[ReplacementPart] {
        &self.parts
    }

    /// Render in the host engine's replacement syntax
    pub fn to_host_syntax(&self) -> String {
        self.to_string()
    }

    /// True when the template contains no group or whole-match references
    pub fn is_literal(&self) -> bool {
        self.parts
            .iter()
            .all(|part| matches!(part, ReplacementPart::Literal(_)))
    }

    /// Append the expansion of this template for one match to `dst`
    ///
    /// Groups that did not participate in the match expand to nothing.
    pub fn expand(&self, caps: &Captures<'_>, dst: &mut String) {
        for part in &self.parts {
            match part {
                ReplacementPart::Literal(text) => dst.push_str(text),
                ReplacementPart::BackrefNumber(n) => {
                    if let Some(group) = caps.get(*n) {
                        dst.push_str(group.as_str());
                    }
                }
                ReplacementPart::BackrefName(name) => {
                    if let Some(group) = caps.name(name) {
                        dst.push_str(group.as_str());
                    }
                }
                ReplacementPart::EntireMatch => {
                    if let Some(whole) = caps.get(0) {
                        dst.push_str(whole.as_str());
                    }
                }
            }
        }
    }

    fn push_literal(&mut self, literal: &mut String) {
        if !literal.is_empty() {
            self.parts
                .push(ReplacementPart::Literal(std::mem::take(literal)));
        }
    }
}

impl fmt::Display for HostTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                ReplacementPart::Literal(text) => f.write_str(&text.replace('$', "$$"))?,
                ReplacementPart::BackrefNumber(n) => write!(f, "${{{n}}}")?,
                ReplacementPart::BackrefName(name) => write!(f, "${{{name}}}")?,
                ReplacementPart::EntireMatch => f.write_str("${0}")?,
            }
        }
        Ok(())
    }
}

/// Token recognised right after a `$`
enum Token<'a> {
    Dollar,
    EntireMatch,
    Number(usize),
    Name(&'a str),
}

/// Translate a foreign-dialect template into host form
///
/// Never fails: unrecognised `$` sequences are kept as literal text.
pub fn translate_template(template: &str, dialect: Dialect) -> HostTemplate {
    match dialect {
        Dialect::JavaScript => translate_javascript(template),
    }
}

fn translate_javascript(template: &str) -> HostTemplate {
    let mut host = HostTemplate::default();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match lex_javascript_token(after) {
            Some((Token::Dollar, len)) => {
                // consumed: never re-read as the start of another token
                literal.push('$');
                rest = &after[len..];
            }
            Some((Token::EntireMatch, len)) => {
                host.push_literal(&mut literal);
                host.parts.push(ReplacementPart::EntireMatch);
                rest = &after[len..];
            }
            Some((Token::Number(n), len)) => {
                host.push_literal(&mut literal);
                host.parts.push(ReplacementPart::BackrefNumber(n));
                rest = &after[len..];
            }
            Some((Token::Name(name), len)) => {
                host.push_literal(&mut literal);
                host.parts.push(ReplacementPart::BackrefName(name.to_string()));
                rest = &after[len..];
            }
            None => {
                literal.push('$');
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    host.push_literal(&mut literal);
    host
}

/// Recognise a token following `$`, returning it with its length in bytes
fn lex_javascript_token(after: &str) -> Option<(Token<'_>, usize)> {
    if after.starts_with('$') {
        return Some((Token::Dollar, 1));
    }
    if after.starts_with('&') {
        return Some((Token::EntireMatch, 1));
    }

    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        // Saturates so an oversized group number is still a reference
        let n = after[..digits].parse::<usize>().unwrap_or(usize::MAX);
        return Some((Token::Number(n), digits));
    }

    let body = after.strip_prefix('{')?;
    let close = body.find('}')?;
    let name = &body[..close];
    is_group_name(name).then_some((Token::Name(name), close + 2))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Result of a translation with debug information
#[derive(Debug, Clone)]
pub struct TranslationReport {
    /// The original template
    pub input: String,
    /// The dialect it was read as
    pub dialect: Dialect,
    /// The parsed parts (debug format)
    pub parts: String,
    /// The host-syntax output
    pub output: String,
}

impl TranslationReport {
    /// Translate and keep the intermediate representation
    pub fn new(template: &str, dialect: Dialect) -> Self {
        let host = translate_template(template, dialect);
        TranslationReport {
            input: template.to_string(),
            dialect,
            parts: format!("{:?}", host.parts()),
            output: host.to_host_syntax(),
        }
    }
}

impl fmt::Display for TranslationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Translation Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Dialect: {}", self.dialect)?;
        writeln!(f, "Input:   {}", self.input)?;
        writeln!(f, "Parts:   {}", self.parts)?;
        write!(f, "Output:  {}", self.output)
    }
}
