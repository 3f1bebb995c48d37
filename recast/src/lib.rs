//! Recast Core Library
//!
//! Runs find/replace patterns authored in the JavaScript regex dialect on the
//! Rust host engine: maps match options to compiler flags, translates
//! replacement templates into host backreference syntax, and scans or
//! substitutes document text, one pattern at a time or through stored rule
//! dictionaries.

pub mod document;
pub mod engine;
pub mod error;
pub mod options;
pub mod request;
pub mod rules;
pub mod suggestion;
pub mod template;

pub use document::{ContentType, DocumentExtractor, DocxExtractor, PlainTextExtractor, TextExtractor};
pub use engine::{Budget, CompiledPattern, EngineConfig, Match, Matches, compile, context_snippet};
pub use error::{Error, ErrorKind, Result};
pub use options::{CompilerFlags, MatchOptions, map_options};
pub use request::{Action, Outcome, Request, process};
pub use rules::{Dictionary, Rule, RuleLibrary};
pub use suggestion::{ConvertedPattern, PatternSuggester, Suggestion, SuggestionRequest};
pub use template::{Dialect, HostTemplate, ReplacementPart, TranslationReport, translate_template};

/// Translate a JavaScript template and apply it to every match of `pattern`
///
/// This is the main entry point for one-off substitutions.
pub fn replace_all(pattern: &str, template: &str, case_sensitive: bool, text: &str) -> Result<String> {
    let compiled = CompiledPattern::new(pattern, map_options(case_sensitive))?;
    compiled.substitute(&translate_template(template, Dialect::JavaScript), text)
}
