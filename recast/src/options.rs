//! Mapping of logical match options onto host compiler flags

use serde::{Deserialize, Serialize};

/// Options a caller chooses for a find/replace request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    /// Letters must match in case exactly
    pub case_sensitive: bool,
    /// Only whole words should match.
    ///
    /// Advisory: this is a drafting hint for the suggestion service and the
    /// engine never enforces it.
    #[serde(default)]
    pub whole_word_only: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            case_sensitive: true,
            whole_word_only: false,
        }
    }
}

impl MatchOptions {
    /// Compiler flags for these options
    pub fn flags(&self) -> CompilerFlags {
        map_options(self.case_sensitive)
    }
}

/// Flags handed to the host regex compiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerFlags {
    /// Case insensitive matching (`(?i)`)
    pub case_insensitive: bool,
}

impl CompilerFlags {
    /// Inline flag group to put in front of the pattern, empty for defaults
    pub fn inline_prefix(&self) -> &'static str {
        if self.case_insensitive { "(?i)" } else { "" }
    }

    /// Apply the flags to a pattern body
    pub fn apply(&self, pattern: &str) -> String {
        format!("{}{}", self.inline_prefix(), pattern)
    }
}

/// Translate the logical case option into compiler flags
pub fn map_options(case_sensitive: bool) -> CompilerFlags {
    CompilerFlags {
        case_insensitive: !case_sensitive,
    }
}
