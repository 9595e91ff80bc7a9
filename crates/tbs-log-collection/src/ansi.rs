//! Terminal escape sequence removal.

use regex::Regex;
use std::borrow::Cow;

/// CSI sequences (colours, cursor movement) and OSC sequences (hyperlinks,
/// titles).
const ANSI_PATTERN: &str = r"\x1B(?:\[[0-9;?]*[A-Za-z~]|\][^\x07]*\x07)";

/// Strips ANSI escape codes from captured output.
///
/// Dev servers colour their banners even when writing to a file, which would
/// otherwise split markers like `Local:` from the URL that follows.
#[derive(Debug, Clone)]
pub struct AnsiFilter {
    pattern: Regex,
}

impl AnsiFilter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(ANSI_PATTERN)?,
        })
    }

    pub fn strip<'a>(&self, line: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(line, "")
    }
}
