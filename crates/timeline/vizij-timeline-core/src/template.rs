//! Value templates: render a raw value into its literal form and recover it again.
//!
//! A template is a literal string with a `$` marker, e.g. `translate($)` or `$px`.
//! Extraction turns the template into a regex: literal text is escaped, the first
//! marker becomes a non-greedy capture, later markers are skipped. A marker at the
//! end of the template is anchored to the end of the text so that `$` captures
//! the whole input instead of the empty prefix.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Substitution marker inside a template.
pub const MARKER: char = '$';

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Template that renders the raw value unchanged.
    pub fn identity() -> Self {
        Self(MARKER.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn marker_count(&self) -> usize {
        self.0.matches(MARKER).count()
    }

    /// Substitute every marker with `value`.
    pub fn render(&self, value: &str) -> String {
        self.0.replace(MARKER, value)
    }

    /// Regex source used by [`Template::extract`].
    pub fn pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() * 2);
        let segments: Vec<&str> = self.0.split(MARKER).collect();
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            pattern.push_str(&regex::escape(segment));
            if i == last {
                break;
            }
            let group = if i == 0 { "(.*?)" } else { "(?:.*?)" };
            pattern.push_str(group);
            if i + 1 == last && segments[last].is_empty() {
                pattern.push('$');
            }
        }
        pattern
    }

    /// Recover the raw value this template contributed to `literal`.
    /// First match wins; no match (or a template without marker) yields `""`.
    pub fn extract(&self, literal: &str) -> String {
        let re = match Regex::new(&self.pattern()) {
            Ok(re) => re,
            Err(err) => {
                log::warn!("template '{}' does not compile: {err}", self.0);
                return String::new();
            }
        };
        re.captures(literal)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
