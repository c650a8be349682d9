//! Independent marker extractors.
//!
//! Each [`Marker`] looks for one pattern anywhere in the text. Markers do not
//! depend on each other or on their order in the text, so a missing marker
//! only defaults its own field.

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// A lazily compiled pattern with one capture group of interest.
pub struct Marker {
    pattern: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl Marker {
    pub const fn new(pattern: &'static str) -> Self {
        Self {
            pattern,
            compiled: OnceLock::new(),
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match Regex::new(self.pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::error!("Invalid marker pattern {}: {}", self.pattern, e);
                    None
                }
            })
            .as_ref()
    }

    /// Capture group `group` of the first match.
    pub fn capture<'t>(&self, text: &'t str, group: usize) -> Option<&'t str> {
        self.regex()?
            .captures(text)?
            .get(group)
            .map(|m| m.as_str())
    }

    /// Capture group `group` parsed as `T`, or `T::default()` when the marker
    /// is absent or malformed.
    pub fn parse_or_default<T>(&self, text: &str, group: usize) -> T
    where
        T: FromStr + Default,
    {
        self.capture(text, group)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Capture group `group`, trimmed, or `fallback`.
    pub fn text_or(&self, text: &str, group: usize, fallback: &str) -> String {
        self.capture(text, group)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Every full match, in order of appearance.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match self.regex() {
            Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
            None => Vec::new(),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static STEP: Marker = Marker::new(r"NSTEP\s*=\s*(\d+)");
    static BROKEN: Marker = Marker::new(r"(unclosed");

    #[test]
    fn test_capture_and_parse() {
        let text = "junk\n NSTEP =     1500   TIME(PS) = 3.0\n";
        assert_eq!(STEP.capture(text, 1), Some("1500"));
        assert_eq!(STEP.parse_or_default::<u64>(text, 1), 1500);
    }

    #[test]
    fn test_absent_marker_defaults() {
        assert_eq!(STEP.parse_or_default::<u64>("nothing here", 1), 0);
        assert_eq!(STEP.text_or("nothing here", 1, "unknown"), "unknown");
        assert!(!STEP.is_match("nothing here"));
    }

    #[test]
    fn test_overflow_defaults() {
        let text = "NSTEP = 99999999999999999999999999";
        assert_eq!(STEP.parse_or_default::<u64>(text, 1), 0);
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        assert_eq!(BROKEN.capture("(unclosed", 0), None);
        assert!(BROKEN.find_all("(unclosed").is_empty());
    }
}
