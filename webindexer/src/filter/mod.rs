use crate::error::Result;
use regex::Regex;

pub mod access;

pub use access::{compose_valid_users, AccessAttributes, AccessResolver, NoAccessAttributes};
#[cfg(unix)]
pub use access::XattrAccessResolver;

/// Access source named by the `access_attributes` config key.
pub fn access_resolver(source: &str) -> Box<dyn AccessResolver> {
    match source {
        "none" => Box::new(NoAccessAttributes),
        _ => platform_access_resolver(),
    }
}

#[cfg(unix)]
fn platform_access_resolver() -> Box<dyn AccessResolver> {
    Box::new(XattrAccessResolver)
}

#[cfg(not(unix))]
fn platform_access_resolver() -> Box<dyn AccessResolver> {
    Box::new(NoAccessAttributes)
}

/// Hides entries whose name contains a match for the configured pattern.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: Option<Regex>,
}

impl NameFilter {
    /// An empty pattern disables filtering.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self { pattern: None });
        }
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    pub fn disabled() -> Self {
        Self { pattern: None }
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(false, |pattern| pattern.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotfile_pattern() {
        let filter = NameFilter::new(r"^\.").unwrap();
        assert!(filter.excludes(".hidden"));
        assert!(!filter.excludes("visible"));
    }

    #[test]
    fn matches_anywhere_in_name() {
        let filter = NameFilter::new("tmp").unwrap();
        assert!(filter.excludes("notes.tmp.txt"));
        assert!(filter.excludes("tmp"));
        assert!(!filter.excludes("notes.txt"));
    }

    #[test]
    fn empty_pattern_keeps_everything() {
        let filter = NameFilter::new("").unwrap();
        assert!(!filter.excludes(".hidden"));
        assert!(!filter.excludes(""));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(NameFilter::new("(unclosed").is_err());
    }
}
