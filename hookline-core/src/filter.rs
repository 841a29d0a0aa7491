//! URL scoping for plugin hooks
//!
//! Plugins rarely apply to every request. A [`UrlFilter`] narrows them down
//! with include and exclude pattern lists; exclusion always wins, and an
//! empty include list means "everything".

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// One matching rule against a request's full URL.
#[derive(Clone)]
pub enum UrlPattern {
    /// Substring containment.
    Contains(String),
    /// Regular-expression match.
    Matches(Regex),
    /// Arbitrary predicate.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
    /// Unconditional verdict.
    All(bool),
}

impl UrlPattern {
    fn is_match(&self, url: &str) -> bool {
        match self {
            UrlPattern::Contains(fragment) => url.contains(fragment.as_str()),
            UrlPattern::Matches(re) => re.is_match(url),
            UrlPattern::Predicate(pred) => pred(url),
            UrlPattern::All(verdict) => *verdict,
        }
    }
}

impl From<&str> for UrlPattern {
    fn from(fragment: &str) -> Self {
        UrlPattern::Contains(fragment.to_string())
    }
}

impl From<String> for UrlPattern {
    fn from(fragment: String) -> Self {
        UrlPattern::Contains(fragment)
    }
}

impl From<Regex> for UrlPattern {
    fn from(re: Regex) -> Self {
        UrlPattern::Matches(re)
    }
}

impl From<bool> for UrlPattern {
    fn from(verdict: bool) -> Self {
        UrlPattern::All(verdict)
    }
}

impl fmt::Debug for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Contains(fragment) => f.debug_tuple("Contains").field(fragment).finish(),
            UrlPattern::Matches(re) => f.debug_tuple("Matches").field(&re.as_str()).finish(),
            UrlPattern::Predicate(_) => f.write_str("Predicate(..)"),
            UrlPattern::All(verdict) => f.debug_tuple("All").field(verdict).finish(),
        }
    }
}

/// Include/exclude matcher over request URLs.
///
/// Precedence: any exclude match rejects; otherwise any include match (or an
/// empty include list) accepts.
#[derive(Clone, Debug, Default)]
pub struct UrlFilter {
    includes: Vec<UrlPattern>,
    excludes: Vec<UrlPattern>,
}

impl UrlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn include(mut self, pattern: impl Into<UrlPattern>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<UrlPattern>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    #[must_use]
    pub fn with_patterns(includes: Vec<UrlPattern>, excludes: Vec<UrlPattern>) -> Self {
        Self { includes, excludes }
    }

    pub fn is_match(&self, url: &str) -> bool {
        if self.excludes.iter().any(|p| p.is_match(url)) {
            return false;
        }
        if self.includes.is_empty() {
            return true;
        }
        self.includes.iter().any(|p| p.is_match(url))
    }
}
