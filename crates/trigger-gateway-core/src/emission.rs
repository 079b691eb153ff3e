//! Emission filtering for trigger names.
//!
//! A candidate is either `kind` or `kind:action`. It is emitted when any
//! configured pattern is the wildcard, equals `kind`, or equals the full
//! candidate. Listing a bare kind therefore admits all of its actions.

/// Pattern that admits every candidate.
pub const WILDCARD: &str = "*";

/// Case-insensitive allow-list of trigger names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionFilter {
    patterns: Vec<String>,
}

impl EmissionFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// A filter that emits everything.
    pub fn allow_all() -> Self {
        Self::new([WILDCARD])
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn should_emit(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        let kind = candidate
            .split_once(':')
            .map_or(candidate.as_str(), |(kind, _)| kind);

        self.patterns
            .iter()
            .any(|p| p == WILDCARD || *p == kind || *p == candidate)
    }
}

#[cfg(test)]
#[path = "emission_tests.rs"]
mod tests;
