//! Route rule table
//!
//! Maps route paths to rules by regex pattern. The first matching entry
//! wins, so register more specific patterns first.

use regex::Regex;

use super::rule::Rule;
use crate::core::{GuardError, GuardResult};

/// A rule bound to a route path pattern
pub struct RouteRule {
    /// Regex pattern matched against the route path
    pattern: Regex,

    /// The rule applied to matching routes
    rule: Rule,
}

impl RouteRule {
    /// Create an entry with a regex pattern
    ///
    /// Pattern examples:
    /// - `"^admin$"` - only the admin route
    /// - `"^crisis-center/\\d+$"` - crisis-center detail routes
    /// - `"^reports/"` - everything under reports
    pub fn new(pattern: &str, rule: Rule) -> GuardResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            GuardError::invalid_config(format!("invalid route pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { pattern, rule })
    }

    /// Check if this entry applies to a route path
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// The pattern source
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The rule for matching routes
    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl std::fmt::Debug for RouteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRule")
            .field("pattern", &self.pattern.as_str())
            .field("rule", &self.rule)
            .finish()
    }
}

/// Ordered collection of route rules
#[derive(Debug, Default)]
pub struct RuleTable {
    entries: Vec<RouteRule>,
}

impl RuleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for a route pattern
    pub fn add(&mut self, pattern: &str, rule: Rule) -> GuardResult<&mut Self> {
        tracing::debug!("Registering route rule: {}", pattern);
        self.entries.push(RouteRule::new(pattern, rule)?);
        Ok(self)
    }

    /// Add a pre-built entry
    pub fn add_entry(&mut self, entry: RouteRule) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Find the rule for a route path
    pub fn find(&self, path: &str) -> Option<&Rule> {
        self.entries
            .iter()
            .find(|entry| entry.matches(path))
            .map(|entry| entry.rule())
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered patterns, in match order
    pub fn patterns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.pattern()).collect()
    }
}
