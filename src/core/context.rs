//! Navigation context handed to resolver functions
//!
//! The evaluator never looks inside these values; it only passes them
//! through to resolvers. Hosts fill them with whatever their router knows
//! about the navigation attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// RouteSnapshot - The route being activated
// ============================================================================

/// Snapshot of the route a navigation attempt is targeting
///
/// # Example
///
/// ```ignore
/// let route = RouteSnapshot::new("crisis-center/44")
///     .with_param("id", "44")
///     .with_data(serde_json::json!({ "path": "crisis-center/44" }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    /// Route path as configured by the host (e.g., "crisis-center/44")
    pub path: String,

    /// Path parameters extracted by the host router
    #[serde(default)]
    pub params: HashMap<String, String>,

    /// Arbitrary route data attached by the host
    #[serde(default)]
    pub data: Value,
}

impl RouteSnapshot {
    /// Create a snapshot for a route path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: HashMap::new(),
            data: Value::Null,
        }
    }

    /// Add a path parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attach route data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Get the route path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a path parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    /// Split the path into its non-empty segments
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

// ============================================================================
// NavigationState - The router state for the attempt
// ============================================================================

/// Router state at the time of the navigation attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Full target URL of the navigation
    pub url: String,

    /// Host-specific extras
    #[serde(default)]
    pub extras: Value,
}

impl NavigationState {
    /// Create state for a target URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extras: Value::Null,
        }
    }

    /// Attach host-specific extras
    pub fn with_extras(mut self, extras: Value) -> Self {
        self.extras = extras;
        self
    }
}
