//! Guard configuration
//!
//! Seeds the permission store and the route rule table from JSON:
//!
//! ```json
//! {
//!   "permissions": ["READ"],
//!   "roles": [{ "name": "MANAGER", "permissions": ["APPROVE"] }],
//!   "routes": [
//!     { "pattern": "^admin", "rule": { "only": "ADMIN", "redirectTo": "./404" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::GuardResult;
use crate::permissions::{PermissionStore, RoleDefinition};
use crate::rules::{RuleData, RuleTable};

/// Rule bound to a route pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRuleConfig {
    /// Regex matched against the route path
    pub pattern: String,

    /// Rule data for matching routes
    #[serde(default)]
    pub rule: RuleData,
}

impl RouteRuleConfig {
    /// Create a route rule entry
    pub fn new(pattern: impl Into<String>, rule: RuleData) -> Self {
        Self {
            pattern: pattern.into(),
            rule,
        }
    }
}

/// Seed state for a guard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Permissions granted directly
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Roles held
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,

    /// Route rules, in match order
    #[serde(default)]
    pub routes: Vec<RouteRuleConfig>,
}

impl GuardConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> GuardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> GuardResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading guard configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Add a directly granted permission
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Add a role
    pub fn with_role(mut self, role: RoleDefinition) -> Self {
        self.roles.push(role);
        self
    }

    /// Add a route rule
    pub fn with_route(mut self, pattern: impl Into<String>, rule: RuleData) -> Self {
        self.routes.push(RouteRuleConfig::new(pattern, rule));
        self
    }

    /// Build a permission store holding the configured grants
    pub fn build_store(&self) -> PermissionStore {
        PermissionStore::with_grants(self.permissions.iter().cloned(), self.roles.clone())
    }

    /// Build the route rule table, validating every rule and pattern
    pub fn build_rule_table(&self) -> GuardResult<RuleTable> {
        let mut table = RuleTable::new();
        for route in &self.routes {
            let rule = route.rule.clone().into_rule()?;
            table.add(&route.pattern, rule)?;
        }
        tracing::info!("Built rule table with {} routes", table.len());
        Ok(table)
    }
}
