pub mod core;
pub mod permissions;
pub mod rules;

// Decision algorithm
pub mod guard;

// Seed data and ambient setup
pub mod config;
pub mod logging;

pub use crate::config::GuardConfig;
pub use crate::core::{GuardError, GuardResult, NavigationState, RouteSnapshot};
pub use crate::guard::{AccessEvaluator, Verdict};
pub use crate::permissions::{PermissionStore, RoleDefinition};
pub use crate::rules::{Rule, RuleField};
