//! Access rules
//!
//! A rule attached to a route says who may enter it:
//!
//! | Field | Shapes | Meaning |
//! |-------|--------|---------|
//! | `only` | identifier, list, resolver | Required; any held identifier grants |
//! | `except` | identifier, list, resolver | Forbidden; any held identifier denies, checked first |
//! | `redirect_to` | path, segments | Navigation target on denial |
//!
//! # Example
//!
//! ```ignore
//! use route_permits::rules::{Rule, RuleField};
//!
//! let rule = Rule::new()
//!     .with_except(RuleField::from_fn(|route, _state| async move {
//!         Ok((route.param("id") == Some("archived")).into())
//!     }))
//!     .with_only(vec!["MANAGER", "ADMIN"])
//!     .with_redirect_to("./404");
//! ```

mod data;
mod resolver;
mod rule;
mod table;

pub use data::RuleData;
pub use resolver::{FnResolver, Resolution, Resolver, SyncFnResolver};
pub use rule::{FieldKind, RedirectTarget, Rule, RuleField};
pub use table::{RouteRule, RuleTable};
