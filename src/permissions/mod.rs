//! Permission store
//!
//! Single source of truth for what the current actor may do:
//! - **Permissions**: identifiers granted directly
//! - **Roles**: named groups expanding to a set of permissions (one level)
//!
//! ## Example
//!
//! ```rust,ignore
//! use route_permits::permissions::{PermissionStore, RoleDefinition};
//! use std::sync::Arc;
//!
//! let store = Arc::new(PermissionStore::new());
//! store.add(["ADMIN"]);
//! store.add_role(RoleDefinition::new("MANAGER", ["APPROVE", "REVIEW"]));
//!
//! let snapshot = store.snapshot();
//! assert!(snapshot.contains("APPROVE"));
//! assert!(snapshot.contains("MANAGER"));
//! ```

mod store;

pub use store::{PermissionSnapshot, PermissionStore, RoleDefinition};
