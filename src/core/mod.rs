//! Core types for the route guard
//!
//! This module provides the fundamental types used throughout the crate:
//! - `RouteSnapshot` / `NavigationState` - Opaque context passed to resolvers
//! - `GuardError` - Error types

pub mod context;
pub mod error;

pub use context::{NavigationState, RouteSnapshot};
pub use error::{GuardError, GuardResult};
