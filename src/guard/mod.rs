//! Access decision evaluator
//!
//! Decides whether a navigation attempt may proceed, given the rule attached
//! to the route and the current permission snapshot.
//!
//! # Decision order
//!
//! | Step | Check | Outcome |
//! |------|-------|---------|
//! | 1 | `except` resolves true | Deny; `only` is not evaluated |
//! | 2 | `only` absent | Grant |
//! | 3 | `only` resolves | Grant if true, deny otherwise |
//! | 4 | Deny + `redirect_to` | Signal the navigator once |
//!
//! # Example
//!
//! ```ignore
//! use route_permits::guard::{AccessEvaluator, ChannelNavigator};
//!
//! let (navigator, mut redirects) = ChannelNavigator::new();
//! let evaluator = AccessEvaluator::new(store.clone(), Arc::new(navigator));
//!
//! let verdict = evaluator.evaluate(&rule, &route, &state).await?;
//! if !verdict.granted {
//!     if let Ok(request) = redirects.try_recv() {
//!         router.navigate(request.commands);
//!     }
//! }
//! ```

mod evaluator;
mod navigator;

pub use evaluator::{resolve_field, AccessEvaluator, Verdict};
pub use navigator::{ChannelNavigator, Navigator, NoopNavigator, RedirectRequest};
