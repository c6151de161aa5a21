//! Resolver trait definition
//!
//! A resolver is a rule field expressed as custom logic. It receives the
//! route and navigation context and produces a [`Resolution`], either
//! immediately or after awaiting some other work.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;

use crate::core::{NavigationState, RouteSnapshot};
use crate::permissions::PermissionSnapshot;

/// Value produced by a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The predicate outcome itself; no membership lookup follows
    Decision(bool),
    /// A single identifier to test against the held permissions
    Identifier(String),
    /// Identifiers to test; any held one satisfies the predicate
    Identifiers(Vec<String>),
}

impl Resolution {
    /// Classify this value against a permission snapshot
    pub fn is_satisfied_by(&self, snapshot: &PermissionSnapshot) -> bool {
        match self {
            Resolution::Decision(decision) => *decision,
            Resolution::Identifier(id) => snapshot.contains(id),
            Resolution::Identifiers(ids) => snapshot.contains_any(ids),
        }
    }
}

impl From<bool> for Resolution {
    fn from(decision: bool) -> Self {
        Resolution::Decision(decision)
    }
}

impl From<&str> for Resolution {
    fn from(id: &str) -> Self {
        Resolution::Identifier(id.to_string())
    }
}

impl From<String> for Resolution {
    fn from(id: String) -> Self {
        Resolution::Identifier(id)
    }
}

impl From<Vec<String>> for Resolution {
    fn from(ids: Vec<String>) -> Self {
        Resolution::Identifiers(ids)
    }
}

impl From<Vec<&str>> for Resolution {
    fn from(ids: Vec<&str>) -> Self {
        Resolution::Identifiers(ids.into_iter().map(String::from).collect())
    }
}

/// Trait for dynamic rule fields
///
/// Invoked fresh on every evaluation; results are never cached. Errors
/// propagate to the caller of the evaluator unchanged.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve the field for one navigation attempt
    async fn resolve(&self, route: &RouteSnapshot, state: &NavigationState) -> Result<Resolution>;
}

/// A resolver created from an async closure
///
/// The context values are cloned into the closure so the returned future
/// can own them:
///
/// ```ignore
/// let resolver = FnResolver::new(|route, _state| async move {
///     if route.path().contains("44") {
///         Ok(vec!["MANAGER"].into())
///     } else {
///         Ok("notManager".into())
///     }
/// });
/// ```
pub struct FnResolver<F> {
    func: F,
}

impl<F> FnResolver<F> {
    /// Create a new async function-based resolver
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(RouteSnapshot, NavigationState) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Resolution>> + Send + 'static,
    {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(RouteSnapshot, NavigationState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resolution>> + Send + 'static,
{
    async fn resolve(&self, route: &RouteSnapshot, state: &NavigationState) -> Result<Resolution> {
        (self.func)(route.clone(), state.clone()).await
    }
}

/// A resolver created from a plain closure
///
/// Use this when the answer is available without awaiting anything.
pub struct SyncFnResolver<F> {
    func: F,
}

impl<F> SyncFnResolver<F>
where
    F: Fn(&RouteSnapshot, &NavigationState) -> Result<Resolution> + Send + Sync,
{
    /// Create a new synchronous function-based resolver
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Resolver for SyncFnResolver<F>
where
    F: Fn(&RouteSnapshot, &NavigationState) -> Result<Resolution> + Send + Sync,
{
    async fn resolve(&self, route: &RouteSnapshot, state: &NavigationState) -> Result<Resolution> {
        (self.func)(route, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionStore;

    #[test]
    fn test_resolution_classification() {
        let store = PermissionStore::with_grants(["MANAGER"], Vec::new());
        let snapshot = store.snapshot();

        assert!(Resolution::from(true).is_satisfied_by(&snapshot));
        assert!(!Resolution::from(false).is_satisfied_by(&snapshot));
        assert!(Resolution::from("MANAGER").is_satisfied_by(&snapshot));
        assert!(!Resolution::from("notManager").is_satisfied_by(&snapshot));
        assert!(Resolution::from(vec!["X", "MANAGER"]).is_satisfied_by(&snapshot));
        assert!(!Resolution::from(Vec::<String>::new()).is_satisfied_by(&snapshot));
    }

    #[test]
    fn test_decision_skips_membership() {
        // A `true` decision stands even when nothing is held
        let snapshot = PermissionStore::new().snapshot();
        assert!(Resolution::Decision(true).is_satisfied_by(&snapshot));
    }

    #[tokio::test]
    async fn test_fn_resolver_receives_context() {
        let resolver = FnResolver::new(|route: RouteSnapshot, state: NavigationState| async move {
            Ok(Resolution::from(format!("{}@{}", route.path, state.url)))
        });

        let result = resolver
            .resolve(&RouteSnapshot::new("crisis-center/44"), &NavigationState::new("/home"))
            .await
            .unwrap();
        assert_eq!(result, Resolution::Identifier("crisis-center/44@/home".into()));
    }

    #[tokio::test]
    async fn test_sync_fn_resolver_error() {
        let resolver = SyncFnResolver::new(|_route: &RouteSnapshot, _state: &NavigationState| {
            Err(anyhow::anyhow!("lookup failed"))
        });

        let err = resolver
            .resolve(&RouteSnapshot::default(), &NavigationState::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed");
    }
}
