//! Access decision evaluator
//!
//! Resolves a [`Rule`] against a permission snapshot:
//! 1. `except`, if present; a match denies and `only` is never looked at
//! 2. `only`, if present; absent means no restriction
//! 3. On denial with a redirect target, signal the navigator

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use super::navigator::{Navigator, RedirectRequest};
use crate::core::{GuardError, GuardResult, NavigationState, RouteSnapshot};
use crate::permissions::{PermissionSnapshot, PermissionStore};
use crate::rules::{FieldKind, Rule, RuleField, RuleTable};

/// Outcome of evaluating a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether navigation may proceed
    pub granted: bool,

    /// Redirect signalled to the navigator (denials with a target only)
    pub redirect: Option<RedirectRequest>,
}

impl Verdict {
    /// Navigation allowed
    pub fn grant() -> Self {
        Self {
            granted: true,
            redirect: None,
        }
    }

    /// Navigation blocked, no redirect
    pub fn deny() -> Self {
        Self {
            granted: false,
            redirect: None,
        }
    }

    /// Navigation blocked and redirected
    pub fn redirect(request: RedirectRequest) -> Self {
        Self {
            granted: false,
            redirect: Some(request),
        }
    }

    /// Check if navigation may proceed
    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// Resolve one rule field to a boolean against a snapshot
///
/// Identifiers and lists are membership tests (lists are OR-combined, so an
/// empty list never matches). Resolvers are invoked with the context and
/// their result is classified the same way, except that a boolean result is
/// used as-is.
pub async fn resolve_field(
    kind: FieldKind,
    field: &RuleField,
    snapshot: &PermissionSnapshot,
    route: &RouteSnapshot,
    state: &NavigationState,
) -> GuardResult<bool> {
    match field {
        RuleField::Identifier(id) => Ok(snapshot.contains(id)),
        RuleField::Identifiers(ids) => Ok(snapshot.contains_any(ids)),
        RuleField::Resolver(resolver) => {
            let resolution = resolver
                .resolve(route, state)
                .await
                .map_err(|source| GuardError::ResolutionFailed { field: kind, source })?;
            tracing::trace!("Resolver for `{}` produced {:?}", kind, resolution);
            Ok(resolution.is_satisfied_by(snapshot))
        }
    }
}

/// Evaluates route rules for navigation attempts
///
/// Cheap to share behind an `Arc`; concurrent evaluations only share the
/// store, and each one works from its own snapshot.
pub struct AccessEvaluator {
    store: Arc<PermissionStore>,
    navigator: Arc<dyn Navigator>,
}

impl AccessEvaluator {
    /// Create an evaluator over a store, signalling redirects to `navigator`
    pub fn new(store: Arc<PermissionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Get the permission store
    pub fn store(&self) -> &Arc<PermissionStore> {
        &self.store
    }

    /// Evaluate a rule for one navigation attempt
    ///
    /// The permission snapshot is taken once, before any resolver runs;
    /// store mutations during the evaluation do not affect it. A failing
    /// resolver aborts the evaluation with [`GuardError::ResolutionFailed`]
    /// and no redirect is signalled.
    pub async fn evaluate(
        &self,
        rule: &Rule,
        route: &RouteSnapshot,
        state: &NavigationState,
    ) -> GuardResult<Verdict> {
        let evaluation_id = Uuid::new_v4();
        let span = tracing::debug_span!("evaluate", %evaluation_id, path = %route.path());
        self.evaluate_inner(rule, route, state).instrument(span).await
    }

    async fn evaluate_inner(
        &self,
        rule: &Rule,
        route: &RouteSnapshot,
        state: &NavigationState,
    ) -> GuardResult<Verdict> {
        let snapshot = self.store.snapshot();

        let granted = match self.decide(rule, &snapshot, route, state).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(error = %e, "Rule evaluation failed");
                return Err(e);
            }
        };

        if granted {
            tracing::debug!(revision = snapshot.revision(), "Access granted");
            return Ok(Verdict::grant());
        }

        match &rule.redirect_to {
            Some(target) if !target.is_empty() => {
                let request = RedirectRequest::new(target.commands(), route.path());
                tracing::debug!(
                    revision = snapshot.revision(),
                    "Access denied, redirecting to {:?}",
                    request.commands
                );
                self.navigator.navigate(&request);
                Ok(Verdict::redirect(request))
            }
            _ => {
                tracing::debug!(revision = snapshot.revision(), "Access denied");
                Ok(Verdict::deny())
            }
        }
    }

    async fn decide(
        &self,
        rule: &Rule,
        snapshot: &PermissionSnapshot,
        route: &RouteSnapshot,
        state: &NavigationState,
    ) -> GuardResult<bool> {
        if let Some(except) = &rule.except {
            if resolve_field(FieldKind::Except, except, snapshot, route, state).await? {
                tracing::debug!("`except` matched, skipping `only`");
                return Ok(false);
            }
        }

        match &rule.only {
            Some(only) => resolve_field(FieldKind::Only, only, snapshot, route, state).await,
            None => Ok(true),
        }
    }

    /// Evaluate the rule registered for the route's path
    ///
    /// Routes without a rule are unrestricted.
    pub async fn evaluate_route(
        &self,
        table: &RuleTable,
        route: &RouteSnapshot,
        state: &NavigationState,
    ) -> GuardResult<Verdict> {
        match table.find(route.path()) {
            Some(rule) => self.evaluate(rule, route, state).await,
            None => {
                tracing::trace!("No rule for route {}", route.path());
                Ok(Verdict::grant())
            }
        }
    }
}

impl std::fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEvaluator")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{ChannelNavigator, NoopNavigator};
    use crate::permissions::RoleDefinition;
    use crate::rules::{RedirectTarget, Resolution};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::Notify;

    fn evaluator_with(
        permissions: &[&str],
    ) -> (AccessEvaluator, UnboundedReceiver<RedirectRequest>) {
        let store = Arc::new(PermissionStore::with_grants(
            permissions.iter().copied(),
            Vec::new(),
        ));
        let (navigator, rx) = ChannelNavigator::new();
        (AccessEvaluator::new(store, Arc::new(navigator)), rx)
    }

    fn route() -> RouteSnapshot {
        RouteSnapshot::new("crisis-center/44")
    }

    fn state() -> NavigationState {
        NavigationState::new("/crisis-center/44")
    }

    /// Resolver field that counts its invocations
    fn counting_field(calls: Arc<AtomicUsize>, result: Resolution) -> RuleField {
        RuleField::from_sync_fn(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(result.clone())
        })
    }

    async fn verdict(evaluator: &AccessEvaluator, rule: Rule) -> Verdict {
        evaluator.evaluate(&rule, &route(), &state()).await.unwrap()
    }

    // === only ===

    #[tokio::test]
    async fn test_only_matches() {
        let (evaluator, mut rx) = evaluator_with(&["ADMIN"]);

        let v = verdict(&evaluator, Rule::new().with_only("ADMIN")).await;
        assert!(v.is_granted());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_does_not_match() {
        let (evaluator, mut rx) = evaluator_with(&["ADMIN"]);

        let v = verdict(&evaluator, Rule::new().with_only("DOESNT MATCH")).await;
        assert_eq!(v, Verdict::deny());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_does_not_match_redirects() {
        let (evaluator, mut rx) = evaluator_with(&["ADMIN"]);

        let rule = Rule::new().with_only("DOESNT MATCH").with_redirect_to("./404");
        let v = verdict(&evaluator, rule).await;

        assert!(!v.granted);
        assert_eq!(v.redirect.as_ref().unwrap().commands, vec!["./404"]);
        assert_eq!(rx.try_recv().unwrap().commands, vec!["./404"]);
        // Exactly one signal
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_list_is_or() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);

        assert!(verdict(&evaluator, Rule::new().with_only(vec!["gg", "MANAGER"])).await.granted);
        assert!(!verdict(&evaluator, Rule::new().with_only(vec!["gg", "AWESOME"])).await.granted);
        assert!(!verdict(&evaluator, Rule::new().with_only(Vec::<String>::new())).await.granted);
    }

    #[tokio::test]
    async fn test_unrestricted_rule_grants() {
        let (evaluator, mut rx) = evaluator_with(&[]);

        let v = verdict(&evaluator, Rule::new().with_redirect_to("./404")).await;
        assert!(v.granted);
        assert!(v.redirect.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_grant_never_redirects() {
        let (evaluator, mut rx) = evaluator_with(&["ADMIN"]);

        let v = verdict(
            &evaluator,
            Rule::new().with_only("ADMIN").with_redirect_to("./404"),
        )
        .await;
        assert_eq!(v, Verdict::grant());
        assert!(rx.try_recv().is_err());
    }

    // === except ===

    #[tokio::test]
    async fn test_except_matches() {
        let (evaluator, mut rx) = evaluator_with(&["MANAGER"]);

        assert!(!verdict(&evaluator, Rule::new().with_except("MANAGER")).await.granted);
        assert!(
            !verdict(&evaluator, Rule::new().with_except(vec!["MANAGER", "Something else"]))
                .await
                .granted
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_except_matches_redirects() {
        let (evaluator, mut rx) = evaluator_with(&["MANAGER"]);

        let rule = Rule::new()
            .with_except(vec!["MANAGER", "Something else"])
            .with_redirect_to("./404");
        let v = verdict(&evaluator, rule).await;

        assert!(!v.granted);
        assert_eq!(rx.try_recv().unwrap().commands, vec!["./404"]);
    }

    #[tokio::test]
    async fn test_except_does_not_match() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);

        assert!(verdict(&evaluator, Rule::new().with_except("DOESNT MATCH")).await.granted);
        assert!(
            verdict(&evaluator, Rule::new().with_except(vec!["DOESNT MATCH", "AWESOME"]))
                .await
                .granted
        );
        assert!(verdict(&evaluator, Rule::new().with_except(Vec::<String>::new())).await.granted);
    }

    // === except and only together ===

    #[tokio::test]
    async fn test_except_wins_over_only() {
        let (evaluator, mut rx) = evaluator_with(&["MANAGER"]);

        let rule = Rule::new()
            .with_except("MANAGER")
            .with_only("AWESOME")
            .with_redirect_to("./404");
        let v = verdict(&evaluator, rule).await;

        assert!(!v.granted);
        assert_eq!(rx.try_recv().unwrap().commands, vec!["./404"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_except_wins_even_if_only_matches() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);

        let rule = Rule::new().with_except("MANAGER").with_only("MANAGER");
        assert!(!verdict(&evaluator, rule).await.granted);
    }

    #[tokio::test]
    async fn test_except_miss_falls_through_to_only() {
        let (evaluator, mut rx) = evaluator_with(&["MANAGER"]);

        let rule = Rule::new().with_except("DOESNT MATCH").with_only("MANAGER");
        assert!(verdict(&evaluator, rule).await.granted);

        let rule = Rule::new()
            .with_except(vec!["DOESNT MATCH", "AWESOME"])
            .with_only(vec!["MANAGER", "AWESOME"]);
        assert!(verdict(&evaluator, rule).await.granted);

        let rule = Rule::new()
            .with_except(vec!["DOESNT MATCH", "AWESOME"])
            .with_only(vec!["gg", "AWESOME"])
            .with_redirect_to("./404");
        assert!(!verdict(&evaluator, rule).await.granted);
        assert_eq!(rx.try_recv().unwrap().commands, vec!["./404"]);
    }

    #[tokio::test]
    async fn test_only_resolver_not_invoked_when_except_matches() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let rule = Rule::new()
            .with_except("MANAGER")
            .with_only(counting_field(calls.clone(), Resolution::Decision(true)));
        assert!(!verdict(&evaluator, rule).await.granted);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // === resolvers ===

    #[tokio::test]
    async fn test_resolver_uses_route_context() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);

        let only = RuleField::from_fn(|route: RouteSnapshot, _state: NavigationState| async move {
            if route.path().contains("44") {
                Ok(vec!["MANAGER"].into())
            } else {
                Ok("notManager".into())
            }
        });
        let except = RuleField::from_fn(|route: RouteSnapshot, _state: NavigationState| async move {
            if route.path().contains("doesntInclude") {
                Ok(vec!["MANAGER"].into())
            } else {
                Ok("notManager".into())
            }
        });

        let rule = Rule::new().with_except(except).with_only(only);
        assert!(verdict(&evaluator, rule).await.granted);
    }

    #[tokio::test]
    async fn test_resolver_miss_redirects() {
        let (evaluator, mut rx) = evaluator_with(&["MANAGER"]);

        let only = RuleField::from_sync_fn(|route, _| {
            if route.path().contains("gg") {
                Ok(vec!["MANAGER"].into())
            } else {
                Ok("notManager".into())
            }
        });

        let rule = Rule::new().with_only(only).with_redirect_to("/404");
        assert!(!verdict(&evaluator, rule).await.granted);
        assert_eq!(rx.try_recv().unwrap().commands, vec!["/404"]);
    }

    #[tokio::test]
    async fn test_resolver_boolean_is_trusted() {
        // Nothing held, yet a `true` decision satisfies the predicate directly
        let (evaluator, _rx) = evaluator_with(&[]);

        let rule = Rule::new().with_only(RuleField::from_sync_fn(|_, _| Ok(true.into())));
        assert!(verdict(&evaluator, rule).await.granted);

        let rule = Rule::new().with_except(RuleField::from_sync_fn(|_, _| Ok(true.into())));
        assert!(!verdict(&evaluator, rule).await.granted);
    }

    #[tokio::test]
    async fn test_resolver_invoked_every_evaluation() {
        let (evaluator, _rx) = evaluator_with(&["ADMIN"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let rule = Rule::new().with_only(counting_field(calls.clone(), "ADMIN".into()));
        assert!(verdict(&evaluator, rule.clone()).await.granted);
        assert!(verdict(&evaluator, rule).await.granted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolver_failure_propagates() {
        let (evaluator, mut rx) = evaluator_with(&["ADMIN"]);

        let except = RuleField::from_fn(|_route: RouteSnapshot, _state: NavigationState| async move {
            Err(anyhow::anyhow!("permission backend unavailable"))
        });
        let rule = Rule::new()
            .with_except(except)
            .with_only("ADMIN")
            .with_redirect_to("./404");

        let err = evaluator.evaluate(&rule, &route(), &state()).await.unwrap_err();
        assert!(matches!(
            err,
            GuardError::ResolutionFailed { field: FieldKind::Except, .. }
        ));
        // No redirect on failure
        assert!(rx.try_recv().is_err());
    }

    // === store interaction ===

    #[tokio::test]
    async fn test_roles_match_by_name_and_grant() {
        let store = Arc::new(PermissionStore::new());
        store.add_role(RoleDefinition::new("MANAGER", ["APPROVE"]));
        let (navigator, _rx) = ChannelNavigator::new();
        let evaluator = AccessEvaluator::new(store, Arc::new(navigator));

        assert!(verdict(&evaluator, Rule::new().with_only("MANAGER")).await.granted);
        assert!(verdict(&evaluator, Rule::new().with_only("APPROVE")).await.granted);
        assert!(!verdict(&evaluator, Rule::new().with_except("APPROVE")).await.granted);
    }

    #[tokio::test]
    async fn test_mutation_during_evaluation_is_not_retroactive() {
        let (evaluator, _rx) = evaluator_with(&["ADMIN"]);
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let (entered_tx, release_rx) = (entered.clone(), release.clone());
        let except = RuleField::from_fn(move |_route: RouteSnapshot, _state: NavigationState| {
            let (entered, release) = (entered_tx.clone(), release_rx.clone());
            async move {
                entered.notify_one();
                release.notified().await;
                Ok(false.into())
            }
        });
        let rule = Rule::new().with_except(except).with_only("ADMIN");
        let (route, state) = (route(), state());

        let (result, _) = tokio::join!(evaluator.evaluate(&rule, &route, &state), async {
            // Wait until the evaluation is suspended inside the resolver
            entered.notified().await;
            evaluator.store().remove_permission("ADMIN");
            release.notify_one();
        });

        // Snapshot was taken before ADMIN was removed
        assert!(result.unwrap().granted);
        assert!(!verdict(&evaluator, Rule::new().with_only("ADMIN")).await.granted);
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_are_independent() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);

        let slow = RuleField::from_fn(|route: RouteSnapshot, _state: NavigationState| async move {
            tokio::task::yield_now().await;
            Ok(Resolution::from(route.param("role").unwrap_or_default().to_string()))
        });
        let rule = Rule::new().with_only(slow);

        let routes: Vec<RouteSnapshot> = ["MANAGER", "GUEST", "MANAGER", "ADMIN"]
            .iter()
            .map(|role| RouteSnapshot::new("reports").with_param("role", *role))
            .collect();
        let nav = state();

        let verdicts = futures::future::join_all(
            routes.iter().map(|route| evaluator.evaluate(&rule, route, &nav)),
        )
        .await;

        let granted: Vec<bool> = verdicts.into_iter().map(|v| v.unwrap().granted).collect();
        assert_eq!(granted, vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn test_redirect_segments() {
        let (evaluator, mut rx) = evaluator_with(&[]);

        let rule = Rule::new()
            .with_only("ADMIN")
            .with_redirect_to(RedirectTarget::Segments(vec!["auth".into(), "login".into()]));
        let v = verdict(&evaluator, rule).await;

        let request = rx.try_recv().unwrap();
        assert_eq!(request.commands, vec!["auth", "login"]);
        assert_eq!(request.denied_path, "crisis-center/44");
        assert_eq!(v.redirect, Some(request));
    }

    #[tokio::test]
    async fn test_empty_redirect_target_never_signals() {
        let (evaluator, mut rx) = evaluator_with(&[]);

        // Fields set directly, bypassing the builder and the data parser
        for target in [
            RedirectTarget::Path(String::new()),
            RedirectTarget::Segments(Vec::new()),
        ] {
            let rule = Rule {
                only: Some("X".into()),
                except: None,
                redirect_to: Some(target),
            };
            assert_eq!(verdict(&evaluator, rule).await, Verdict::deny());
        }

        let rule = crate::rules::RuleData::parse(serde_json::json!({
            "only": "X",
            "redirectTo": ""
        }))
        .unwrap();
        assert_eq!(verdict(&evaluator, rule).await, Verdict::deny());

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_noop_navigator_still_reports_redirect() {
        let store = Arc::new(PermissionStore::new());
        let evaluator = AccessEvaluator::new(store, Arc::new(NoopNavigator));

        let v = verdict(&evaluator, Rule::new().with_only("ADMIN").with_redirect_to("./404")).await;
        assert_eq!(
            v,
            Verdict::redirect(RedirectRequest::new(vec!["./404".into()], "crisis-center/44"))
        );
    }

    #[tokio::test]
    async fn test_evaluate_route_uses_table() {
        let (evaluator, _rx) = evaluator_with(&["MANAGER"]);
        let mut table = RuleTable::new();
        table
            .add("^admin", Rule::new().with_only("ADMIN").with_redirect_to("./404"))
            .unwrap();

        let denied = evaluator
            .evaluate_route(&table, &RouteSnapshot::new("admin/users"), &state())
            .await
            .unwrap();
        assert!(!denied.granted);

        // No rule registered for this path
        let open = evaluator
            .evaluate_route(&table, &RouteSnapshot::new("home"), &state())
            .await
            .unwrap();
        assert!(open.granted);
    }
}
