//! Route guard demo
//!
//! Loads guard configuration (from the path given as the first argument, or
//! a built-in sample), then walks a few navigation attempts through the
//! evaluator and prints the verdicts and redirects.

use std::sync::Arc;

use route_permits::guard::{AccessEvaluator, ChannelNavigator};
use route_permits::logging::{self, LoggingConfig};
use route_permits::rules::{Resolution, RuleField};
use route_permits::{GuardConfig, NavigationState, RouteSnapshot, Rule};

const SAMPLE_CONFIG: &str = r#"{
    "permissions": ["READ"],
    "roles": [{ "name": "MANAGER", "permissions": ["APPROVE", "REVIEW"] }],
    "routes": [
        { "pattern": "^admin", "rule": { "only": "ADMIN", "redirectTo": "./404" } },
        { "pattern": "^reports", "rule": { "only": ["REVIEW", "ADMIN"] } },
        { "pattern": "^signup", "rule": { "except": "MANAGER", "redirectTo": ["home"] } }
    ]
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging(&LoggingConfig::default().with_level("route_permits=debug"))?;

    let config = match std::env::args().nth(1) {
        Some(path) => GuardConfig::load(path)?,
        None => GuardConfig::from_json_str(SAMPLE_CONFIG)?,
    };

    let store = Arc::new(config.build_store());
    let table = config.build_rule_table()?;

    let (navigator, mut redirects) = ChannelNavigator::new();
    let evaluator = AccessEvaluator::new(store.clone(), Arc::new(navigator));

    let state = NavigationState::new("/");
    for path in ["admin/users", "reports/q3", "signup", "home"] {
        let route = RouteSnapshot::new(path);
        let verdict = evaluator.evaluate_route(&table, &route, &state).await?;
        println!("{:<12} granted={}", path, verdict.granted);
    }

    // Dynamic rule: only the owner of a crisis may open it
    let owner_only = Rule::new()
        .with_only(RuleField::from_fn(|route: RouteSnapshot, _state: NavigationState| async move {
            let owner = route.param("owner").unwrap_or_default().to_string();
            Ok(Resolution::from(format!("OWNER:{}", owner)))
        }))
        .with_redirect_to("./404");

    store.add_permission("OWNER:alice");
    for owner in ["alice", "bob"] {
        let route = RouteSnapshot::new("crisis-center/44").with_param("owner", owner);
        let verdict = evaluator.evaluate(&owner_only, &route, &state).await?;
        println!("crisis-center/44 owner={:<6} granted={}", owner, verdict.granted);
    }

    // Logout: later evaluations see the empty store
    store.flush();
    let verdict = evaluator
        .evaluate_route(&table, &RouteSnapshot::new("reports/q3"), &state)
        .await?;
    println!("after logout reports/q3 granted={}", verdict.granted);

    while let Ok(request) = redirects.try_recv() {
        println!("redirect from {} to {:?}", request.denied_path, request.commands);
    }

    Ok(())
}
