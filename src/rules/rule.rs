//! Rule types
//!
//! A [`Rule`] is the declarative access description attached to one route:
//! - `only`: permissions required for access
//! - `except`: permissions that force denial, checked first
//! - `redirect_to`: where to send the user when access is denied

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::resolver::{FnResolver, Resolution, Resolver, SyncFnResolver};
use crate::core::{NavigationState, RouteSnapshot};

/// Which rule field is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// The `only` field
    Only,
    /// The `except` field
    Except,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Only => write!(f, "only"),
            FieldKind::Except => write!(f, "except"),
        }
    }
}

/// One of the three shapes an `only`/`except` field can take
#[derive(Clone)]
pub enum RuleField {
    /// A single identifier
    Identifier(String),
    /// Several identifiers; any held one matches
    Identifiers(Vec<String>),
    /// Custom logic evaluated per navigation attempt
    Resolver(Arc<dyn Resolver>),
}

impl RuleField {
    /// Wrap a resolver implementation
    pub fn resolver<R: Resolver + 'static>(resolver: R) -> Self {
        RuleField::Resolver(Arc::new(resolver))
    }

    /// Build a field from an async closure
    pub fn from_fn<F, Fut>(func: F) -> Self
    where
        F: Fn(RouteSnapshot, NavigationState) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<Resolution>> + Send + 'static,
    {
        Self::resolver(FnResolver::new(func))
    }

    /// Build a field from a plain closure
    pub fn from_sync_fn<F>(func: F) -> Self
    where
        F: Fn(&RouteSnapshot, &NavigationState) -> anyhow::Result<Resolution>
            + Send
            + Sync
            + 'static,
    {
        Self::resolver(SyncFnResolver::new(func))
    }

    /// Check if this field needs a resolver call
    pub fn is_dynamic(&self) -> bool {
        matches!(self, RuleField::Resolver(_))
    }
}

impl fmt::Debug for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleField::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
            RuleField::Identifiers(ids) => f.debug_tuple("Identifiers").field(ids).finish(),
            RuleField::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for RuleField {
    fn from(id: &str) -> Self {
        RuleField::Identifier(id.to_string())
    }
}

impl From<String> for RuleField {
    fn from(id: String) -> Self {
        RuleField::Identifier(id)
    }
}

impl From<Vec<String>> for RuleField {
    fn from(ids: Vec<String>) -> Self {
        RuleField::Identifiers(ids)
    }
}

impl From<Vec<&str>> for RuleField {
    fn from(ids: Vec<&str>) -> Self {
        RuleField::Identifiers(ids.into_iter().map(String::from).collect())
    }
}

/// Where to navigate on denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedirectTarget {
    /// A single path string (e.g., "./404")
    Path(String),
    /// Path segments, passed to the host router as-is
    Segments(Vec<String>),
}

impl RedirectTarget {
    /// Navigation commands handed to the host router
    ///
    /// A single path becomes a one-element command list.
    pub fn commands(&self) -> Vec<String> {
        match self {
            RedirectTarget::Path(path) => vec![path.clone()],
            RedirectTarget::Segments(segments) => segments.clone(),
        }
    }

    /// Check if this target has nowhere to navigate to
    ///
    /// True for a blank path, an empty segment list, or a list containing a
    /// blank segment.
    pub fn is_empty(&self) -> bool {
        match self {
            RedirectTarget::Path(path) => path.trim().is_empty(),
            RedirectTarget::Segments(segments) => {
                segments.is_empty() || segments.iter().any(|s| s.trim().is_empty())
            }
        }
    }
}

impl From<&str> for RedirectTarget {
    fn from(path: &str) -> Self {
        RedirectTarget::Path(path.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(path: String) -> Self {
        RedirectTarget::Path(path)
    }
}

impl From<Vec<&str>> for RedirectTarget {
    fn from(segments: Vec<&str>) -> Self {
        RedirectTarget::Segments(segments.into_iter().map(String::from).collect())
    }
}

/// Access rule for one route
///
/// Both fields absent means no restriction.
///
/// ```ignore
/// let rule = Rule::new()
///     .with_except("MANAGER")
///     .with_only(vec!["ADMIN", "EDITOR"])
///     .with_redirect_to("./404");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Permissions required for access
    pub only: Option<RuleField>,
    /// Permissions that forbid access
    pub except: Option<RuleField>,
    /// Redirect target used on denial
    pub redirect_to: Option<RedirectTarget>,
}

impl Rule {
    /// Create an unrestricted rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `only` field
    pub fn with_only(mut self, only: impl Into<RuleField>) -> Self {
        self.only = Some(only.into());
        self
    }

    /// Set the `except` field
    pub fn with_except(mut self, except: impl Into<RuleField>) -> Self {
        self.except = Some(except.into());
        self
    }

    /// Set the redirect target; an empty target clears it
    pub fn with_redirect_to(mut self, target: impl Into<RedirectTarget>) -> Self {
        let target = target.into();
        self.redirect_to = if target.is_empty() { None } else { Some(target) };
        self
    }

    /// Check if neither `only` nor `except` is set
    pub fn is_unrestricted(&self) -> bool {
        self.only.is_none() && self.except.is_none()
    }

    /// Get a field by kind
    pub fn field(&self, kind: FieldKind) -> Option<&RuleField> {
        match kind {
            FieldKind::Only => self.only.as_ref(),
            FieldKind::Except => self.except.as_ref(),
        }
    }
}
