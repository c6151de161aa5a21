//! Declarative rule data
//!
//! Routes carry their rule as plain data, e.g.
//! `{ "only": ["ADMIN", "EDITOR"], "except": "GUEST", "redirectTo": "./404" }`.
//! [`RuleData`] is that serialized form; converting it into a [`Rule`]
//! checks that every field has a supported shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rule::{FieldKind, RedirectTarget, Rule, RuleField};
use crate::core::{GuardError, GuardResult};

/// Serialized form of a static rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleData {
    /// Identifier or list of identifiers required for access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Value>,

    /// Identifier or list of identifiers that forbid access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<Value>,

    /// Path string or list of path segments
    #[serde(
        default,
        rename = "redirectTo",
        alias = "redirect_to",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_to: Option<Value>,
}

impl RuleData {
    /// Parse rule data from a JSON value and validate it
    pub fn parse(value: Value) -> GuardResult<Rule> {
        let data: RuleData = serde_json::from_value(value)?;
        data.into_rule()
    }

    /// Validate and convert into a [`Rule`]
    pub fn into_rule(self) -> GuardResult<Rule> {
        Ok(Rule {
            only: parse_field(FieldKind::Only, self.only)?,
            except: parse_field(FieldKind::Except, self.except)?,
            redirect_to: parse_redirect(self.redirect_to)?,
        })
    }
}

impl TryFrom<RuleData> for Rule {
    type Error = GuardError;

    fn try_from(data: RuleData) -> GuardResult<Self> {
        data.into_rule()
    }
}

/// Collect a JSON array into strings, or `None` if any element is not a string
fn string_list(items: Vec<Value>) -> Option<Vec<String>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn parse_field(kind: FieldKind, value: Option<Value>) -> GuardResult<Option<RuleField>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(RuleField::Identifier(id))),
        Some(Value::Array(items)) => string_list(items)
            .map(|ids| Some(RuleField::Identifiers(ids)))
            .ok_or_else(|| {
                GuardError::malformed(format!("`{}` array must contain only strings", kind))
            }),
        Some(other) => Err(GuardError::malformed(format!(
            "`{}` must be a string or an array of strings, got {}",
            kind,
            json_kind(&other)
        ))),
    }
}

fn parse_redirect(value: Option<Value>) -> GuardResult<Option<RedirectTarget>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        // An empty path means "no redirect"
        Some(Value::String(path)) if path.trim().is_empty() => Ok(None),
        Some(Value::String(path)) => Ok(Some(RedirectTarget::Path(path))),
        Some(Value::Array(items)) => {
            let segments = string_list(items)
                .ok_or_else(|| GuardError::malformed("`redirectTo` segments must be strings"))?;
            if segments.is_empty() || segments.iter().any(|s| s.trim().is_empty()) {
                return Err(GuardError::malformed(
                    "`redirectTo` segments must be a non-empty list of non-blank paths",
                ));
            }
            Ok(Some(RedirectTarget::Segments(segments)))
        }
        Some(other) => Err(GuardError::malformed(format!(
            "`redirectTo` must be a path or an array of path segments, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
