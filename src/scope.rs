//! # Scopes
//!
//! A scope is a named key/value source outside the decoded payload: request
//! parameters, request attributes, the session, headers and so on. Mapping
//! slots that declare a scope other than [`ScopeType::Param`] read their raw
//! values from the matching provider in the per-call [`Scopes`] registry.
//!
//! ```rust
//! use brutos::scope::{MapScope, ScopeType, Scopes};
//! use serde_json::json;
//!
//! let mut session = MapScope::new();
//! session.insert("user", json!("ana"));
//!
//! let scopes = Scopes::new().with(ScopeType::Session, session);
//! assert!(scopes.get(ScopeType::Session).is_some());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The scopes a mapping slot can read from.
///
/// `Param` is special: param-scoped slots read from the payload being decoded
/// rather than from a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    #[default]
    Param,
    Request,
    Session,
    Application,
    Header,
    Flash,
    Controller,
}

impl ScopeType {
    pub const ALL: [ScopeType; 7] = [
        ScopeType::Param,
        ScopeType::Request,
        ScopeType::Session,
        ScopeType::Application,
        ScopeType::Header,
        ScopeType::Flash,
        ScopeType::Controller,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeType::Param => "param",
            ScopeType::Request => "request",
            ScopeType::Session => "session",
            ScopeType::Application => "application",
            ScopeType::Header => "header",
            ScopeType::Flash => "flash",
            ScopeType::Controller => "controller",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ScopeType::ALL
            .into_iter()
            .find(|scope| scope.as_str() == lower)
            .ok_or_else(|| format!("unknown scope: {s}"))
    }
}

/// An external source of raw values.
pub trait Scope: Send + Sync {
    /// Look up a single value by parameter name.
    fn get(&self, name: &str) -> Option<Value>;

    /// Look up a sequence by parameter name.
    ///
    /// The default wraps a single value into a one-element sequence, which
    /// matches how multi-valued sources (query strings, headers) behave when
    /// the name occurs once.
    fn get_collection(&self, name: &str) -> Option<Vec<Value>> {
        match self.get(name)? {
            Value::Array(items) => Some(items),
            Value::Null => None,
            other => Some(vec![other]),
        }
    }
}

/// In-memory [`Scope`] backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapScope {
    values: HashMap<String, Value>,
}

impl MapScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Build a scope from the members of a JSON object; other values give an
    /// empty scope.
    #[must_use]
    pub fn from_object(value: &Value) -> Self {
        let values = value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self { values }
    }
}

impl Scope for MapScope {
    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Per-call registry of scope providers.
#[derive(Clone, Default)]
pub struct Scopes {
    providers: HashMap<ScopeType, Arc<dyn Scope>>,
}

impl Scopes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scope: ScopeType, provider: impl Scope + 'static) {
        self.providers.insert(scope, Arc::new(provider));
    }

    pub fn register_shared(&mut self, scope: ScopeType, provider: Arc<dyn Scope>) {
        self.providers.insert(scope, provider);
    }

    #[must_use]
    pub fn with(mut self, scope: ScopeType, provider: impl Scope + 'static) -> Self {
        self.register(scope, provider);
        self
    }

    #[must_use]
    pub fn get(&self, scope: ScopeType) -> Option<&dyn Scope> {
        self.providers.get(&scope).map(|p| p.as_ref())
    }

    pub fn registered(&self) -> impl Iterator<Item = ScopeType> + '_ {
        self.providers.keys().copied()
    }
}

impl fmt::Debug for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Scopes").field("providers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_type_round_trip() {
        for scope in ScopeType::ALL {
            assert_eq!(scope.to_string().parse::<ScopeType>().unwrap(), scope);
        }
        assert_eq!("SESSION".parse::<ScopeType>().unwrap(), ScopeType::Session);
        assert!("cookie".parse::<ScopeType>().is_err());
    }

    #[test]
    fn test_get_collection_wraps_single_value() {
        let scope = MapScope::new()
            .with("tags", json!(["a", "b"]))
            .with("one", json!("x"))
            .with("none", Value::Null);
        assert_eq!(scope.get_collection("tags"), Some(vec![json!("a"), json!("b")]));
        assert_eq!(scope.get_collection("one"), Some(vec![json!("x")]));
        assert_eq!(scope.get_collection("none"), None);
        assert_eq!(scope.get_collection("missing"), None);
    }

    #[test]
    fn test_scopes_registry() {
        let scopes = Scopes::new().with(
            ScopeType::Header,
            MapScope::from_object(&json!({"x-id": "7"})),
        );
        let header = scopes.get(ScopeType::Header).unwrap();
        assert_eq!(header.get("x-id"), Some(json!("7")));
        assert!(scopes.get(ScopeType::Session).is_none());
        assert_eq!(format!("{scopes:?}"), "Scopes { providers: [\"header\"] }");
    }
}
