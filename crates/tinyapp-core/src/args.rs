//! Pending and resolved arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tinyapp_router::Params;
use tracing::debug;

use crate::capability::{downcast, Shared};
use crate::di::Inject;
use crate::error::{DispatchError, DispatchResult};

/// Named candidate values for argument binding.
///
/// Built once per request from the query string, then overlaid with the
/// route params: a route param replaces a query value of the same name.
///
/// # Example
///
/// ```
/// use tinyapp_core::PendingArgs;
/// use tinyapp_router::Params;
/// use serde_json::json;
///
/// let pending = PendingArgs::from_query("id=7&sort=asc")
///     .with_route_params(&Params::new().with("id", "42"));
///
/// assert_eq!(pending.get("id"), Some(&json!("42")));
/// assert_eq!(pending.get("sort"), Some(&json!("asc")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingArgs {
    values: HashMap<String, Value>,
}

impl PendingArgs {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded query string. Later duplicates win.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(err) => {
                debug!(error = %err, "ignoring malformed query string");
                Self::new()
            }
        }
    }

    /// Sets a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Overlays route params; they replace same-named values.
    pub fn merge_route_params(&mut self, params: &Params) {
        for (name, value) in params {
            self.values
                .insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    /// Builder-style [`merge_route_params`](Self::merge_route_params).
    #[must_use]
    pub fn with_route_params(mut self, params: &Params) -> Self {
        self.merge_route_params(params);
        self
    }

    /// Returns a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True if a value exists under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PendingArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One bound argument.
#[derive(Clone)]
pub enum Arg {
    /// A plain value from the pending set or a default.
    Value(Value),
    /// A service from the registry or the request scope.
    Service(Shared),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Service(_) => f.write_str("Service(..)"),
        }
    }
}

/// The resolved argument list handed to a handler, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    entries: Vec<(String, Arg)>,
}

impl Args {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: String, arg: Arg) {
        self.entries.push((name, arg));
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the callable takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Argument names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns an argument by name.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Arg> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, arg)| arg)
    }

    /// Returns an argument by position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Arg> {
        self.entries.get(index).map(|(_, arg)| arg)
    }

    /// Returns a plain value by name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.arg(name)? {
            Arg::Value(value) => Some(value),
            Arg::Service(_) => None,
        }
    }

    /// Deserializes a plain value.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> DispatchResult<T> {
        let expected = std::any::type_name::<T>();
        match self.arg(name) {
            None => Err(DispatchError::unresolvable(name)),
            Some(Arg::Service(_)) => Err(DispatchError::invalid_argument(name, expected, "a service")),
            Some(Arg::Value(value)) => serde_json::from_value(value.clone())
                .map_err(|err| DispatchError::invalid_argument(name, expected, err.to_string())),
        }
    }

    /// Returns a service argument.
    pub fn service<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DispatchResult<Arc<T>> {
        let expected = std::any::type_name::<T>();
        match self.arg(name) {
            None => Err(DispatchError::unresolvable(name)),
            Some(Arg::Value(value)) => Err(DispatchError::invalid_argument(
                name,
                expected,
                value.to_string(),
            )),
            Some(Arg::Service(shared)) => downcast::<T>(shared)
                .ok_or_else(|| DispatchError::invalid_argument(name, expected, "another service")),
        }
    }

    /// Returns a service argument if one was bound.
    #[must_use]
    pub fn try_service<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        match self.arg(name)? {
            Arg::Service(shared) => downcast::<T>(shared),
            Arg::Value(_) => None,
        }
    }

    /// Returns a service argument wrapped in [`Inject`].
    pub fn inject<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DispatchResult<Inject<T>> {
        self.service::<T>(name).map(Inject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::share;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_from_query() {
        let pending = PendingArgs::from_query("a=1&b=hello%20world&a=2");
        assert_eq!(pending.get("a"), Some(&json!("2")));
        assert_eq!(pending.get("b"), Some(&json!("hello world")));
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_from_empty_query() {
        assert!(PendingArgs::from_query("").is_empty());
    }

    #[test]
    fn test_route_params_override_query() {
        let pending =
            PendingArgs::from_query("id=7").with_route_params(&Params::new().with("id", "42"));
        assert_eq!(pending.get("id"), Some(&json!("42")));
    }

    #[test]
    fn test_args_get() {
        let mut args = Args::default();
        args.push("id".into(), Arg::Value(json!(42)));
        args.push("tags".into(), Arg::Value(json!(["a", "b"])));

        assert_eq!(args.get::<i64>("id").unwrap(), 42);
        assert_eq!(args.get::<Vec<String>>("tags").unwrap(), vec!["a", "b"]);
        assert!(matches!(
            args.get::<i64>("missing"),
            Err(DispatchError::UnresolvableArgument { .. })
        ));
        assert!(matches!(
            args.get::<i64>("tags"),
            Err(DispatchError::InvalidArgument { .. })
        ));
        assert_eq!(args.names().collect::<Vec<_>>(), ["id", "tags"]);
    }

    #[test]
    fn test_args_service() {
        #[derive(Debug)]
        struct Clock(u64);

        let mut args = Args::default();
        args.push("clock".into(), Arg::Service(share(Arc::new(Clock(9)))));
        args.push("n".into(), Arg::Value(json!(1)));

        assert_eq!(args.service::<Clock>("clock").unwrap().0, 9);
        assert_eq!(args.inject::<Clock>("clock").unwrap().0.0, 9);
        assert!(args.service::<String>("clock").is_err());
        assert!(args.service::<Clock>("n").is_err());
        assert!(args.try_service::<Clock>("n").is_none());
        assert!(args.value("clock").is_none());
    }

    proptest! {
        #[test]
        fn prop_route_param_always_wins(
            name in "[a-z]{1,8}",
            query_value in "[a-zA-Z0-9]{0,8}",
            route_value in "[a-zA-Z0-9]{1,8}",
        ) {
            let query = format!("{name}={query_value}");
            let pending = PendingArgs::from_query(&query)
                .with_route_params(&Params::new().with(name.clone(), route_value.clone()));

            prop_assert_eq!(pending.get(&name), Some(&Value::String(route_value)));
            prop_assert_eq!(pending.len(), 1);
        }
    }
}
