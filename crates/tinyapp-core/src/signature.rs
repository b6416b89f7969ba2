//! Parameter descriptors for autowired callables.
//!
//! A [`Signature`] lists the parameters a handler expects, in order. Each
//! [`Param`] has a name, a [`ParamKind`] and an optional default; the
//! argument resolver walks the list and binds every parameter from the
//! registry, the pending arguments or the default.

use serde_json::Value;

use crate::capability::Capability;
use crate::error::{DispatchError, DispatchResult};

/// Scalar types a pending value can be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
}

impl ScalarType {
    /// Type name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// Coerces a pending value for parameter `param`.
    ///
    /// Strings are parsed; numbers and booleans convert where the
    /// conversion is lossless. Booleans accept `1/true/on/yes` and
    /// `0/false/off/no/""` (case-insensitive).
    pub fn coerce(self, param: &str, value: &Value) -> DispatchResult<Value> {
        let invalid = || DispatchError::invalid_argument(param, self.name(), display(value));

        match (self, value) {
            (Self::Int, Value::Number(n)) if n.is_i64() => Ok(value.clone()),
            (Self::Int, Value::String(s)) => {
                s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid())
            }
            (Self::Int, Value::Bool(b)) => Ok(Value::from(i64::from(*b))),

            (Self::Float, Value::Number(n)) => n.as_f64().map(Value::from).ok_or_else(invalid),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from)
                .ok_or_else(invalid),

            (Self::Bool, Value::Bool(_)) => Ok(value.clone()),
            (Self::Bool, Value::String(s)) => parse_bool(s).map(Value::Bool).ok_or_else(invalid),
            (Self::Bool, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(invalid()),
            },

            (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            _ => Err(invalid()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

/// What a parameter asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Any pending value, bound as is.
    Untyped,
    /// A pending value coerced to a scalar type.
    Scalar(ScalarType),
    /// A service resolved from the registry or the request scope.
    Capability(Capability),
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
}

impl Param {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// A parameter bound to any pending value.
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Untyped)
    }

    /// A scalar parameter.
    #[must_use]
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(name, ParamKind::Scalar(ty))
    }

    /// An integer parameter.
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Int)
    }

    /// A float parameter.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Float)
    }

    /// A boolean parameter.
    #[must_use]
    pub fn bool(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::Bool)
    }

    /// A string parameter.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::String)
    }

    /// A service parameter resolved by capability `T`.
    #[must_use]
    pub fn inject<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Capability(Capability::of::<T>()))
    }

    /// Sets the value used when nothing else binds the parameter.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Defaults the parameter to `null`.
    #[must_use]
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter kind.
    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Declared default.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// The ordered parameter list of a callable.
///
/// # Example
///
/// ```
/// use tinyapp_core::{Param, Signature};
///
/// let signature = Signature::new()
///     .param(Param::int("id"))
///     .param(Param::string("format").with_default("json"));
///
/// assert_eq!(signature.len(), 2);
/// assert_eq!(signature.params()[1].name(), "format");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// An empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True for a parameterless callable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<Param> for Signature {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Param>> for Signature {
    fn from(params: Vec<Param>) -> Self {
        Self { params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_coercion() {
        assert_eq!(ScalarType::Int.coerce("id", &json!("42")).unwrap(), json!(42));
        assert_eq!(ScalarType::Int.coerce("id", &json!(" -7 ")).unwrap(), json!(-7));
        assert_eq!(ScalarType::Int.coerce("id", &json!(3)).unwrap(), json!(3));
        assert_eq!(ScalarType::Int.coerce("id", &json!(true)).unwrap(), json!(1));
        assert!(ScalarType::Int.coerce("id", &json!("4.5")).is_err());
        assert!(ScalarType::Int.coerce("id", &json!(4.5)).is_err());
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(ScalarType::Float.coerce("x", &json!("1.5")).unwrap(), json!(1.5));
        assert_eq!(ScalarType::Float.coerce("x", &json!(2)).unwrap(), json!(2.0));
        assert!(ScalarType::Float.coerce("x", &json!("NaN")).is_err());
        assert!(ScalarType::Float.coerce("x", &json!("abc")).is_err());
    }

    #[test]
    fn test_bool_coercion() {
        for truthy in ["1", "true", "ON", "yes"] {
            assert_eq!(ScalarType::Bool.coerce("b", &json!(truthy)).unwrap(), json!(true));
        }
        for falsy in ["0", "false", "off", "No", ""] {
            assert_eq!(ScalarType::Bool.coerce("b", &json!(falsy)).unwrap(), json!(false));
        }
        assert!(ScalarType::Bool.coerce("b", &json!("maybe")).is_err());
        assert!(ScalarType::Bool.coerce("b", &json!(2)).is_err());
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(ScalarType::String.coerce("s", &json!(12)).unwrap(), json!("12"));
        assert_eq!(ScalarType::String.coerce("s", &json!("x")).unwrap(), json!("x"));
        assert!(ScalarType::String.coerce("s", &json!([1])).is_err());
    }

    #[test]
    fn test_coercion_error_names_param() {
        let err = ScalarType::Int.coerce("page", &json!("two")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument 'page': expected int, got \"two\""
        );
    }

    #[test]
    fn test_param_builders() {
        let param = Param::bool("verbose").with_default(false);
        assert_eq!(param.name(), "verbose");
        assert_eq!(param.kind(), &ParamKind::Scalar(ScalarType::Bool));
        assert_eq!(param.default(), Some(&json!(false)));

        let optional = Param::untyped("q").optional();
        assert_eq!(optional.default(), Some(&Value::Null));
    }

    #[test]
    fn test_signature_collects() {
        let signature: Signature = vec![Param::int("a"), Param::int("b")].into_iter().collect();
        assert_eq!(signature.len(), 2);
        assert!(!signature.is_empty());
    }
}
