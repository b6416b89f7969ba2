//! Handler return values and their coercion to responses.

use std::borrow::Cow;
use std::fmt;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};
use crate::types::{body, empty_body, Response};

/// A value that serializes to a JSON body.
pub trait StructuredBody: Send {
    /// Serializes the value.
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send> StructuredBody for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// What a handler returned.
pub enum Reply {
    /// Nothing; becomes an empty `200`.
    Empty,
    /// A complete response, passed through unchanged.
    Response(Response),
    /// Text; becomes a `200` with that body and no content type.
    Text(String),
    /// A composite value; becomes a `200` JSON body.
    Structured(Box<dyn StructuredBody>),
}

impl Reply {
    /// Wraps a serializable value.
    #[must_use]
    pub fn structured<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::Structured(Box::new(value))
    }

    /// Text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// True for [`Reply::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Response(response) => f
                .debug_tuple("Response")
                .field(&response.status())
                .finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Structured(_) => f.write_str("Structured(..)"),
        }
    }
}

/// Turns a reply into the final HTTP response.
///
/// # Errors
///
/// [`DispatchError::Serialization`] when a structured reply fails to
/// serialize.
///
/// # Example
///
/// ```
/// use tinyapp_core::{coerce, IntoReply};
/// use http::StatusCode;
///
/// let response = coerce("hello".into_reply()).unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert!(response.headers().get("content-type").is_none());
/// ```
pub fn coerce(reply: Reply) -> DispatchResult<Response> {
    match reply {
        Reply::Empty => Ok(Response::new(empty_body())),
        Reply::Response(response) => Ok(response),
        Reply::Text(text) => Ok(Response::new(body(text))),
        Reply::Structured(value) => {
            let bytes = value.to_json().map_err(DispatchError::Serialization)?;
            let mut response = Response::new(body(bytes));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(response)
        }
    }
}

/// Forces a JSON body for any serializable value, including scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// Conversion of handler return values into a [`Reply`].
///
/// Scalars become text, `()` and `None` become empty replies, collections
/// and [`Json`] become structured replies.
pub trait IntoReply {
    /// Converts into a reply.
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::Empty
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply {
        Reply::Response(self)
    }
}

impl IntoReply for StatusCode {
    fn into_reply(self) -> Reply {
        let mut response = Response::new(empty_body());
        *response.status_mut() = self;
        Reply::Response(response)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::Text(self)
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Reply::Text(self.to_string())
    }
}

impl IntoReply for Cow<'static, str> {
    fn into_reply(self) -> Reply {
        Reply::Text(self.into_owned())
    }
}

impl IntoReply for char {
    fn into_reply(self) -> Reply {
        Reply::Text(self.to_string())
    }
}

/// `true` renders as `"1"`, `false` as an empty body.
impl IntoReply for bool {
    fn into_reply(self) -> Reply {
        Reply::Text(if self { "1" } else { "" }.to_string())
    }
}

macro_rules! numeric_reply {
    ($($ty:ty),*) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Reply {
                    Reply::Text(self.to_string())
                }
            }
        )*
    };
}

numeric_reply!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    fn into_reply(self) -> Reply {
        Reply::structured(self.0)
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        match self {
            Value::Null => Reply::Empty,
            Value::Bool(b) => b.into_reply(),
            Value::Number(n) => Reply::Text(n.to_string()),
            Value::String(s) => Reply::Text(s),
            composite => Reply::structured(composite),
        }
    }
}

impl<T: Serialize + Send + 'static> IntoReply for Vec<T> {
    fn into_reply(self) -> Reply {
        Reply::structured(self)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Empty, IntoReply::into_reply)
    }
}
