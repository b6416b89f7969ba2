//! Message types used by middleware.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};

pub use tinyapp_core::{body, BoxFuture, Request, Response};

/// Shortcuts for building short-circuit responses.
pub trait ResponseExt {
    /// A plain-text response.
    fn text(status: StatusCode, message: &str) -> Response;

    /// A JSON response with a serialized body.
    fn json_bytes(status: StatusCode, json: impl Into<Bytes>) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, message: &str) -> Response {
        let mut response = Response::new(body(message.to_string()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn json_bytes(status: StatusCode, json: impl Into<Bytes>) -> Response {
        let mut response = Response::new(body(json));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::FORBIDDEN, "nope");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn test_json_response() {
        let response = Response::json_bytes(StatusCode::CREATED, r#"{"ok":true}"#);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
