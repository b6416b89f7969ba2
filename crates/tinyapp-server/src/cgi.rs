//! The request being served, read from a CGI environment.
//!
//! [`CgiRequestFactory`] is the default [`ServerRequestFactory`]: it builds
//! the request from the meta-variables of RFC 3875 and reads the body from
//! stdin. [`App::run`](crate::App::run) asks it for the request to dispatch.

use std::collections::HashMap;
use std::env;
use std::io::{self, Read};

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Uri};
use tinyapp_core::services::ServerRequestFactory;
use tinyapp_core::{body, DispatchError, DispatchResult, Request};
use tracing::debug;

#[derive(Debug, Clone)]
enum CgiBody {
    Stdin,
    Fixed(Bytes),
}

/// Builds the current request from CGI meta-variables.
///
/// ```rust
/// use tinyapp_core::services::ServerRequestFactory;
/// use tinyapp_server::CgiRequestFactory;
///
/// let factory = CgiRequestFactory::from_vars(
///     [
///         ("REQUEST_METHOD", "POST"),
///         ("HTTP_HOST", "shop.example"),
///         ("REQUEST_URI", "/cart/items?ref=home"),
///         ("CONTENT_TYPE", "application/json"),
///     ],
///     r#"{"sku":"A1"}"#,
/// );
///
/// let request = factory.create_server_request().unwrap();
/// assert_eq!(request.method(), "POST");
/// assert_eq!(request.uri(), "http://shop.example/cart/items?ref=home");
/// assert_eq!(request.headers()["content-type"], "application/json");
/// ```
#[derive(Debug, Clone)]
pub struct CgiRequestFactory {
    vars: HashMap<String, String>,
    body: CgiBody,
}

impl CgiRequestFactory {
    /// Snapshots the process environment; the body is read from stdin when
    /// the request is created.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: env::vars().collect(),
            body: CgiBody::Stdin,
        }
    }

    /// Uses the given meta-variables and body.
    pub fn from_vars<I, K, V>(vars: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            body: CgiBody::Fixed(body.into()),
        }
    }

    /// A meta-variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// The base path the application is mounted under.
    ///
    /// See [`site_path_for`].
    #[must_use]
    pub fn site_path(&self) -> String {
        let (path, _) = self.request_target();
        site_path_for(&path, self.var("SCRIPT_NAME").unwrap_or_default())
    }

    fn method(&self) -> DispatchResult<Method> {
        let method = self.var("REQUEST_METHOD").unwrap_or("GET");
        Method::from_bytes(method.as_bytes()).map_err(|e| DispatchError::Http(e.into()))
    }

    fn scheme(&self) -> &str {
        match self.var("HTTPS") {
            Some(https) if !https.eq_ignore_ascii_case("off") => "https",
            _ => self.var("REQUEST_SCHEME").unwrap_or("http"),
        }
    }

    fn authority(&self) -> Option<String> {
        if let Some(host) = self.var("HTTP_HOST") {
            return Some(host.to_string());
        }
        let name = self.var("SERVER_NAME")?;
        Some(match self.var("SERVER_PORT") {
            Some("80" | "443") | None => name.to_string(),
            Some(port) => format!("{name}:{port}"),
        })
    }

    /// Path and optional query of the request.
    fn request_target(&self) -> (String, Option<String>) {
        if let Some(target) = self.var("REQUEST_URI") {
            return match target.split_once('?') {
                Some((path, query)) => (path.to_string(), Some(query.to_string())),
                None => (target.to_string(), None),
            };
        }
        let path = format!(
            "{}{}",
            self.var("SCRIPT_NAME").unwrap_or_default(),
            self.var("PATH_INFO").unwrap_or_default()
        );
        let path = if path.is_empty() { "/".to_string() } else { path };
        (path, self.var("QUERY_STRING").map(str::to_string))
    }

    fn headers(&self) -> impl Iterator<Item = (HeaderName, HeaderValue)> + '_ {
        self.vars.iter().filter_map(|(key, value)| {
            let name = match key.as_str() {
                "CONTENT_TYPE" => "content-type".to_string(),
                "CONTENT_LENGTH" => "content-length".to_string(),
                key => key.strip_prefix("HTTP_")?.to_ascii_lowercase().replace('_', "-"),
            };
            if value.is_empty() {
                return None;
            }
            let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
            let value = HeaderValue::from_str(value).ok()?;
            Some((name, value))
        })
    }

    fn read_body(&self) -> DispatchResult<Bytes> {
        match &self.body {
            CgiBody::Fixed(bytes) => Ok(bytes.clone()),
            CgiBody::Stdin => {
                let Some(length) = self
                    .var("CONTENT_LENGTH")
                    .and_then(|len| len.parse::<u64>().ok())
                else {
                    return Ok(Bytes::new());
                };
                let mut buf = Vec::new();
                io::stdin()
                    .lock()
                    .take(length)
                    .read_to_end(&mut buf)
                    .map_err(|e| DispatchError::internal_with_source("failed to read request body", e))?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl ServerRequestFactory for CgiRequestFactory {
    fn create_uri(&self) -> DispatchResult<Uri> {
        let (path, query) = self.request_target();
        let target = match query {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        let uri = match self.authority() {
            Some(authority) => format!("{}://{authority}{target}", self.scheme()),
            None => target,
        };
        uri.parse::<Uri>().map_err(|e| DispatchError::Http(e.into()))
    }

    fn create_server_request(&self) -> DispatchResult<Request> {
        let uri = self.create_uri()?;
        let mut builder = http::Request::builder().method(self.method()?).uri(uri);
        for (name, value) in self.headers() {
            builder = builder.header(name, value);
        }
        let bytes = self.read_body()?;
        debug!(method = %self.var("REQUEST_METHOD").unwrap_or("GET"), bytes = bytes.len(), "cgi request read");
        Ok(builder.body(body(bytes))?)
    }
}

/// The base path of an application served by `script_name`.
///
/// The script name itself when `request_path` starts with it (front
/// controller in the URL), else the script's directory when that is longer
/// than one character (rewritten URLs), else empty.
///
/// ```rust
/// use tinyapp_server::site_path_for;
///
/// assert_eq!(site_path_for("/blog/app.cgi/posts", "/blog/app.cgi"), "/blog/app.cgi");
/// assert_eq!(site_path_for("/blog/posts", "/blog/app.cgi"), "/blog");
/// assert_eq!(site_path_for("/posts", "/app.cgi"), "");
/// ```
#[must_use]
pub fn site_path_for(request_path: &str, script_name: &str) -> String {
    if request_path.starts_with(script_name) {
        return script_name.to_string();
    }
    let directory = match script_name.rfind('/') {
        Some(0) => "/",
        Some(end) => &script_name[..end],
        None => ".",
    };
    if directory.len() > 1 {
        directory.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory(vars: &[(&str, &str)]) -> CgiRequestFactory {
        CgiRequestFactory::from_vars(vars.iter().copied(), Bytes::new())
    }

    #[test]
    fn test_uri_from_request_uri() {
        let f = factory(&[
            ("HTTPS", "on"),
            ("HTTP_HOST", "secure.example"),
            ("REQUEST_URI", "/a/b?c=d"),
        ]);
        assert_eq!(f.create_uri().unwrap(), "https://secure.example/a/b?c=d");
    }

    #[test]
    fn test_uri_from_script_and_path_info() {
        let f = factory(&[
            ("HTTPS", "off"),
            ("SERVER_NAME", "intranet"),
            ("SERVER_PORT", "8080"),
            ("SCRIPT_NAME", "/app.cgi"),
            ("PATH_INFO", "/users/3"),
            ("QUERY_STRING", "full=1"),
        ]);
        assert_eq!(f.create_uri().unwrap(), "http://intranet:8080/app.cgi/users/3?full=1");
    }

    #[test]
    fn test_uri_without_host() {
        let f = factory(&[]);
        assert_eq!(f.create_uri().unwrap(), "/");
    }

    #[test]
    fn test_headers_and_method() {
        let f = CgiRequestFactory::from_vars(
            [
                ("REQUEST_METHOD", "PUT"),
                ("REQUEST_URI", "/items/1"),
                ("HTTP_X_REQUEST_ID", "abc"),
                ("HTTP_ACCEPT_LANGUAGE", "en"),
                ("CONTENT_LENGTH", "5"),
                ("PATH", "/usr/bin"),
            ],
            "hello",
        );
        let request = f.create_server_request().unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.headers()["x-request-id"], "abc");
        assert_eq!(request.headers()["accept-language"], "en");
        assert_eq!(request.headers()["content-length"], "5");
        assert_eq!(request.headers().len(), 3);
    }

    #[test]
    fn test_invalid_method() {
        let f = factory(&[("REQUEST_METHOD", "NOT A METHOD")]);
        assert!(matches!(f.create_server_request(), Err(DispatchError::Http(_))));
    }

    #[test]
    fn test_site_path_for() {
        assert_eq!(site_path_for("/app.cgi/users", "/app.cgi"), "/app.cgi");
        assert_eq!(site_path_for("/shop/cart", "/shop/app.cgi"), "/shop");
        assert_eq!(site_path_for("/cart", "/app.cgi"), "");
        assert_eq!(site_path_for("/cart", "app.cgi"), "");
        assert_eq!(site_path_for("/cart", ""), "");
    }

    #[test]
    fn test_factory_site_path() {
        let f = factory(&[
            ("SCRIPT_NAME", "/shop/app.cgi"),
            ("REQUEST_URI", "/shop/cart?x=1"),
        ]);
        assert_eq!(f.site_path(), "/shop");
    }
}
