//! Absolute request URIs.

use http::header::HOST;
use http::uri::Authority;
use tinyapp_core::Request;

/// The URI handed to the router: `scheme://host[:port]path`.
///
/// Ports 80 and 443 are omitted. When the request URI carries no
/// authority the `Host` header is used; without either, only the path is
/// returned.
///
/// ```rust
/// use tinyapp_core::empty_body;
/// use tinyapp_server::absolute_uri;
///
/// let request = http::Request::builder()
///     .uri("/users/7?full=1")
///     .header("host", "example.com:8080")
///     .body(empty_body())
///     .unwrap();
/// assert_eq!(absolute_uri(&request), "http://example.com:8080/users/7");
/// ```
#[must_use]
pub fn absolute_uri(request: &Request) -> String {
    let uri = request.uri();
    let path = uri.path();

    let authority = uri.authority().cloned().or_else(|| {
        request
            .headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|host| host.parse::<Authority>().ok())
    });
    let Some(authority) = authority else {
        return path.to_string();
    };

    let scheme = uri.scheme_str().unwrap_or("http");
    match authority.port_u16() {
        Some(port) if port != 80 && port != 443 => {
            format!("{scheme}://{}:{port}{path}", authority.host())
        }
        _ => format!("{scheme}://{}{path}", authority.host()),
    }
}
