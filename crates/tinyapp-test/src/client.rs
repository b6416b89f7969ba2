//! In-memory client over an [`App`].

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use tinyapp_server::App;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A client that feeds requests straight into [`App::dispatch`].
///
/// No socket is bound and no emitter runs; the response is collected in
/// memory. Dispatch failures that would become a 500 on a real host are
/// surfaced as [`TestError::Dispatch`] by [`TestClientRequest::try_send`].
///
/// # Example
///
/// ```
/// use tinyapp_core::{HandlerRef, Param, Signature};
/// use tinyapp_server::App;
/// use tinyapp_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let mut app = App::new();
/// app.get(
///     "/hello/{name}",
///     HandlerRef::function(Signature::new().param(Param::string("name")), |args| async move {
///         Ok(format!("Hello, {}!", args.get::<String>("name")?))
///     }),
/// );
///
/// let client = TestClient::new(app);
/// client
///     .get("/hello/ada")
///     .send()
///     .await
///     .assert_status_code(200)
///     .assert_body_eq("Hello, ada!");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Arc<App>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client owning `app`.
    pub fn new(app: App) -> Self {
        Self::from_shared(Arc::new(app))
    }

    /// Creates a client over a shared app.
    pub fn from_shared(app: Arc<App>) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the app under test.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name, value));
        Self { client, builder }
    }

    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Appends a query pair.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or dispatch fails; use
    /// [`try_send`](Self::try_send) to inspect those failures.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("request failed: {err}"),
        }
    }

    /// Dispatches the request, returning build and dispatch failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.app.dispatch(request).await?;
        TestResponse::from_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;
    use tinyapp_core::{DispatchError, HandlerRef, InvocationContext, Json, Param, Signature};

    fn app() -> App {
        let mut app = App::new();
        app.get(
            "/users/{id}",
            HandlerRef::function(Signature::new().param(Param::int("id")), |args| async move {
                Ok(Json(json!({ "id": args.get::<i64>("id")? })))
            }),
        );
        app.get(
            "/search",
            HandlerRef::function(
                Signature::new().param(Param::string("q").with_default("none")),
                |args| async move { Ok(args.get::<String>("q")?) },
            ),
        );
        app.post(
            "/echo",
            HandlerRef::function(
                Signature::new().param(Param::inject::<InvocationContext>("ctx")),
                |args| async move {
                    let ctx = args.service::<InvocationContext>("ctx")?;
                    let token = ctx.header("x-token").unwrap_or("-").to_string();
                    let body = String::from_utf8_lossy(ctx.body()).into_owned();
                    Ok(Json(json!({ "token": token, "body": body })))
                },
            ),
        );
        app.get(
            "/broken",
            HandlerRef::function(
                Signature::new().param(Param::string("needed")),
                |_args| async move { Ok("unreachable") },
            ),
        );
        app
    }

    #[tokio::test]
    async fn test_get_with_route_param() {
        let client = TestClient::new(app());
        client
            .get("/users/12")
            .send()
            .await
            .assert_status(StatusCode::OK)
            .assert_json_eq(&json!({"id": 12}));
    }

    #[tokio::test]
    async fn test_query_reaches_handler() {
        let client = TestClient::new(app());
        client
            .get("/search")
            .query("q", "tiny app")
            .send()
            .await
            .assert_body_eq("tiny app");

        client.get("/search").send().await.assert_body_eq("none");
    }

    #[tokio::test]
    async fn test_default_headers_and_body() {
        let client = TestClient::new(app()).with_default_header("x-token", "secret");
        client
            .post("/echo")
            .body("payload")
            .send()
            .await
            .assert_json_field("token", &json!("secret"))
            .assert_json_field("body", &json!("payload"));
    }

    #[tokio::test]
    async fn test_header_overrides_default() {
        let client = TestClient::new(app()).with_default_header("x-token", "secret");
        client
            .post("/echo")
            .header("x-token", "override")
            .send()
            .await
            .assert_json_field("token", &json!("override"));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let client = TestClient::new(app());
        client.get("/nowhere").send().await.assert_status_code(404);
        client
            .delete("/users/1")
            .send()
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED)
            .assert_header("allow", "GET");
    }

    #[tokio::test]
    async fn test_try_send_surfaces_dispatch_error() {
        let client = TestClient::new(app());
        let err = client.get("/broken").try_send().await.unwrap_err();
        assert!(matches!(
            err,
            TestError::Dispatch(DispatchError::UnresolvableArgument { ref name }) if name == "needed"
        ));
    }

    #[tokio::test]
    async fn test_try_send_surfaces_build_error() {
        let client = TestClient::new(app());
        let err = client
            .get("/users/1")
            .header("bad\nname", "x")
            .try_send()
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[tokio::test]
    #[should_panic(expected = "request failed")]
    async fn test_send_panics_on_dispatch_error() {
        TestClient::new(app()).get("/broken").send().await;
    }

    #[tokio::test]
    async fn test_shared_app() {
        let app = Arc::new(app());
        let a = TestClient::from_shared(Arc::clone(&app));
        let b = a.clone();
        a.get("/users/1").send().await.assert_success();
        b.get("/users/2").send().await.assert_success();
        assert_eq!(Arc::strong_count(&app), 3);
        assert_eq!(a.app().site_path(), "");
    }
}
