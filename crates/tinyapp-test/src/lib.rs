//! # TinyApp Test
//!
//! In-memory testing for TinyApp applications. Requests go through
//! [`App::dispatch`](tinyapp_server::App::dispatch) exactly as they would
//! under a host: routing, the middleware chain, argument resolution and
//! reply coercion all run, but no socket is bound and nothing is emitted.
//!
//! - [`TestClient`]: fluent request building and sending
//! - [`TestResponse`]: collected response with chainable assertions
//! - [`TestRequestBuilder`]: standalone request construction
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use tinyapp_core::{HandlerRef, InvocationContext, Json, Param, Signature};
//! use tinyapp_server::App;
//! use tinyapp_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut app = App::new();
//! app.post(
//!     "/users",
//!     HandlerRef::function(
//!         Signature::new().param(Param::inject::<InvocationContext>("request")),
//!         |args| async move {
//!             let request = args.service::<InvocationContext>("request")?;
//!             let user: serde_json::Value = request.json()?;
//!             Ok(Json(json!({ "created": user["name"] })))
//!         },
//!     ),
//! );
//!
//! let client = TestClient::new(app);
//! client
//!     .post("/users")
//!     .json(&json!({ "name": "Alice" }))
//!     .send()
//!     .await
//!     .assert_success()
//!     .assert_content_type("application/json")
//!     .assert_json_field("created", &json!("Alice"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
