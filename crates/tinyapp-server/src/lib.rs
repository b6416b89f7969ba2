//! # TinyApp Server
//!
//! The request lifecycle of a TinyApp application.
//!
//! - [`App`]: registry, router and application middleware; dispatches one
//!   request into one response and exposes `execute` for calling any
//!   handler with autowired arguments
//! - [`Emitter`]: where the response goes ([`CgiEmitter`], [`MemoryEmitter`])
//! - [`CgiRequestFactory`]: the current request of a CGI process
//! - [`Server`]: a hyper HTTP/1.1 host with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use tinyapp_core::{empty_body, HandlerRef, Json, Param, Signature};
//! use tinyapp_server::{App, RouteOptions};
//!
//! # tokio_test::block_on(async {
//! let show = HandlerRef::function(
//!     Signature::new().param(Param::int("id")),
//!     |args| async move { Ok(Json(serde_json::json!({ "id": args.get::<i64>("id")? }))) },
//! );
//!
//! let mut app = App::new().with_site_path("/api");
//! app.get_with("/users/{id}", show, RouteOptions::new().name("users.show"));
//!
//! let request = http::Request::get("/api/users/7").body(empty_body()).unwrap();
//! let response = app.dispatch(request).await.unwrap();
//! assert_eq!(response.headers()["content-type"], "application/json");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod cgi;
mod config;
mod emitter;
mod error;
mod options;
mod server;
pub mod shutdown;
mod uri;

pub use app::App;
pub use cgi::{site_path_for, CgiRequestFactory};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use emitter::{CgiEmitter, EmittedResponse, Emitter, MemoryEmitter};
pub use error::ServerError;
pub use options::{GroupOptions, GroupRoutes, RouteCollector, RouteOptions};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use uri::absolute_uri;
