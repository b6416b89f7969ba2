//! # TinyApp
//!
//! A minimal web-request framework built around one idea: given a request,
//! find the route, run the middleware chain around the handler, call the
//! handler with arguments resolved from the route, the query string and a
//! service registry, and turn whatever it returns into a response.
//!
//! ## Crates
//!
//! | Module | Concern |
//! |---|---|
//! | [`core`] | service registry, argument resolver, handler references, replies |
//! | [`router`] | radix-tree router, route groups, named routes |
//! | [`middleware`] | middleware trait, chain, built-in stages |
//! | [`server`] | the [`App`](server::App) orchestrator, emitters, CGI, HTTP host |
//! | [`config`] | layered typed configuration |
//! | [`telemetry`] | logging setup |
//!
//! ## Example
//!
//! ```rust
//! use tinyapp::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let greet = HandlerRef::function(
//!     Signature::new()
//!         .param(Param::string("name"))
//!         .param(Param::bool("shout").with_default(false)),
//!     |args| async move {
//!         let name = args.get::<String>("name")?;
//!         Ok(if args.get::<bool>("shout")? {
//!             format!("HELLO, {}!", name.to_uppercase())
//!         } else {
//!             format!("Hello, {name}!")
//!         })
//!     },
//! );
//!
//! let mut app = App::new();
//! app.bind_middleware(RequestIdMiddleware::new());
//! app.get("/hello/{name}", greet);
//!
//! let request = http::Request::get("/hello/ada?shout=1").body(empty_body()).unwrap();
//! let response = app.dispatch(request).await.unwrap();
//! assert_eq!(response.status(), 200);
//! assert!(response.headers().contains_key(REQUEST_ID_HEADER));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tinyapp_core as core;

// Re-export router types
pub use tinyapp_router as router;

// Re-export middleware types
pub use tinyapp_middleware as middleware;

// Re-export orchestrator and host types
pub use tinyapp_server as server;

// Re-export configuration types
pub use tinyapp_config as config;

// Re-export logging setup
pub use tinyapp_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use tinyapp::prelude::*;
///
/// let app = App::new();
/// assert!(app.container().contains::<dyn ResponseFactory>());
/// ```
pub mod prelude {
    pub use tinyapp_core::{
        body, coerce, empty_body, Args, BoxFuture, Container, DispatchError, DispatchResult,
        HandlerRef, Inject, IntoReply, Invocable, InvocationContext, Json, Param, PendingArgs,
        Provider, Reply, Request, RequestId, Response, Signature,
    };

    // Re-export default capabilities
    pub use tinyapp_core::services::{
        Cache, EventBus, HttpFactory, Logger, MemoryCache, ResponseFactory, ServerRequestFactory,
        TracingLogger,
    };

    // Re-export middleware types
    pub use tinyapp_middleware::{
        from_fn, Middleware, MiddlewareContext, MiddlewareRef, Next, RecoverMiddleware,
        RequestIdMiddleware, ResponseExt, TraceMiddleware, REQUEST_ID_HEADER,
    };

    // Re-export routing types
    pub use tinyapp_router::{Methods, Params, RouteError};

    // Re-export application types
    pub use tinyapp_server::{
        App, CgiEmitter, Emitter, GroupOptions, GroupRoutes, MemoryEmitter, RouteOptions, Server,
        ServerConfig,
    };

    // Re-export configuration
    pub use tinyapp_config::{ConfigLoader, TinyAppConfig};
    pub use tinyapp_telemetry::{init_logging, LogConfig};
}
