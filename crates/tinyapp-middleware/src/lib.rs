//! # TinyApp Middleware
//!
//! Onion-model middleware for the TinyApp dispatch kernel.
//!
//! Middleware can be declared on the application, on a route group or on a
//! single route. For every request a [`Chain`] is assembled in a fixed
//! order, application middleware first, then the route's (outer groups
//! before inner, route-specific last), and the handler is wrapped last:
//!
//! ```text
//! Request  → app[0] → app[1] → group → route → Handler
//!                                                 ↓
//! Response ← app[0] ← app[1] ← group ← route ←────┘
//! ```
//!
//! Declarations are [`MiddlewareRef`]s: either instances, or types resolved
//! through the service registry when the chain is assembled.
//!
//! ## Example
//!
//! ```
//! use tinyapp_core::Container;
//! use tinyapp_middleware::{Chain, MiddlewareRef, RecoverMiddleware, RequestIdMiddleware};
//!
//! let declared = [
//!     MiddlewareRef::from(RequestIdMiddleware::new()),
//!     MiddlewareRef::from(RecoverMiddleware::new()),
//! ];
//!
//! let mut chain = Chain::new();
//! chain.extend_resolved(&declared, &Container::new()).unwrap();
//! assert_eq!(chain.names(), ["request_id", "recover"]);
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod middleware;
pub mod reference;
pub mod stages;
pub mod types;

pub use chain::Chain;
pub use context::MiddlewareContext;
pub use middleware::{from_fn, FnMiddleware, Middleware, Next};
pub use reference::MiddlewareRef;
pub use stages::{RecoverMiddleware, RequestIdMiddleware, TraceMiddleware, REQUEST_ID_HEADER};
pub use types::{BoxFuture, Request, Response, ResponseExt};
