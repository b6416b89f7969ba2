//! Radix tree router for TinyApp.
//!
//! The router maps a method and a URI to a [`Route`] descriptor carrying
//! the route status, the handler, the merged route params and the
//! middleware declared on the route and its enclosing groups. It is generic
//! over the handler type `H` and the middleware reference type `M`, so the
//! dispatch layer decides what a handler and a middleware are.
//!
//! # Features
//!
//! - **Radix Tree Matching**: O(k) path lookup with backtracking
//! - **Path Parameters**: `/users/{id}`
//! - **Wildcards**: catch-all routes (`/files/*path`)
//! - **Groups**: shared prefix, middleware and static params, nestable
//! - **Any-Method Routes**: one entry answering every unregistered method
//! - **Named Routes**: reverse routing with [`Router::url_for`]
//!
//! # Example
//!
//! ```rust
//! use tinyapp_router::{Params, RouteStatus, Router};
//! use http::Method;
//!
//! let mut router: Router<&str, &str> = Router::new();
//! router.add_route(Method::GET, "/users", "listUsers", vec![], Params::new(), None);
//! router.add_group(
//!     "/admin",
//!     |admin| {
//!         admin.add_route(Method::DELETE, "/users/{id}", "deleteUser", vec!["audit"], Params::new(), None);
//!     },
//!     vec!["auth"],
//!     Params::new(),
//! );
//!
//! let route = router.dispatch(&Method::DELETE, "/admin/users/3");
//! assert_eq!(route.status(), RouteStatus::Found);
//! assert_eq!(route.middlewares(), ["auth", "audit"]);
//! assert_eq!(route.params().get("id"), Some("3"));
//!
//! assert_eq!(router.dispatch(&Method::GET, "/nowhere").status(), RouteStatus::NotFound);
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!              [GET,DELETE]
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collector;
mod error;
mod method_router;
mod node;
mod params;
mod route;
mod router;

pub use collector::Collector;
pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use route::{Endpoint, Methods, Route, RouteStatus};
pub use router::Router;
