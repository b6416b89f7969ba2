//! # TinyApp Core
//!
//! The dispatch kernel's building blocks:
//!
//! - [`Container`] - service registry with memoized factories and cycle detection
//! - [`Signature`] / [`Param`] - declared handler parameters
//! - [`PendingArgs`] / [`resolve_arguments`] - name-based argument binding
//! - [`HandlerRef`] - free functions, bound methods and registry-resolved receivers
//! - [`Reply`] / [`coerce`] - handler return values and their HTTP form
//! - [`DispatchError`] - error taxonomy and JSON error envelope
//! - [`services`] - default capabilities (response factory, logger, cache, events)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tinyapp_core::{Container, HandlerRef, Param, PendingArgs, Reply, Scope, Signature};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Greeter { greeting: "hello" }));
//!
//! let handler = HandlerRef::function(
//!     Signature::new()
//!         .param(Param::inject::<Greeter>("greeter"))
//!         .param(Param::string("name").with_default("world")),
//!     |args| async move {
//!         let greeter = args.service::<Greeter>("greeter")?;
//!         let name: String = args.get("name")?;
//!         Ok(format!("{} {name}", greeter.greeting))
//!     },
//! );
//!
//! let reply = tokio_test::block_on(handler.call(&PendingArgs::new(), &Scope::new(&container)));
//! assert!(matches!(reply, Ok(Reply::Text(text)) if text == "hello world"));
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod capability;
mod context;
pub mod di;
mod error;
mod handler;
mod reply;
mod resolve;
pub mod services;
mod signature;
mod types;

pub use args::{Arg, Args, PendingArgs};
pub use capability::{downcast, share, Capability, Shared};
pub use context::{InvocationContext, RequestId, RouteParams};
pub use di::{Container, Inject, Provider, Resolver};
pub use error::{DispatchError, DispatchResult, ErrorDetail, ErrorEnvelope};
pub use handler::{HandlerRef, Invocable, ReceiverKind};
pub use reply::{coerce, IntoReply, Json, Reply, StructuredBody};
pub use resolve::{resolve_arguments, Scope};
pub use signature::{Param, ParamKind, ScalarType, Signature};
pub use types::{body, empty_body, Body, BoxFuture, Request, Response};
