//! Default capabilities bound by the application.
//!
//! None of these is used by the dispatch path itself apart from the response
//! factory; they are registered so that handlers and middleware can ask for
//! them through the registry.

mod cache;
mod events;
mod factory;
mod logger;

pub use cache::{Cache, MemoryCache};
pub use events::EventBus;
pub use factory::{HttpFactory, ResponseFactory, ServerRequestFactory};
pub use logger::{LogLevel, Logger, TracingLogger};
