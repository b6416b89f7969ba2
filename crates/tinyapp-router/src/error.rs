//! Router errors.

use thiserror::Error;

/// Errors raised when building URLs for named routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No route is registered under this name.
    #[error("no route named '{0}'")]
    UnknownRoute(String),

    /// A placeholder of the route pattern has no value.
    #[error("route '{route}' requires parameter '{param}'")]
    MissingParam {
        /// Route name.
        route: String,
        /// Placeholder without a value.
        param: String,
    },
}
