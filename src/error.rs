//! Unified error types.

use thiserror::Error;

use crate::config::ConfigError;

/// A runtime fault raised by a handler or middleware.
///
/// Faults propagate outward through the middleware chain as `Err` values until
/// a layer converts them into a response (see
/// [`Recover`](crate::middleware::Recover)). Application-level outcomes such as
/// 401 or 404 are [`Response`](crate::Response) values, not faults.
pub type Fault = anyhow::Error;

/// The error type returned by juzdy's fallible boot and I/O operations.
///
/// Every variant except [`Error::Io`] is a configuration fault: it is raised
/// before the first request is served and the pipeline is never left
/// partially built.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid listen address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("unknown middleware `{name}`")]
    UnknownMiddleware { name: String },

    #[error("handler `{name}` is registered twice")]
    DuplicateHandler { name: String },

    #[error("invalid handler name `{name}`")]
    InvalidHandlerName { name: String },

    #[error("invalid namespace root `{root}`")]
    InvalidNamespace { root: String },

    #[error("invalid default handler `{name}`")]
    InvalidDefaultHandler { name: String },

    #[error("no namespace roots configured")]
    NoNamespaces,

    #[error("failed to install log subscriber")]
    Logging(#[source] Box<dyn std::error::Error + Send + Sync>),
}
