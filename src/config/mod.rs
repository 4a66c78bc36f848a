//! Typed configuration.
//!
//! Configuration is TOML, layered by [`ConfigLoader`] and deserialized into
//! [`AppConfig`]. Only three sections are read by juzdy itself; any other
//! section is left for the application (see [`ConfigLoader::load_table`]).
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:8080"
//!
//! [log]
//! level = "info"
//! format = "text"
//!
//! [dispatch]
//! namespaces = ["App.Handler"]
//! default_handler = "Index"
//! middleware = ["recover", "trace"]
//!
//! [dispatch.groups]
//! auth = ["auth_check"]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

mod error;
mod loader;
mod reference;

pub use error::ConfigError;
pub use loader::ConfigLoader;

/// Root configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub dispatch: DispatchConfig,
}

/// `[server]` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: "0.0.0.0:8080".to_owned() }
    }
}

/// `[log]` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// A `tracing` filter directive, e.g. `info` or `juzdy=debug,info`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Text }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `[dispatch]` section: everything the pipeline reads at boot.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Namespace roots searched in order during resolution.
    pub namespaces: Vec<String>,
    /// Root-relative handler name for the empty path.
    pub default_handler: Option<String>,
    /// Global middleware names, outermost first.
    pub middleware: Vec<String>,
    /// Capability tag → middleware names.
    pub groups: BTreeMap<String, Vec<String>>,
}
