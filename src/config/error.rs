//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, merging or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error("`{key}` references `@{{{reference}}}`, which is not defined")]
    UnresolvedReference { key: String, reference: String },

    #[error("reference `@{{{reference}}}` is part of a cycle")]
    CyclicReference { reference: String },

    #[error("`{key}` embeds `@{{{reference}}}`, which is a table or array")]
    EmbeddedComposite { key: String, reference: String },

    #[error("environment variable `{var}` does not name a configuration key")]
    InvalidEnvKey { var: String },

    #[error("environment variable `{var}` is not valid unicode")]
    EnvNotUnicode { var: String },
}
