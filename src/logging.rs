//! Log subscriber setup.
//!
//! juzdy itself only emits `tracing` events. Binaries call [`init`] once at
//! startup to print them.

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};
use crate::error::Error;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level` when it is set. Fails if the filter
/// directive is malformed or a subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| Error::Logging(e.into()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(Error::Logging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_level_is_rejected() {
        // Only meaningful when RUST_LOG does not override the level.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig { level: "juzdy=notalevel".to_owned(), format: LogFormat::Text };
        let err = init(&config).unwrap_err();
        assert!(matches!(err, Error::Logging(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
