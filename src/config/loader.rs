//! Layered configuration loading.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use toml::{Table, Value};

use super::reference::resolve_references;
use super::{AppConfig, ConfigError};

/// Configuration loader with layered sources.
///
/// Layers apply in the order given, later ones overriding earlier ones:
/// 1. Built-in defaults (from [`AppConfig::default`])
/// 2. Configuration files and strings, deep-merged table by table
/// 3. Environment variables under a prefix
///
/// `@{path}` references are resolved after all layers are merged, so a file
/// loaded later may define values an earlier one refers to.
///
/// ```no_run
/// use juzdy::config::ConfigLoader;
///
/// # fn main() -> Result<(), juzdy::config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("config/app.toml")?
///     .with_file("config/local.toml")?
///     .with_env_prefix("JUZDY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    tree: Table,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a TOML file on top of what is loaded so far.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        self.merge_source(&src, path.display().to_string())
    }

    /// Merges a TOML document given inline.
    pub fn with_str(self, src: &str) -> Result<Self, ConfigError> {
        self.merge_source(src, "inline source".to_owned())
    }

    /// Reads `PREFIX_SECTION__KEY=value` variables when [`load`](Self::load)
    /// runs. `__` separates path segments; keys are lower-cased; values are
    /// strings.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Applies `(name, value)` pairs as if they were environment variables
    /// under `prefix`. Pairs without the prefix are skipped.
    pub fn with_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let lead = format!("{prefix}_");
        for (name, value) in vars {
            let name = name.as_ref();
            let Some(rest) = name.strip_prefix(&lead) else { continue };
            let path: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
            if path.iter().any(String::is_empty) {
                return Err(ConfigError::InvalidEnvKey { var: name.to_owned() });
            }
            set_path(&mut self.tree, &path, Value::String(value.into()));
        }
        Ok(self)
    }

    /// Merges every layer, resolves references and returns the raw tree.
    pub fn load_table(mut self) -> Result<Table, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars = prefixed_vars(&prefix, std::env::vars_os())?;
            self = self.with_vars(&prefix, vars)?;
        }
        let mut tree = self.tree;
        resolve_references(&mut tree)?;
        Ok(tree)
    }

    /// Merges every layer, resolves references and deserializes.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let tree = self.load_table()?;
        let config: AppConfig = Value::Table(tree).try_into()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn merge_source(mut self, src: &str, origin: String) -> Result<Self, ConfigError> {
        let layer: Table = src
            .parse()
            .map_err(|source| ConfigError::Parse { origin, source })?;
        merge(&mut self.tree, layer);
        Ok(self)
    }
}

/// Keeps the variables under `prefix` as strings. Others are skipped
/// unread, whatever their encoding.
fn prefixed_vars<I>(prefix: &str, vars: I) -> Result<Vec<(String, String)>, ConfigError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let lead = format!("{prefix}_");
    let mut kept = Vec::new();
    for (name, value) in vars {
        if !name.as_encoded_bytes().starts_with(lead.as_bytes()) {
            continue;
        }
        let var = name.to_string_lossy().into_owned();
        let (Ok(name), Ok(value)) = (name.into_string(), value.into_string()) else {
            return Err(ConfigError::EnvNotUnicode { var });
        };
        kept.push((name, value));
    }
    Ok(kept)
}

/// Deep-merges `overlay` into `base`: tables merge key by key, anything else
/// is replaced.
fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let Value::Table(incoming) = value {
            if let Some(Value::Table(existing)) = base.get_mut(&key) {
                merge(existing, incoming);
            } else {
                base.insert(key, Value::Table(incoming));
            }
        } else {
            base.insert(key, value);
        }
    }
}

fn set_path(tree: &mut Table, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else { return };
    let mut node = tree;
    for key in parents {
        let entry = node
            .entry(key.clone())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        node = match entry {
            Value::Table(next) => next,
            _ => return,
        };
    }
    node.insert(last.clone(), value);
}
