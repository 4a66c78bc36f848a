//! `@{dotted.path}` cross-references between configuration values.
//!
//! A string that is exactly one reference is replaced by the referenced
//! value, type included (`port = "@{defaults.port}"` yields an integer).
//! References embedded in longer strings are formatted in; embedding a table
//! or array is an error. Resolution repeats through chains of references
//! until every string is reference-free, and fails on cycles.

use toml::{Table, Value};

use super::ConfigError;

/// Replaces every reference in `tree`, in place.
pub(crate) fn resolve_references(tree: &mut Table) -> Result<(), ConfigError> {
    let snapshot = tree.clone();
    let refs = Refs { root: &snapshot };
    *tree = refs.table("", &snapshot, &mut Vec::new())?;
    Ok(())
}

struct Refs<'a> {
    root: &'a Table,
}

impl Refs<'_> {
    fn value(&self, at: &str, value: &Value, visiting: &mut Vec<String>) -> Result<Value, ConfigError> {
        match value {
            Value::String(s) => self.string(at, s, visiting),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.value(&format!("{at}[{i}]"), item, visiting))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Table(table) => self.table(at, table, visiting).map(Value::Table),
            other => Ok(other.clone()),
        }
    }

    fn table(&self, at: &str, table: &Table, visiting: &mut Vec<String>) -> Result<Table, ConfigError> {
        let mut out = Table::new();
        for (key, value) in table {
            let path = if at.is_empty() { key.clone() } else { format!("{at}.{key}") };
            out.insert(key.clone(), self.value(&path, value, visiting)?);
        }
        Ok(out)
    }

    fn string(&self, at: &str, s: &str, visiting: &mut Vec<String>) -> Result<Value, ConfigError> {
        if let Some(reference) = whole_reference(s) {
            return self.target(at, reference, visiting);
        }

        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("@{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else { break };
            let reference = &after[..end];
            out.push_str(&rest[..start]);
            match self.target(at, reference, visiting)? {
                Value::String(v) => out.push_str(&v),
                Value::Table(_) | Value::Array(_) => {
                    return Err(ConfigError::EmbeddedComposite {
                        key: at.to_owned(),
                        reference: reference.to_owned(),
                    });
                }
                scalar => out.push_str(&scalar.to_string()),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }

    fn target(&self, at: &str, reference: &str, visiting: &mut Vec<String>) -> Result<Value, ConfigError> {
        if visiting.iter().any(|v| v == reference) {
            return Err(ConfigError::CyclicReference { reference: reference.to_owned() });
        }
        let raw = lookup(self.root, reference).ok_or_else(|| ConfigError::UnresolvedReference {
            key: at.to_owned(),
            reference: reference.to_owned(),
        })?;
        visiting.push(reference.to_owned());
        let resolved = self.value(reference, raw, visiting);
        visiting.pop();
        resolved
    }
}

fn whole_reference(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("@{")?.strip_suffix('}')?;
    (!inner.contains(['{', '}'])).then_some(inner)
}

fn lookup<'t>(root: &'t Table, path: &str) -> Option<&'t Value> {
    let mut keys = path.split('.');
    let mut value = root.get(keys.next()?)?;
    for key in keys {
        value = value.as_table()?.get(key)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(src: &str) -> Result<Table, ConfigError> {
        let mut tree: Table = src.parse().unwrap();
        resolve_references(&mut tree)?;
        Ok(tree)
    }

    #[test]
    fn whole_reference_keeps_type() {
        let tree = resolved(
            r#"
            [defaults]
            port = 8080
            [server]
            port = "@{defaults.port}"
            "#,
        )
        .unwrap();
        assert_eq!(tree["server"]["port"].as_integer(), Some(8080));
    }

    #[test]
    fn embedded_references_are_formatted() {
        let tree = resolved(
            r#"
            host = "localhost"
            port = 8080
            addr = "@{host}:@{port}"
            "#,
        )
        .unwrap();
        assert_eq!(tree["addr"].as_str(), Some("localhost:8080"));
    }

    #[test]
    fn chains_resolve_to_a_fixed_point() {
        let tree = resolved(
            r#"
            root = "/srv"
            app = "@{root}/app"
            public = "@{app}/public"
            list = ["@{public}", "x"]
            "#,
        )
        .unwrap();
        assert_eq!(tree["public"].as_str(), Some("/srv/app/public"));
        assert_eq!(tree["list"][0].as_str(), Some("/srv/app/public"));
    }

    #[test]
    fn whole_reference_copies_tables() {
        let tree = resolved(
            r#"
            base = "/srv"
            [paths]
            logs = "@{base}/logs"
            [mirror]
            paths = "@{paths}"
            "#,
        )
        .unwrap();
        assert_eq!(tree["mirror"]["paths"]["logs"].as_str(), Some("/srv/logs"));
    }

    #[test]
    fn missing_target_is_reported_with_its_key() {
        let err = resolved(r#"[a]
            b = "@{nope.x}""#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnresolvedReference { ref key, ref reference } if key == "a.b" && reference == "nope.x"
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = resolved(
            r#"
            a = "@{b}"
            b = "x@{a}"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CyclicReference { .. }));

        let err = resolved(r#"a = "@{a}""#).unwrap_err();
        assert!(matches!(err, ConfigError::CyclicReference { .. }));
    }

    #[test]
    fn embedding_a_table_is_rejected() {
        let err = resolved(
            r#"
            s = "prefix @{t}"
            [t]
            k = 1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmbeddedComposite { .. }));
    }

    #[test]
    fn unterminated_reference_is_literal() {
        let tree = resolved(r#"s = "cost: @{5""#).unwrap();
        assert_eq!(tree["s"].as_str(), Some("cost: @{5"));
    }
}
