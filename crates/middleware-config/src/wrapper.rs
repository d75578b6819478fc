use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::ConfigError;

const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// A YAML tree plus the overlay rules. Lookups are lazy: nothing is read
/// from the environment or the secrets directory until a leaf is resolved.
#[derive(Debug, Clone)]
pub struct ConfigWrapper {
    root: Value,
    prefix: String,
    secrets_dir: PathBuf,
}

impl ConfigWrapper {
    pub fn from_value(root: Value, prefix: impl Into<String>) -> Self {
        Self {
            root,
            prefix: prefix.into().to_uppercase(),
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
        }
    }

    pub fn from_yaml_file(path: &Path, prefix: impl Into<String>) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root: Value = serde_yaml::from_str(&text)?;
        Ok(Self::from_value(root, prefix))
    }

    /// Point secret-file lookups somewhere other than `/run/secrets`.
    pub fn with_secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secrets_dir = dir.into();
        self
    }

    /// Resolve one leaf, overlay-aware. `path` is the key path from the
    /// root, e.g. `&["api_client", "api_url"]`.
    pub fn get(&self, path: &[&str]) -> Option<Value> {
        let full_key = self.overlay_key(path);
        if let Some(text) = self.override_value(&full_key) {
            return Some(parse_scalar(&text));
        }
        let mut current = &self.root;
        for key in path {
            current = current.get(key)?;
        }
        Some(current.clone())
    }

    /// The whole tree with every override applied, ready for typed
    /// deserialization. Overlay keys that name leaves absent from the YAML
    /// are discovered and injected at each mapping level, so a value (say, a
    /// password) may live only in the environment or a secret file.
    pub fn resolved(&self) -> Value {
        self.resolve_node(&self.root, &self.prefix)
    }

    fn resolve_node(&self, node: &Value, prefix: &str) -> Value {
        let Value::Mapping(mapping) = node else {
            return node.clone();
        };

        let mut out = Mapping::new();
        for (key, value) in mapping {
            let Some(key_str) = key.as_str() else {
                out.insert(key.clone(), value.clone());
                continue;
            };
            let child_prefix = join_key(prefix, key_str);
            if let Some(text) = self.override_value(&child_prefix) {
                out.insert(key.clone(), parse_scalar(&text));
            } else {
                out.insert(key.clone(), self.resolve_node(value, &child_prefix));
            }
        }

        for key in self.discovered_keys(prefix) {
            let yaml_key = Value::String(key.clone());
            if out.contains_key(&yaml_key) {
                continue;
            }
            let child_prefix = join_key(prefix, &key);
            if let Some(text) = self.override_value(&child_prefix) {
                out.insert(yaml_key, parse_scalar(&text));
            }
        }

        Value::Mapping(out)
    }

    fn overlay_key(&self, path: &[&str]) -> String {
        let mut key = self.prefix.clone();
        for part in path {
            key = join_key(&key, part);
        }
        key
    }

    /// Environment first, secret file second.
    fn override_value(&self, full_key: &str) -> Option<String> {
        if let Ok(value) = std::env::var(full_key) {
            return Some(value);
        }
        let secret_file = self.secrets_dir.join(full_key.to_lowercase());
        if secret_file.is_file() {
            return std::fs::read_to_string(secret_file)
                .ok()
                .map(|s| s.trim().to_string());
        }
        None
    }

    /// Keys present only in the overlay sources, one level below `prefix`.
    fn discovered_keys(&self, prefix: &str) -> BTreeSet<String> {
        let env_prefix = format!("{prefix}_");
        let mut keys: BTreeSet<String> = std::env::vars()
            .filter_map(|(name, _)| {
                name.strip_prefix(&env_prefix)
                    .map(|suffix| suffix.to_lowercase())
            })
            .collect();

        let file_prefix = env_prefix.to_lowercase();
        if let Ok(entries) = std::fs::read_dir(&self.secrets_dir) {
            for entry in entries.flatten() {
                if let Some(suffix) = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix(&file_prefix))
                {
                    keys.insert(suffix.to_string());
                }
            }
        }
        keys
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    let key = key.to_uppercase();
    if prefix.is_empty() {
        key
    } else {
        format!("{prefix}_{key}")
    }
}

/// Interpret an override string the way a YAML scalar would be read, so
/// `"5433"` deserializes into an integer field and `"true"` into a bool.
/// Anything that is not a plain scalar stays a string.
fn parse_scalar(text: &str) -> Value {
    match serde_yaml::from_str::<Value>(text) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Null)) => value,
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        serde_yaml::from_str(
            r#"
            db_host: localhost
            db_port: 5432
            api_client:
              api_url: https://api.example
            "#,
        )
        .unwrap()
    }

    #[test]
    fn yaml_values_pass_through_without_overrides() {
        let wrapper = ConfigWrapper::from_value(sample(), "WRAP_TEST_PLAIN");
        assert_eq!(
            wrapper.get(&["db_host"]).unwrap(),
            Value::String("localhost".into())
        );
        assert_eq!(
            wrapper.get(&["api_client", "api_url"]).unwrap(),
            Value::String("https://api.example".into())
        );
        assert_eq!(wrapper.get(&["missing"]), None);
    }

    #[test]
    fn environment_overrides_a_nested_leaf() {
        std::env::set_var("WRAP_TEST_ENV_API_CLIENT_API_URL", "https://other.example");
        let wrapper = ConfigWrapper::from_value(sample(), "WRAP_TEST_ENV");
        assert_eq!(
            wrapper.get(&["api_client", "api_url"]).unwrap(),
            Value::String("https://other.example".into())
        );

        let resolved = wrapper.resolved();
        assert_eq!(
            resolved["api_client"]["api_url"],
            Value::String("https://other.example".into())
        );
        std::env::remove_var("WRAP_TEST_ENV_API_CLIENT_API_URL");
    }

    #[test]
    fn numeric_overrides_deserialize_as_numbers() {
        std::env::set_var("WRAP_TEST_NUM_DB_PORT", "5433");
        let wrapper = ConfigWrapper::from_value(sample(), "WRAP_TEST_NUM");
        let resolved = wrapper.resolved();
        assert_eq!(resolved["db_port"], Value::Number(5433.into()));
        std::env::remove_var("WRAP_TEST_NUM_DB_PORT");
    }

    #[test]
    fn secret_file_fills_in_a_key_absent_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wrap_test_sec_db_password"), "s3cret\n").unwrap();

        let wrapper =
            ConfigWrapper::from_value(sample(), "WRAP_TEST_SEC").with_secrets_dir(dir.path());
        assert_eq!(
            wrapper.get(&["db_password"]).unwrap(),
            Value::String("s3cret".into())
        );
        let resolved = wrapper.resolved();
        assert_eq!(resolved["db_password"], Value::String("s3cret".into()));
    }

    #[test]
    fn environment_wins_over_secret_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wrap_test_both_db_host"), "from-file").unwrap();
        std::env::set_var("WRAP_TEST_BOTH_DB_HOST", "from-env");

        let wrapper =
            ConfigWrapper::from_value(sample(), "WRAP_TEST_BOTH").with_secrets_dir(dir.path());
        assert_eq!(
            wrapper.get(&["db_host"]).unwrap(),
            Value::String("from-env".into())
        );
        std::env::remove_var("WRAP_TEST_BOTH_DB_HOST");
    }

    #[test]
    fn missing_file_is_a_not_found_error() {
        let err =
            ConfigWrapper::from_yaml_file(Path::new("/nonexistent/config.yaml"), "X").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
