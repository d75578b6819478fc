use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigWrapper};

pub const DEFAULT_HARVEST_BATCH_SIZE: usize = 10;

/// Logging severity, spelled the way operations tooling expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Notset,
}

impl LogLevel {
    /// The equivalent `tracing` env-filter directive.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Notset => "trace",
        }
    }
}

/// A string that must not leak into logs or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiClientConfig {
    pub api_url: String,
    pub client_cert_path: PathBuf,
    pub client_key_path: PathBuf,
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub log_console_spans: bool,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn default_db_port() -> u16 {
    5432
}

fn default_arc_builds() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn default_db_batch_size() -> usize {
    100
}

fn default_max_studies() -> usize {
    5000
}

fn default_max_assays() -> usize {
    10000
}

fn default_arc_generation_timeout_minutes() -> u64 {
    30
}

/// Configuration of the database-driven conversion run.
#[derive(Debug, Clone, Deserialize)]
pub struct SqlConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    pub db_name: String,
    pub db_user: String,
    pub db_password: Secret,
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    pub rdi: String,
    pub rdi_url: String,

    /// Size of the CPU pool building ARCs.
    #[serde(default = "default_arc_builds")]
    pub max_concurrent_arc_builds: usize,
    /// Cap on simultaneously live record tasks. Defaults to four builds'
    /// worth of in-flight work.
    #[serde(default)]
    max_concurrent_tasks: Option<usize>,
    #[serde(default = "default_db_batch_size")]
    pub db_batch_size: usize,
    #[serde(default = "default_max_studies")]
    pub max_studies: usize,
    #[serde(default = "default_max_assays")]
    pub max_assays: usize,
    #[serde(default = "default_arc_generation_timeout_minutes")]
    pub arc_generation_timeout_minutes: u64,

    pub api_client: ApiClientConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

impl SqlConfig {
    pub fn from_wrapper(wrapper: &ConfigWrapper) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_value(wrapper.resolved())?;
        config.validate()?;
        Ok(config)
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
            .unwrap_or(self.max_concurrent_arc_builds * 4)
    }

    pub fn arc_generation_timeout(&self) -> Duration {
        Duration::from_secs(self.arc_generation_timeout_minutes * 60)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_concurrent_arc_builds", self.max_concurrent_arc_builds),
            ("max_concurrent_tasks", self.max_concurrent_tasks()),
            ("db_batch_size", self.db_batch_size),
            ("max_studies", self.max_studies),
            ("max_assays", self.max_assays),
            (
                "arc_generation_timeout_minutes",
                self.arc_generation_timeout_minutes as usize,
            ),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

fn default_rdi() -> String {
    "inspire-import".to_string()
}

fn default_harvest_batch_size() -> usize {
    DEFAULT_HARVEST_BATCH_SIZE
}

/// Configuration of the CSW harvest run.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    pub csw_url: String,
    #[serde(default = "default_rdi")]
    pub rdi: String,
    /// Upload batch size.
    #[serde(default = "default_harvest_batch_size")]
    pub batch_size: usize,
    /// Free-text constraint matched against the catalogue's AnyText index.
    #[serde(default)]
    pub query: Option<String>,

    pub api_client: ApiClientConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

impl HarvestConfig {
    pub fn from_wrapper(wrapper: &ConfigWrapper) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_value(wrapper.resolved())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn sql_yaml() -> Value {
        serde_yaml::from_str(
            r#"
            db_name: arcs
            db_user: reader
            db_password: hunter2
            db_host: localhost
            rdi: edaphobase
            rdi_url: https://portal.edaphobase.org
            api_client:
              api_url: https://sink.example
              client_cert_path: /certs/client.pem
              client_key_path: /certs/client.key
            "#,
        )
        .unwrap()
    }

    #[test]
    fn sql_defaults_are_applied() {
        let wrapper = ConfigWrapper::from_value(sql_yaml(), "SETTINGS_TEST_SQL");
        let config = SqlConfig::from_wrapper(&wrapper).unwrap();

        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_batch_size, 100);
        assert_eq!(config.max_studies, 5000);
        assert_eq!(config.max_assays, 10000);
        assert_eq!(config.arc_generation_timeout_minutes, 30);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.max_concurrent_arc_builds >= 1);
        assert_eq!(
            config.max_concurrent_tasks(),
            config.max_concurrent_arc_builds * 4
        );
        assert_eq!(config.api_client.request_timeout_seconds, 60);
    }

    #[test]
    fn explicit_task_cap_wins_over_the_derived_default() {
        let mut yaml = sql_yaml();
        let mapping = yaml.as_mapping_mut().unwrap();
        mapping.insert("max_concurrent_arc_builds".into(), 3.into());
        mapping.insert("max_concurrent_tasks".into(), 7.into());

        let wrapper = ConfigWrapper::from_value(yaml, "SETTINGS_TEST_SQL2");
        let config = SqlConfig::from_wrapper(&wrapper).unwrap();
        assert_eq!(config.max_concurrent_tasks(), 7);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut yaml = sql_yaml();
        yaml.as_mapping_mut()
            .unwrap()
            .insert("db_batch_size".into(), 0.into());
        let wrapper = ConfigWrapper::from_value(yaml, "SETTINGS_TEST_SQL3");
        let err = SqlConfig::from_wrapper(&wrapper).unwrap_err();
        assert!(err.to_string().contains("db_batch_size"));
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let wrapper = ConfigWrapper::from_value(sql_yaml(), "SETTINGS_TEST_SQL4");
        let config = SqlConfig::from_wrapper(&wrapper).unwrap();
        let debugged = format!("{config:?}");
        assert!(!debugged.contains("hunter2"));
        assert_eq!(config.db_password.expose(), "hunter2");
    }

    #[test]
    fn harvest_defaults_are_applied() {
        let yaml: Value = serde_yaml::from_str(
            r#"
            csw_url: https://catalogue.example/csw
            api_client:
              api_url: https://sink.example
              client_cert_path: /certs/client.pem
              client_key_path: /certs/client.key
            "#,
        )
        .unwrap();
        let wrapper = ConfigWrapper::from_value(yaml, "SETTINGS_TEST_HARVEST");
        let config = HarvestConfig::from_wrapper(&wrapper).unwrap();

        assert_eq!(config.rdi, "inspire-import");
        assert_eq!(config.batch_size, DEFAULT_HARVEST_BATCH_SIZE);
        assert_eq!(config.query, None);
    }

    #[test]
    fn log_levels_use_upstream_spelling() {
        let level: LogLevel = serde_yaml::from_str("WARNING").unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(level.as_filter(), "warn");
        assert!(serde_yaml::from_str::<LogLevel>("verbose").is_err());
    }
}
