//! Configuration manager for the accounts service.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
const DEFAULT_PORT: u16 = 8080;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Domain name of current instance.
    pub url: String,
    /// Listening port.
    #[serde(default = "default_port", skip_serializing)]
    pub port: u16,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to password storage.
    #[serde(default, skip_serializing)]
    pub password: Password,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to automatic mail sending.
    #[serde(skip_serializing)]
    pub mail: Option<Mail>,
    /// Related to OpenTelemetry export.
    #[serde(skip_serializing)]
    pub telemetry: Option<Telemetry>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: String::default(),
            url: String::default(),
            port: DEFAULT_PORT,
            version: String::default(),
            path: PathBuf::default(),
            postgres: None,
            password: Password::default(),
            argon2: None,
            mail: None,
            telemetry: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Hashing algorithm applied to new passwords.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordAlgorithm {
    #[default]
    Argon2,
    /// Unsalted MD5, kept for databases shared with the previous storefront.
    Md5,
}

/// Password storage configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Password {
    #[serde(default)]
    pub algorithm: PasswordAlgorithm,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Mail queue configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    /// Hostname:(?port) for RabbitMQ instance.
    pub address: String,
    /// RabbitMQ default vhost.
    pub vhost: Option<String>,
    /// RabbitMQ username to access queue.
    pub username: String,
    /// RabbitMQ password to access queue.
    pub password: String,
    /// Max channel connections.
    pub pool: Option<u16>,
    /// Queue name to send mailing events.
    pub queue: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// gRPC endpoint of an OTLP collector.
    pub otlp_endpoint: Option<String>,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Take the path from `CONFIG_PATH` when it is set.
    pub fn from_env(self) -> Self {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => self.path(PathBuf::from(path)),
            None => self,
        }
    }

    /// Public version of the running binary.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(&file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                config.version = VERSION.to_owned();
                config.path = file_path;
                if !config.url.is_empty() {
                    config.url = self.normalize_url(&config.url)?;
                }

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file cannot be read");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("{name}-{}.yaml", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_full_configuration() {
        let path = write_config(
            "accounts-full",
            r#"
name: Storefront
url: shop.example.com
port: 9000
password:
  algorithm: md5
argon2:
  memory_cost: 2048
  iterations: 2
  parallelism: 1
  hash_length: 32
postgres:
  address: localhost:5432
  pool_size: 4
telemetry:
  otlp_endpoint: http://localhost:4317
"#,
        );

        let config = Configuration::default().path(path.clone()).read().unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.name, "Storefront");
        assert_eq!(config.url, "https://shop.example.com/");
        assert_eq!(config.port, 9000);
        assert_eq!(config.version(), VERSION);
        assert_eq!(config.password.algorithm, PasswordAlgorithm::Md5);
        assert_eq!(config.argon2.as_ref().unwrap().memory_cost, 2048);
        assert_eq!(config.postgres.as_ref().unwrap().pool_size, Some(4));
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let path = write_config("accounts-minimal", "name: Storefront\nurl: ''\n");

        let config = Configuration::default().path(path.clone()).read().unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.password.algorithm, PasswordAlgorithm::Argon2);
        assert!(config.postgres.is_none());
    }

    #[test]
    fn test_invalid_yaml_falls_back_to_default() {
        let path = write_config("accounts-broken", "name: [unterminated");

        let config = Configuration::default().path(path.clone()).read().unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.name, String::default());
        assert_eq!(config.version(), VERSION);
    }
}
