//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TALLY";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Periodic job configuration.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Operator access configuration.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site, used to build links in article notifications.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// In-process scheduler settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Whether periodic jobs run inside the server process.
    ///
    /// Disable when an external cron calls `/api/blog/publish-scheduled`.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between scheduled-post publish sweeps.
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
    /// Seconds between vote counter reconciliation runs.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            publish_interval_secs: default_publish_interval(),
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

/// Operator access configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for admin and cron endpoints. Admin endpoints are
    /// refused while this is unset.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_publish_interval() -> u64 {
    300
}

const fn default_reconcile_interval() -> u64 {
    86_400
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `TALLY_ENV`)
    /// 4. Environment variables with `TALLY__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("TALLY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse(
            r#"
            [server]
            url = "https://example.com"

            [database]
            url = "postgres://localhost/tally"
            "#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.publish_interval_secs, 300);
        assert!(config.admin.token.is_none());
    }

    #[test]
    fn test_explicit_sections() {
        let config = parse(
            r#"
            [server]
            port = 8080
            url = "https://example.com"

            [database]
            url = "postgres://localhost/tally"

            [scheduler]
            enabled = false
            publish_interval_secs = 60

            [admin]
            token = "secret"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.publish_interval_secs, 60);
        assert_eq!(config.scheduler.reconcile_interval_secs, 86_400);
        assert_eq!(config.admin.token.as_deref(), Some("secret"));
    }
}
