use serde::Deserialize;

use crate::infrastructure::auth::JwtConfig;

pub const DEFAULT_ACCESS_SECRET: &str = "change-me-access-secret";
pub const DEFAULT_REFRESH_SECRET: &str = "change-me-refresh-secret";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub uploads: UploadsConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Front-end directory served at `/`
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub min_password_length: usize,
    pub rotate_refresh_tokens: bool,
    /// Expired session sweep interval; 0 disables the sweep
    pub session_sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub dir: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: DEFAULT_ACCESS_SECRET.to_string(),
            refresh_secret: DEFAULT_REFRESH_SECRET.to_string(),
            access_token_ttl_secs: JwtConfig::DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: JwtConfig::DEFAULT_REFRESH_TTL_SECS,
            min_password_length: crate::domain::account::DEFAULT_MIN_PASSWORD_LENGTH,
            rotate_refresh_tokens: true,
            session_sweep_interval_secs: 300,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"[hidden]")
            .field("refresh_secret", &"[hidden]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("min_password_length", &self.min_password_length)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .field("session_sweep_interval_secs", &self.session_sweep_interval_secs)
            .finish()
    }
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(&self.access_secret, &self.refresh_secret)
            .with_ttls(self.access_token_ttl_secs, self.refresh_token_ttl_secs)
    }

    /// True while either secret is still the shipped placeholder
    pub fn uses_default_secrets(&self) -> bool {
        self.access_secret == DEFAULT_ACCESS_SECRET || self.refresh_secret == DEFAULT_REFRESH_SECRET
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.auth.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.auth.min_password_length, 6);
        assert!(config.auth.rotate_refresh_tokens);
        assert!(config.auth.uses_default_secrets());
        assert_eq!(config.metrics.path, "/metrics");
    }

    #[test]
    fn test_default_secrets_are_usable() {
        assert!(AuthConfig::default().jwt_config().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[auth]\naccess_secret = \"a\"\nrefresh_secret = \"b\"\n\n[logging]\nformat = \"json\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.auth.access_secret, "a");
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.auth.uses_default_secrets());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let output = format!("{:?}", AuthConfig::default());
        assert!(!output.contains(DEFAULT_ACCESS_SECRET));
    }
}
