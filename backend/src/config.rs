//! Configuration for the login backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the login endpoint is mounted on.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            login_path: default_login_path(),
        }
    }
}

/// Google Sign-In settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client IDs whose ID tokens are accepted (the `aud` claim).
    #[serde(default)]
    pub client_ids: Vec<String>,
    /// Issuer used for OpenID discovery.
    #[serde(default = "default_google_issuer")]
    pub issuer: String,
    /// Accepted values of the `iss` claim. Google uses both forms.
    #[serde(default = "default_allowed_issuers")]
    pub allowed_issuers: Vec<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_ids: Vec::new(),
            issuer: default_google_issuer(),
            allowed_issuers: default_allowed_issuers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Roles created at startup if missing.
    #[serde(default = "default_seed_roles")]
    pub seed_roles: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            seed_roles: default_seed_roles(),
        }
    }
}

/// Session token signing.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_login_path() -> String {
    "/google-login".to_string()
}
fn default_google_issuer() -> String {
    "https://accounts.google.com".to_string()
}
fn default_allowed_issuers() -> Vec<String> {
    vec![
        "accounts.google.com".to_string(),
        "https://accounts.google.com".to_string(),
    ]
}
fn default_database_url() -> String {
    "sqlite:./data/login.db".to_string()
}
fn default_seed_roles() -> Vec<String> {
    vec![crate::login::USER_ROLE_NAME.to_string()]
}
fn default_ttl_hours() -> i64 {
    24
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (GOOGLE_LOGIN__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("session.ttl_hours", default_ttl_hours())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("GOOGLE_LOGIN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("google.client_ids")
                    .with_list_parse_key("google.allowed_issuers")
                    .with_list_parse_key("database.seed_roles")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "session.secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Allowed CORS origins, or `None` for any origin.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins = self.cors.origins.trim();
        if origins == "*" {
            return None;
        }
        Some(
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert_eq!(server.login_path, "/google-login");
    }

    #[test]
    fn test_default_database_config_seeds_user_role() {
        let database = DatabaseConfig::default();
        assert_eq!(database.url, "sqlite:./data/login.db");
        assert_eq!(database.seed_roles, vec!["ROLE_USER".to_string()]);
    }

    #[test]
    fn test_google_config_defaults_from_minimal_toml() {
        let loader = ConfigLoader::builder()
            .add_source(config::File::from_str(
                r#"
                [google]
                client_ids = ["client-1"]

                [session]
                secret = "s3cret"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = loader.try_deserialize().unwrap();

        assert_eq!(config.google.issuer, "https://accounts.google.com");
        assert_eq!(config.google.allowed_issuers.len(), 2);
        assert_eq!(config.session.ttl_hours, 24);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret_fails_to_deserialize() {
        let loader = ConfigLoader::builder()
            .set_default("session.ttl_hours", 24)
            .unwrap()
            .build()
            .unwrap();
        assert!(loader.try_deserialize::<Config>().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = crate::test_util::test_config();
        config.session.secret = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cors_origins_wildcard() {
        let config = crate::test_util::test_config();
        assert!(config.cors_origins().is_none());
    }

    #[test]
    fn test_cors_origins_list() {
        let mut config = crate::test_util::test_config();
        config.cors.origins = "https://a.example, https://b.example,".to_string();
        assert_eq!(
            config.cors_origins(),
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn test_session_debug_redacts_secret() {
        let config = crate::test_util::test_config();
        let debug = format!("{:?}", config.session);
        assert!(!debug.contains(&config.session.secret));
        assert!(debug.contains("redacted"));
    }
}
