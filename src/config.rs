use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,

    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret for signing access tokens. Required; must differ from the
    /// refresh secret so a leak of one cannot forge the other.
    pub access_secret: String,

    /// Access token lifetime in seconds.
    pub access_expires_secs: u64,

    /// Secret for signing refresh tokens. Required.
    pub refresh_secret: String,

    /// Refresh token lifetime in seconds.
    pub refresh_expires_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            access_expires_secs: 15 * 60,
            refresh_secret: String::new(),
            refresh_expires_secs: 30 * 24 * 60 * 60,
        }
    }
}

/// Storage backend, chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Relational,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,

    /// Connection URL. `sqlite:`/`postgres:` for the relational backend,
    /// `mongodb:` for the document backend.
    pub url: String,

    /// Database name, used by the document backend.
    pub database_name: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Relational,
            url: "sqlite:gatehouse.db".to_string(),
            database_name: "gatehouse".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Self::default_config_path();
        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Secrets and the database URL can come from the environment so they
    /// stay out of the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("GATEHOUSE_AUTH_ACCESS_SECRET") {
            self.auth.access_secret = secret;
        }
        if let Ok(secret) = std::env::var("GATEHOUSE_AUTH_REFRESH_SECRET") {
            self.auth.refresh_secret = secret;
        }
        if let Ok(url) = std::env::var("GATEHOUSE_DATABASE_URL") {
            self.database.url = url;
        }
    }

    /// Startup-fatal misconfiguration gate. A config that passes here never
    /// produces a per-request signing or connection-setup error later.
    pub fn validate(&self) -> Result<()> {
        if self.auth.access_secret.is_empty() {
            anyhow::bail!("auth.access_secret must be set");
        }

        if self.auth.refresh_secret.is_empty() {
            anyhow::bail!("auth.refresh_secret must be set");
        }

        if self.auth.access_secret == self.auth.refresh_secret {
            anyhow::bail!("auth.access_secret and auth.refresh_secret must differ");
        }

        if self.auth.access_expires_secs == 0 || self.auth.refresh_expires_secs == 0 {
            anyhow::bail!("token lifetimes must be > 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("database.url must be set");
        }

        if self.database.backend == StorageBackend::Document
            && self.database.database_name.is_empty()
        {
            anyhow::bail!("database.database_name must be set for the document backend");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.auth.access_secret = "access-secret".to_string();
        config.auth.refresh_secret = "refresh-secret".to_string();
        config
    }

    #[test]
    fn default_config_fails_validation_without_secrets() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn shared_secret_is_rejected() {
        let mut config = valid_config();
        config.auth.refresh_secret.clone_from(&config.auth.access_secret);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = valid_config();
        config.auth.access_expires_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn document_backend_requires_database_name() {
        let mut config = valid_config();
        config.database.backend = StorageBackend::Document;
        config.database.database_name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_parses_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            access_secret = "a"
            refresh_secret = "r"
            access_expires_secs = 900

            [database]
            backend = "document"
            url = "mongodb://localhost:27017"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, StorageBackend::Document);
        assert_eq!(config.auth.access_expires_secs, 900);
        assert_eq!(config.auth.refresh_expires_secs, 30 * 24 * 60 * 60);
    }
}
