use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Environment variable overriding `inference.base_url`.
pub const BASE_URL_ENV: &str = "OLLAMA_API_URL";

/// Model used when a chat request names none.
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.inference.base_url = base_url;
        }
    }

    /// Check values that serde cannot and normalize them.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let trimmed = self.inference.base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl(trimmed.to_string(), e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        self.inference.base_url = trimmed.to_string();

        if self.inference.default_model.trim().is_empty() {
            self.inference.default_model = DEFAULT_MODEL.to_string();
        }
        Ok(())
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole gateway request; should exceed
    /// `inference.chat_timeout_seconds`.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    330
}

fn default_cors_permissive() -> bool {
    true
}

// ============================================================================
// InferenceConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_seconds: u64,
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_seconds: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            chat_timeout_seconds: default_chat_timeout(),
            catalog_timeout_seconds: default_catalog_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_chat_timeout() -> u64 {
    300
}

fn default_catalog_timeout() -> u64 {
    10
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("invalid inference base url '{0}': {1}")]
    InvalidBaseUrl(String, #[source] url::ParseError),

    #[error("unsupported inference base url scheme '{0}'")]
    UnsupportedScheme(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 330);
        assert!(config.server.cors_permissive);
        assert_eq!(config.inference.base_url, "http://localhost:11434");
        assert_eq!(config.inference.default_model, "llama3.2:latest");
        assert_eq!(config.inference.chat_timeout_seconds, 300);
        assert_eq!(config.inference.catalog_timeout_seconds, 10);
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(&missing_path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.inference.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 60
  cors_permissive: false
inference:
  base_url: "http://gpu-box:11434"
  default_model: "mistral:latest"
  chat_timeout_seconds: 45
  catalog_timeout_seconds: 3
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert!(!config.server.cors_permissive);
        assert_eq!(config.inference.base_url, "http://gpu-box:11434");
        assert_eq!(config.inference.default_model, "mistral:latest");
        assert_eq!(config.inference.chat_timeout_seconds, 45);
        assert_eq!(config.inference.catalog_timeout_seconds, 3);
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0"); // default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.inference.default_model, "llama3.2:latest"); // default
        assert_eq!(config.inference.chat_timeout_seconds, 300); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config =
            serde_saphyr::from_str(include_str!("../../../ollama-chat.example.yaml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.inference.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_env_overrides_base_url() {
        let mut config = Config::default();
        config.apply_env(|key| {
            (key == BASE_URL_ENV).then(|| "http://remote:11434".to_string())
        });
        assert_eq!(config.inference.base_url, "http://remote:11434");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config.inference.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_validate_trims_trailing_slash() {
        let mut config = Config::default();
        config.inference.base_url = "http://localhost:11434/".to_string();
        config.validate().unwrap();
        assert_eq!(config.inference.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_validate_rejects_garbage_url() {
        let mut config = Config::default();
        config.inference.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(..))
        ));
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let mut config = Config::default();
        config.inference.base_url = "ftp://localhost:11434".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_validate_restores_blank_default_model() {
        let mut config = Config::default();
        config.inference.default_model = "".to_string();
        config.validate().unwrap();
        assert_eq!(config.inference.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_config_error_display() {
        let io_error = ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ));
        assert!(io_error.to_string().contains("failed to read config file"));
    }
}
