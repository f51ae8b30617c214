use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use stylist_assets::StorageConfig;
use stylist_llm::{ResponsesConfig, TitleOptions};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub storage: StorageSettings,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for producing response headers; streamed bodies are not cut
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stylist.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub title_timeout_ms: u64,
    pub stream_buffer: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            title_timeout_ms: 30_000,
            stream_buffer: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub bucket: String,
    pub account_id: String,
    pub endpoint_host: String,
    pub region: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            account_id: String::new(),
            endpoint_host: stylist_assets::config::DEFAULT_ENDPOINT_HOST.to_string(),
            region: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub model_api_key: String,
    pub storage_access_key_id: String,
    pub storage_secret_access_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secrets { .. }")
    }
}

/// Environment variables that override individual config keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
    ("DATABASE_URL", "database.url"),
    ("DATABASE_MAX_CONNECTIONS", "database.max_connections"),
    ("LLM_ENDPOINT", "llm.endpoint"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TITLE_TIMEOUT_MS", "llm.title_timeout_ms"),
    ("LLM_STREAM_BUFFER", "llm.stream_buffer"),
    ("STORAGE_BUCKET", "storage.bucket"),
    ("STORAGE_ACCOUNT_ID", "storage.account_id"),
    ("STORAGE_ENDPOINT_HOST", "storage.endpoint_host"),
    ("STORAGE_REGION", "storage.region"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to `dev`)
    /// 3. Environment variables (SERVER_, DATABASE_, LLM_, STORAGE_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_with("config", &env, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an explicit directory and variable lookup
    pub fn load_with(
        config_dir: &str,
        env: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("{}/{}", config_dir, env)).required(false));

        // 3. Environment variables override everything
        let builder = apply_env_overrides(builder, &lookup)?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.secrets = load_secrets(&lookup)?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn responses_config(&self) -> ResponsesConfig {
        ResponsesConfig::new(self.secrets.model_api_key.clone(), self.llm.model.clone())
            .with_endpoint(self.llm.endpoint.clone())
            .with_stream_buffer(self.llm.stream_buffer)
    }

    pub fn storage_config(&self) -> StorageConfig {
        let mut storage = StorageConfig::new(
            self.storage.bucket.clone(),
            self.storage.account_id.clone(),
            self.secrets.storage_access_key_id.clone(),
            self.secrets.storage_secret_access_key.clone(),
        );
        storage.endpoint_host = self.storage.endpoint_host.clone();
        storage.region = self.storage.region.clone();
        storage
    }

    pub fn title_options(&self) -> TitleOptions {
        TitleOptions::default().with_timeout(Duration::from_millis(self.llm.title_timeout_ms))
    }
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(*key, lookup(var))?;
    }
    Ok(builder)
}

fn load_secrets(lookup: &impl Fn(&str) -> Option<String>) -> Result<Secrets, ConfigError> {
    let required = |name: &str| {
        lookup(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::Message(format!("{} environment variable is required", name)))
    };

    Ok(Secrets {
        model_api_key: required("MODEL_API_KEY")?,
        storage_access_key_id: required("STORAGE_ACCESS_KEY_ID")?,
        storage_secret_access_key: required("STORAGE_SECRET_ACCESS_KEY")?,
    })
}
