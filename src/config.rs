use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nested keys are separated by `__`
/// (`LESSONFORGE_GENERATION__TIMEOUT_SECS=30`).
pub const ENV_PREFIX: &str = "LESSONFORGE_";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    /// Model selector → provider endpoint
    pub providers: BTreeMap<String, ProviderConfig>,
    /// Selector used when a request does not name one
    pub default_model: String,
    pub storage: StorageConfig,
    pub resolution: ResolutionConfig,
    pub logging: LoggingConfig,
}

/// Generate-validate-repair settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Per-call generator timeout in seconds.
    pub timeout_secs: u64,
    /// Repair budget used when a request does not set one.
    pub max_repair: u32,
    pub plan_temperature: f32,
    pub card_temperature: f32,
    pub enhance_temperature: f32,
    pub max_tokens: u32,
}

/// One OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key, if the endpoint needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    /// SQLite file name inside the data directory.
    pub sqlite_file: String,
    /// SurrealDB (RocksDB) directory name inside the data directory.
    pub graph_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub max_vocabulary: usize,
    pub max_grammar: usize,
    /// Entries in the per-candidate lookup cache.
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    /// Also write JSON logs to a daily rolling file in the data directory.
    pub file_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
            },
        );

        Self {
            generation: GenerationConfig::default(),
            providers,
            default_model: "openai".to_string(),
            storage: StorageConfig::default(),
            resolution: ResolutionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 90,
            max_repair: 2,
            plan_temperature: 0.4,
            card_temperature: 0.7,
            enhance_temperature: 0.3,
            max_tokens: 4096,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sqlite_file: "lessonforge.db".to_string(),
            graph_dir: "graph".to_string(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_vocabulary: 20,
            max_grammar: 10,
            cache_size: 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `~/.config/lessonforge/config.toml` (or
    /// `path`), then `LESSONFORGE_*` environment variables.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if config_path.exists() {
            log::info!("Loading config from {}", config_path.display());
        } else {
            log::debug!("No config file at {}, using defaults", config_path.display());
        }
        Self::figment(&config_path).extract()
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("lessonforge"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.sqlite_file)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.graph_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("lessonforge").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
