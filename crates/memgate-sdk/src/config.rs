//! memgate configuration
//!
//! One TOML file drives the whole engine:
//!
//! ```toml
//! [gate]
//! similarity_threshold = 0.9
//! skip_words = ["ok", "thanks"]
//!
//! [embedding]
//! provider = "hashing"
//! dimensions = 384
//!
//! [classifier]
//! provider = "keyword"
//!
//! [store]
//! provider = "sqlite"
//! path = "/var/lib/memgate/memgate.db"
//! ```
//!
//! Lookup order: `MEMGATE_CONFIG`, then `config.toml` in the platform data
//! directory, then built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use memgate_core::{Error, GateConfig, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "MEMGATE_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemgateConfig {
    /// Gate thresholds and phrase lists
    #[serde(default)]
    pub gate: GateConfig,

    /// Embedding provider selection
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Classifier selection (none by default)
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Vector store selection
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Registry name of the embedding provider (default: "hashing")
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Vector size for providers with configurable output (default: 384)
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Model name for model-backed providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Registry name of the classifier; absent disables classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Category → keywords for the keyword classifier; empty uses built-ins
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Registry name of the vector store (default: "memory")
    #[serde(default = "default_store_provider")]
    pub provider: String,

    /// Database file for persistent stores
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Collection used when none is named (default: "default")
    #[serde(default = "default_collection")]
    pub default_collection: String,
}

fn default_embedding_provider() -> String {
    "hashing".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_store_provider() -> String {
    "memory".to_string()
}

fn default_store_path() -> PathBuf {
    default_data_dir().join("memgate.db")
}

fn default_collection() -> String {
    "default".to_string()
}

/// Platform data directory for memgate
pub fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "memgate", "memgate") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".memgate")
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimensions: default_dimensions(),
            model: None,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: default_store_provider(),
            path: default_store_path(),
            default_collection: default_collection(),
        }
    }
}

impl MemgateConfig {
    /// Load from the resolved config path, falling back to defaults when no
    /// file exists there.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Config file location: `MEMGATE_CONFIG` or `<data dir>/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_embedding(mut self, embedding: EmbeddingSettings) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierSettings) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_store(mut self, store: StoreSettings) -> Self {
        self.store = store;
        self
    }

    /// Validate value ranges. Provider names are checked by the registry.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        self.gate
            .validate()
            .map_err(|e| ConfigValidationError::Gate(e.to_string()))?;

        if self.embedding.provider.trim().is_empty() {
            return Err(ConfigValidationError::MissingProvider("embedding"));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "embedding.dimensions".into(),
                message: "must be greater than 0".into(),
            });
        }

        if let Some((category, _)) = self
            .classifier
            .categories
            .iter()
            .find(|(_, keywords)| keywords.iter().all(|k| k.trim().is_empty()))
        {
            return Err(ConfigValidationError::InvalidValue {
                field: format!("classifier.categories.{}", category),
                message: "needs at least one keyword".into(),
            });
        }

        if self.store.provider.trim().is_empty() {
            return Err(ConfigValidationError::MissingProvider("store"));
        }

        if self.store.default_collection.trim().is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "store.default_collection".into(),
                message: "must not be empty".into(),
            });
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("{0} provider is required")]
    MissingProvider(&'static str),

    #[error("invalid gate settings: {0}")]
    Gate(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<ConfigValidationError> for Error {
    fn from(err: ConfigValidationError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = MemgateConfig::default();
        assert_eq!(config.embedding.provider, "hashing");
        assert_eq!(config.embedding.dimensions, 384);
        assert!(config.classifier.provider.is_none());
        assert_eq!(config.store.provider, "memory");
        assert_eq!(config.store.default_collection, "default");
        assert_eq!(config.gate, GateConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: MemgateConfig = toml::from_str(
            r#"
            [gate]
            min_content_length = 5
            skip_words = ["ok", "thanks"]

            [classifier]
            provider = "keyword"

            [classifier.categories]
            travel = ["flight", "hotel"]

            [store]
            provider = "sqlite"
            path = "/tmp/memgate-test.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.gate.min_content_length, 5);
        assert_eq!(config.gate.similarity_threshold, 0.90);
        assert_eq!(config.classifier.provider.as_deref(), Some("keyword"));
        assert_eq!(config.classifier.categories["travel"], vec!["flight", "hotel"]);
        assert_eq!(config.store.provider, "sqlite");
        assert_eq!(config.store.path, PathBuf::from("/tmp/memgate-test.db"));
        assert_eq!(config.store.default_collection, "default");
        assert_eq!(config.embedding.provider, "hashing");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = MemgateConfig::default()
            .with_gate(GateConfig::conversational())
            .with_store(StoreSettings {
                provider: "sqlite".into(),
                path: dir.path().join("memgate.db"),
                default_collection: "chat".into(),
            });
        config.save_to(&path).unwrap();

        let loaded = MemgateConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_thresholds_render_as_written() {
        let rendered = MemgateConfig::default().to_toml().unwrap();
        assert!(rendered.contains("similarity_threshold = 0.9\n"), "{rendered}");
        assert!(rendered.contains("confidence_threshold = 0.3\n"), "{rendered}");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[gate]\nsimilarity_threshold = 3.0\n").unwrap();
        assert!(matches!(MemgateConfig::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[gate\n").unwrap();
        assert!(matches!(MemgateConfig::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = MemgateConfig::default();
        config.embedding.dimensions = 0;
        assert!(config.validate().is_err());

        let mut config = MemgateConfig::default();
        config.store.default_collection = "  ".into();
        assert!(config.validate().is_err());

        let mut config = MemgateConfig::default();
        config.classifier.categories.insert("empty".into(), vec![]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("classifier.categories.empty"));

        let config = MemgateConfig::default()
            .with_gate(GateConfig::default().with_max_recent_embeddings(0));
        assert!(matches!(config.validate(), Err(ConfigValidationError::Gate(_))));
    }
}
