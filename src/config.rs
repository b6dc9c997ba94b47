use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Working directory holding the SQLite store. Deleted on startup and
    /// clean exit unless the session is opened with keep_data.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cqa-data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// k-NN depth per passage collection.
    #[serde(default = "default_per_source_k")]
    pub per_source_k: usize,
    /// Matches shown to the user.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Matches joined into the LLM context string. Display is concise but
    /// context is generous, so this is allowed to exceed top_k.
    #[serde(default = "default_top_k_context")]
    pub top_k_context: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            per_source_k: default_per_source_k(),
            top_k: default_top_k(),
            top_k_context: default_top_k_context(),
        }
    }
}

fn default_per_source_k() -> usize {
    5
}
fn default_top_k() -> usize {
    5
}
fn default_top_k_context() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// A cached query within this cosine distance of the incoming query is
    /// a hit. Comparison is strict (distance < threshold).
    #[serde(default = "default_cache_threshold")]
    pub threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            threshold: default_cache_threshold(),
        }
    }
}

fn default_cache_threshold() -> f64 {
    0.2
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `ollama` or `openai`.
    #[serde(default = "default_embed_provider")]
    pub provider: String,
    #[serde(default = "default_embed_model")]
    pub model: String,
    /// Base URL for the Ollama API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embed_provider(),
            model: default_embed_model(),
            base_url: default_ollama_url(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embed_provider() -> String {
    "ollama".to_string()
}
fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Generation may take many seconds on local models.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_ollama_url(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_model() -> String {
    "llama3".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Timeout for URL ingestion; an unreachable page must not hang the
    /// session indefinitely.
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Database file inside the working directory.
    pub fn db_path(&self) -> PathBuf {
        self.data.dir.join("cqa.sqlite")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Load and validate a TOML config file. A missing file falls back to
/// defaults so `cqa` runs out of the box against a local Ollama.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.per_source_k == 0 {
        anyhow::bail!("retrieval.per_source_k must be >= 1");
    }
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.top_k_context < config.retrieval.top_k {
        anyhow::bail!("retrieval.top_k_context must be >= retrieval.top_k");
    }
    if !config.cache.threshold.is_finite() || config.cache.threshold < 0.0 {
        anyhow::bail!("cache.threshold must be a non-negative number");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }
    match config.embedding.provider.as_str() {
        "ollama" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be ollama or openai.",
            other
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/cqa.toml")).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.top_k_context, 10);
        assert!((config.cache.threshold - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_context_k_below_display_k() {
        let config: Config = toml::from_str(
            r#"
            [retrieval]
            top_k = 8
            top_k_context = 4
            "#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_unknown_embedding_provider() {
        let config: Config = toml::from_str(
            r#"
            [embedding]
            provider = "sentencepiece"
            "#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn parses_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            threshold = 0.35

            [llm]
            model = "mistral"
            "#,
        )
        .unwrap();
        validate(&config).unwrap();
        assert!((config.cache.threshold - 0.35).abs() < 1e-12);
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.embedding.provider, "ollama");
    }
}
