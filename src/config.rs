use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors that stop the process at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secret `{0}` not found. Configure it in the environment or the secrets file.")]
    MissingSecret(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DermsqlConfig {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub server: ServerConfig,
    pub secrets: SecretsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Persistent location the app reads from
    pub path: PathBuf,
    /// Bundled database copied on first run, if present
    pub seed: Option<PathBuf>,
    /// Create a sample database when no seed file exists
    pub synthesize: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path_in(Path::new(".")),
            seed: Some(PathBuf::from("doctors.db")),
            synthesize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// SQL attempts per question before giving up
    pub max_attempts: usize,
    /// Rows shown to the model when phrasing the answer
    pub row_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            row_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsConfig {
    /// Flat TOML table of secrets, consulted after the environment
    pub file: Option<PathBuf>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("secrets.toml")),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("dermsql.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join("data").join("doctors.db")
}

/// Load the config file; a missing file yields defaults
pub fn load_config(path: Option<&Path>) -> Result<DermsqlConfig, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(DermsqlConfig::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

pub fn write_config(path: &Path, config: &DermsqlConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
