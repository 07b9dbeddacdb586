//! Secret providers
//!
//! Credentials are read once at startup into a `Credentials` value and
//! passed to whatever needs them. Nothing here writes to the process
//! environment.

use std::collections::HashMap;
use std::path::Path;

use crate::config::ConfigError;

/// Name of the Gemini API key secret
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

/// Source of named secret strings
pub trait SecretProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads secrets from environment variables
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Flat `KEY = "value"` TOML table, e.g. a `secrets.toml`
#[derive(Debug, Default, Clone)]
pub struct SecretsFile {
    values: HashMap<String, String>,
}

impl SecretsFile {
    /// Load a secrets file. A missing file is an empty provider.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse file contents; non-string values are ignored
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(contents)?;
        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }
}

impl SecretProvider for SecretsFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Tries providers in order, first hit wins
#[derive(Default)]
pub struct SecretChain {
    providers: Vec<Box<dyn SecretProvider>>,
}

impl SecretChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl SecretProvider for SecretChain {
    fn get(&self, key: &str) -> Option<String> {
        self.providers.iter().find_map(|p| p.get(key))
    }
}

/// API credentials for the model provider
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Fetch the API key, failing on absent or blank values
    pub fn load(provider: &dyn SecretProvider) -> Result<Self, ConfigError> {
        provider
            .get(GOOGLE_API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Self::new)
            .ok_or_else(|| ConfigError::MissingSecret(GOOGLE_API_KEY.to_string()))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixed(&'static str, &'static str);

    impl SecretProvider for Fixed {
        fn get(&self, key: &str) -> Option<String> {
            (key == self.0).then(|| self.1.to_string())
        }
    }

    #[test]
    fn test_secrets_file_parses_strings_only() {
        let secrets = SecretsFile::parse("GOOGLE_API_KEY = \"abc\"\nRETRIES = 3\n").unwrap();
        assert_eq!(secrets.get(GOOGLE_API_KEY).as_deref(), Some("abc"));
        assert_eq!(secrets.get("RETRIES"), None);
    }

    #[test]
    fn test_missing_secrets_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let secrets = SecretsFile::load(&dir.path().join("secrets.toml")).unwrap();
        assert_eq!(secrets.get(GOOGLE_API_KEY), None);
    }

    #[test]
    fn test_chain_prefers_first_provider() {
        let chain = SecretChain::new()
            .with(Fixed(GOOGLE_API_KEY, "from-first"))
            .with(Fixed(GOOGLE_API_KEY, "from-second"));
        assert_eq!(Credentials::load(&chain).unwrap().api_key(), "from-first");

        let fallback = SecretChain::new()
            .with(Fixed("OTHER", "x"))
            .with(Fixed(GOOGLE_API_KEY, "from-second"));
        assert_eq!(Credentials::load(&fallback).unwrap().api_key(), "from-second");
    }

    #[test]
    fn test_blank_or_absent_key_is_fatal() {
        let blank = Fixed(GOOGLE_API_KEY, "   ");
        assert!(matches!(Credentials::load(&blank), Err(ConfigError::MissingSecret(_))));

        let empty = SecretChain::new();
        let err = Credentials::load(&empty).unwrap_err();
        assert!(err.to_string().contains(GOOGLE_API_KEY));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials::new("super-secret");
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }
}
