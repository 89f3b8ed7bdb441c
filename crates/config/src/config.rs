//! Server configuration
//!
//! The configuration is immutable once built and validated; the server
//! keeps it for its whole lifetime.

use localns_core::{
    Error, Result, UserName, DEFAULT_CACHE_CAPACITY, DEFAULT_POLICY_FILE_NAME,
    DEFAULT_STORE_ENDPOINT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Validated configuration for one served root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Absolute local directory exposed as the owner's tree
    pub root: PathBuf,
    /// Owner of the name space; writer of every entry
    pub owner: UserName,
    /// Location hint placed in every content reference
    pub store_endpoint: String,
    /// Maximum number of cached file entries
    pub cache_capacity: usize,
    /// Name of per-directory policy files
    pub policy_file_name: String,
    /// Hex seed file for the current signing key
    pub signing_key: Option<PathBuf>,
    /// Hex seed file for the previous signing key during rotation
    pub rotation_key: Option<PathBuf>,
}

impl ServerConfig {
    pub fn builder(root: impl Into<PathBuf>, owner: UserName) -> ServerConfigBuilder {
        ServerConfigBuilder::new(root, owner)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.root.is_absolute() {
            return Err(Error::configuration(format!(
                "root '{}' must be an absolute path",
                self.root.display()
            )));
        }
        if self.cache_capacity == 0 {
            return Err(Error::configuration("cache_capacity must be non-zero"));
        }
        if self.store_endpoint.is_empty() {
            return Err(Error::configuration("store_endpoint must not be empty"));
        }
        let name = &self.policy_file_name;
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(Error::configuration(format!(
                "policy_file_name {name:?} must be a single path element"
            )));
        }
        Ok(())
    }
}

/// Source of configuration values, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
    /// Command line argument
    CommandLine,
}

/// Builder for creating server configurations
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create a new builder with defaults for everything but root and owner
    pub fn new(root: impl Into<PathBuf>, owner: UserName) -> Self {
        Self {
            config: ServerConfig {
                root: root.into(),
                owner,
                store_endpoint: DEFAULT_STORE_ENDPOINT.to_string(),
                cache_capacity: DEFAULT_CACHE_CAPACITY,
                policy_file_name: DEFAULT_POLICY_FILE_NAME.to_string(),
                signing_key: None,
                rotation_key: None,
            },
        }
    }

    /// Set the store endpoint
    pub fn with_store_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.store_endpoint = endpoint.into();
        self
    }

    /// Set the cache capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the policy file name
    pub fn with_policy_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.policy_file_name = name.into();
        self
    }

    /// Set the signing key file
    pub fn with_signing_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.signing_key = Some(path.into());
        self
    }

    /// Set the rotation key file
    pub fn with_rotation_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rotation_key = Some(path.into());
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
