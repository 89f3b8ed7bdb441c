//! Configuration loader
//!
//! Layers, lowest precedence first: defaults, the JSON config file,
//! `LOCALNS_*` environment variables, explicit overrides.

use crate::config::{ConfigSource, ServerConfig, ServerConfigBuilder};
use localns_core::{
    Error, Result, UserName, LOCALNS_CACHE_CAPACITY_VAR, LOCALNS_OWNER_VAR,
    LOCALNS_ROOT_VAR, LOCALNS_ROTATION_KEY_VAR, LOCALNS_SIGNING_KEY_VAR,
    LOCALNS_STORE_ENDPOINT_VAR,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One layer of configuration; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub root: Option<PathBuf>,
    pub owner: Option<String>,
    pub store_endpoint: Option<String>,
    pub cache_capacity: Option<usize>,
    pub policy_file_name: Option<String>,
    pub signing_key: Option<PathBuf>,
    pub rotation_key: Option<PathBuf>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, "read config", e))?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::configuration(format!("config file '{}': {e}", path.display()))
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the `LOCALNS_*` variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let cache_capacity = match lookup(LOCALNS_CACHE_CAPACITY_VAR) {
            Some(v) => Some(v.trim().parse::<usize>().map_err(|e| {
                Error::configuration(format!("{LOCALNS_CACHE_CAPACITY_VAR}={v:?}: {e}"))
            })?),
            None => None,
        };
        Ok(PartialConfig {
            root: lookup(LOCALNS_ROOT_VAR).map(PathBuf::from),
            owner: lookup(LOCALNS_OWNER_VAR),
            store_endpoint: lookup(LOCALNS_STORE_ENDPOINT_VAR),
            cache_capacity,
            policy_file_name: None,
            signing_key: lookup(LOCALNS_SIGNING_KEY_VAR).map(PathBuf::from),
            rotation_key: lookup(LOCALNS_ROTATION_KEY_VAR).map(PathBuf::from),
        })
    }

    /// Fields set in `over` replace ours
    #[must_use]
    pub fn merge(self, over: PartialConfig) -> PartialConfig {
        PartialConfig {
            root: over.root.or(self.root),
            owner: over.owner.or(self.owner),
            store_endpoint: over.store_endpoint.or(self.store_endpoint),
            cache_capacity: over.cache_capacity.or(self.cache_capacity),
            policy_file_name: over.policy_file_name.or(self.policy_file_name),
            signing_key: over.signing_key.or(self.signing_key),
            rotation_key: over.rotation_key.or(self.rotation_key),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PartialConfig::default()
    }

    fn finish(self) -> Result<ServerConfig> {
        let root = self
            .root
            .ok_or_else(|| Error::configuration("no root directory configured"))?;
        let owner = self
            .owner
            .ok_or_else(|| Error::configuration("no owner configured"))?;
        let owner = UserName::new(owner)?;

        let mut builder = ServerConfigBuilder::new(root, owner);
        if let Some(endpoint) = self.store_endpoint {
            builder = builder.with_store_endpoint(endpoint);
        }
        if let Some(capacity) = self.cache_capacity {
            builder = builder.with_cache_capacity(capacity);
        }
        if let Some(name) = self.policy_file_name {
            builder = builder.with_policy_file_name(name);
        }
        if let Some(key) = self.signing_key {
            builder = builder.with_signing_key(key);
        }
        if let Some(key) = self.rotation_key {
            builder = builder.with_rotation_key(key);
        }
        builder.build()
    }
}

/// Configuration loader that handles startup configuration
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: PartialConfig,
    read_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            overrides: PartialConfig::default(),
            read_env: true,
        }
    }

    /// Read a JSON config file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Values that win over every other layer
    pub fn overrides(mut self, overrides: PartialConfig) -> Self {
        self.overrides = overrides;
        self
    }

    /// Ignore `LOCALNS_*` environment variables
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Load the configuration, reporting which layers contributed
    pub fn load_with_sources(self) -> Result<(ServerConfig, Vec<ConfigSource>)> {
        let mut sources = vec![ConfigSource::Default];
        let mut merged = PartialConfig::default();

        if let Some(path) = &self.file {
            merged = merged.merge(PartialConfig::from_file(path)?);
            sources.push(ConfigSource::ConfigFile(path.clone()));
        }

        if self.read_env {
            let env = PartialConfig::from_env()?;
            if !env.is_empty() {
                sources.push(ConfigSource::EnvironmentVariable("LOCALNS_*".to_string()));
            }
            merged = merged.merge(env);
        }

        if !self.overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }
        let config = merged.merge(self.overrides).finish()?;

        tracing::debug!(?sources, root = %config.root.display(), owner = %config.owner, "configuration loaded");
        Ok((config, sources))
    }

    pub fn load(self) -> Result<ServerConfig> {
        self.load_with_sources().map(|(config, _)| config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
