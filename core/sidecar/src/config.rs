// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0
//
// ConfigLoader parses the configuration file once and exposes cached
// accessors for the tracing and server sections. Missing sections fall back
// to defaults.

use std::collections::HashSet;
use std::time::Duration;

use duration_str::deserialize_duration;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_yaml::{Value, from_str};
use sidecar_tracing::TracingConfiguration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid configuration - impossible to parse yaml")]
    InvalidYaml,
    #[error("invalid configuration - key {0} not valid")]
    InvalidKey(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

lazy_static! {
    static ref CONFIG_KEYS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("tracing");
        s.insert("server");
        s
    };
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ServerConfiguration {
    /// identifier of the application behind this sidecar
    #[serde(default = "default_app_id")]
    app_id: String,

    /// deadline applied to calls that arrive without one
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    default_timeout: Duration,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        ServerConfiguration {
            app_id: default_app_id(),
            default_timeout: default_timeout(),
        }
    }
}

fn default_app_id() -> String {
    "sidecar".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl ServerConfiguration {
    pub fn new() -> Self {
        ServerConfiguration::default()
    }

    pub fn with_app_id(self, app_id: &str) -> Self {
        ServerConfiguration {
            app_id: app_id.to_string(),
            ..self
        }
    }

    pub fn with_default_timeout(self, default_timeout: Duration) -> Self {
        ServerConfiguration {
            default_timeout,
            ..self
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

pub struct ConfigLoader {
    root: Value,
    tracing: Option<TracingConfiguration>,
    server: Option<ServerConfiguration>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let root_keys = self
            .root
            .as_mapping()
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str())
                    .map(|s| s.to_string())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        f.debug_struct("ConfigLoader")
            .field("root_keys", &root_keys)
            .field("tracing_loaded", &self.tracing.is_some())
            .field("server_loaded", &self.server.is_some())
            .finish()
    }
}

impl ConfigLoader {
    pub fn new(file_path: &str) -> Result<Self, ConfigError> {
        let config_str =
            std::fs::read_to_string(file_path).map_err(|e| ConfigError::NotFound(e.to_string()))?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let root: Value = from_str(config_str).map_err(|_| ConfigError::InvalidYaml)?;

        // an empty document is an empty configuration
        if !root.is_null() {
            let mapping = root.as_mapping().ok_or(ConfigError::InvalidYaml)?;
            for key in mapping.keys() {
                let k = key.as_str().ok_or(ConfigError::InvalidYaml)?;
                if !CONFIG_KEYS.contains(k) {
                    return Err(ConfigError::InvalidKey(k.to_string()));
                }
            }
        }

        Ok(Self {
            root,
            tracing: None,
            server: None,
        })
    }

    /// Tracing section. A section that does not parse falls back to the
    /// defaults; a sampling rate outside [0, 1] is an error.
    pub fn tracing(&mut self) -> Result<&TracingConfiguration, ConfigError> {
        if self.tracing.is_none() {
            let cfg = self.section("tracing", TracingConfiguration::default);
            cfg.validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            debug!(?cfg, "Tracing configuration loaded");
            self.tracing = Some(cfg);
        }
        Ok(self.tracing.get_or_insert_with(TracingConfiguration::default))
    }

    pub fn server(&mut self) -> &ServerConfiguration {
        if self.server.is_none() {
            let cfg = self.section("server", ServerConfiguration::default);
            debug!(?cfg, "Server configuration loaded");
            self.server = Some(cfg);
        }
        self.server.get_or_insert_with(ServerConfiguration::default)
    }

    fn section<T>(&self, key: &str, default: fn() -> T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.root
            .get(key)
            .cloned()
            .map(|v| {
                serde_yaml::from_value(v).unwrap_or_else(|e| {
                    warn!(
                        error = ?e,
                        section = key,
                        "invalid config section, falling back to default"
                    );
                    default()
                })
            })
            .unwrap_or_else(default)
    }
}
