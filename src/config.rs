// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service configuration loaded from a YAML file.
//!
//! The configuration is loaded once at startup and passed by reference into every
//! component that needs it; there is no global instance.
//!
//! # Example
//!
//! ```yaml
//! system:
//!   environment: "production"
//! router:
//!   port: 9595
//! nats:
//!   connectionString: "nats://nats:4222"
//!   jwt: "eyJ0..."
//!   seed: "SUAM..."
//! cluster:
//!   namespace: "default"
//!   certManagerIssuer: "letsencrypt-prod"
//!   serviceName: "your-service"
//!   servicePort: 3000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_CONCURRENT_DELIVERIES, DEFAULT_ROUTER_PORT, DEVELOPMENT_ENVIRONMENT,
};

/// Errors raised while loading or validating the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read
        path: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Config`]
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A setting is missing or out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// NATS connection settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatsConfig {
    /// Server URL (e.g., `nats://localhost:4222`)
    #[serde(default)]
    pub connection_string: String,

    /// User JWT, required outside development
    #[serde(default, skip_serializing)]
    pub jwt: String,

    /// User NKey seed used to sign the server nonce, required outside development
    #[serde(default, skip_serializing)]
    pub seed: String,

    /// Number of deliveries the job worker handles at the same time
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,
}

/// HTTP ingestion router settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    /// Listen port
    #[serde(default = "default_router_port")]
    pub port: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_ROUTER_PORT,
        }
    }
}

/// Process-wide settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// Environment namespace used to scope stream names and subjects
    #[serde(default)]
    pub environment: String,
}

/// Cluster settings used by the Environment Reconciler.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Namespace holding the secrets and ingresses
    #[serde(default)]
    pub namespace: String,

    /// cert-manager cluster issuer used when the caller supplies no certificate
    #[serde(default)]
    pub cert_manager_issuer: Option<String>,

    /// Default backend service for vanity domain routes
    #[serde(default)]
    pub service_name: String,

    /// Default backend service port
    #[serde(default)]
    pub service_port: i32,

    /// Ingress class assigned to created ingresses
    #[serde(default)]
    pub ingress_class_name: Option<String>,
}

impl ClusterConfig {
    /// The configured automated issuer, ignoring empty values.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.cert_manager_issuer
            .as_deref()
            .filter(|issuer| !issuer.is_empty())
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Queue connection
    #[serde(default)]
    pub nats: NatsConfig,
    /// HTTP router
    #[serde(default)]
    pub router: RouterConfig,
    /// Process settings
    #[serde(default)]
    pub system: SystemConfig,
    /// Cluster settings
    #[serde(default)]
    pub cluster: ClusterConfig,
}

fn default_router_port() -> u16 {
    DEFAULT_ROUTER_PORT
}

fn default_max_concurrent_deliveries() -> usize {
    DEFAULT_MAX_CONCURRENT_DELIVERIES
}

impl Config {
    /// Load and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or fails
    /// [`Config::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or fails [`Config::validate`].
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns `true` when running in the development environment.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.system.environment == DEVELOPMENT_ENVIRONMENT
    }

    /// Check that every required setting is present.
    ///
    /// The cert-manager issuer and ingress class are optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nats.connection_string.is_empty() {
            return Err(ConfigError::Invalid(
                "invalid NATS host, it can not be empty".into(),
            ));
        }

        if self.system.environment.is_empty() {
            return Err(ConfigError::Invalid(
                "invalid system environment, it can not be empty".into(),
            ));
        }

        if !self.is_development() && (self.nats.jwt.is_empty() || self.nats.seed.is_empty()) {
            return Err(ConfigError::Invalid(
                "nats jwt and seed are required outside the development environment".into(),
            ));
        }

        if self.nats.max_concurrent_deliveries == 0 {
            return Err(ConfigError::Invalid(
                "nats maxConcurrentDeliveries must be at least 1".into(),
            ));
        }

        if self.cluster.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "cluster namespace cannot be empty".into(),
            ));
        }

        if self.cluster.service_name.is_empty() {
            return Err(ConfigError::Invalid(
                "cluster serviceName cannot be empty".into(),
            ));
        }

        if self.cluster.service_port <= 0 {
            return Err(ConfigError::Invalid(
                "cluster servicePort must be a positive number".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
