//! Runner configuration.
//!
//! Loaded from a YAML file. Every field has a default, so an empty file
//! (or no file at all) runs against the simulated device.
//!
//! ```yaml
//! transport:
//!   kind: tcp
//!   address: 192.168.1.40:5000
//!   timeout_ms: 1500
//! simulator:
//!   version_info: 2
//!   analog_readings:
//!     4: 41000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use u3_device::{Connector, SimulatedU3, SimulatorConfig, TcpConnector};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Which transport reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process simulated device.
    #[default]
    Sim,
    /// USB-to-TCP bridge.
    Tcp,
}

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport kind.
    pub kind: TransportKind,
    /// Bridge address (`host:port`) for the TCP transport.
    pub address: String,
    /// Socket timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Sim,
            address: "127.0.0.1:5000".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl TransportConfig {
    /// Socket timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level runner configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How to reach the device.
    pub transport: TransportConfig,
    /// Profile of the simulated device.
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or use the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.timeout_ms == 0 {
            return Err(ConfigError::Invalid("transport.timeout_ms must be positive".into()));
        }
        if self.transport.kind == TransportKind::Tcp && self.transport.address.trim().is_empty() {
            return Err(ConfigError::Invalid("transport.address is required for tcp".into()));
        }
        Ok(())
    }

    /// Build the connector this configuration selects.
    pub fn connector(&self) -> Box<dyn Connector> {
        match self.transport.kind {
            TransportKind::Sim => Box::new(SimulatedU3::new(self.simulator.clone())),
            TransportKind::Tcp => Box::new(TcpConnector::with_timeout(
                self.transport.address.clone(),
                self.transport.timeout(),
            )),
        }
    }
}
