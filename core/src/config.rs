use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Default initial capacity (in records) for a source's output buffer.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Wire transport carrying the sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Pull,
    Push,
    Tcp,
    Udp,
}

/// Direction of an endpoint relative to its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Network into buffer.
    Source,
    /// Buffer onto network.
    Sink,
}

/// Declarative description of one transport endpoint, as an owning
/// application states it in YAML:
///
/// ```yaml
/// transport: udp
/// role: source
/// host: 0.0.0.0
/// port: 5000
/// capacity: 8192
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub transport: Transport,
    pub role: Role,
    pub host: String,
    pub port: u16,
    /// Initial buffer capacity for sources; ignored by sinks.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl EndpointConfig {
    pub fn from_yaml(doc: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(doc).context("failed to parse endpoint config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        Self::from_yaml(&doc)
    }

    /// The `host:port` pair this endpoint binds or connects to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects transport/role pairs that have no endpoint implementation:
    /// the message-queue pair is directional (PULL receives, PUSH sends)
    /// and the TCP transport only has a sink side.
    pub fn validate(&self) -> Result<()> {
        match (self.transport, self.role) {
            (Transport::Pull, Role::Sink) => bail!("pull endpoints only receive"),
            (Transport::Push, Role::Source) => bail!("push endpoints only send"),
            (Transport::Tcp, Role::Source) => bail!("tcp transport has no source endpoint"),
            _ => Ok(()),
        }
    }
}
