use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SqueezeliteError};

pub const DEFAULT_BINARY: &str = "/usr/bin/squeezelite";
pub const DEFAULT_NAME: &str = "Squeezelite";
pub const DEFAULT_MAC: &str = "12:34:56:78:90:AB";
pub const DEFAULT_SERVER_PORT: u16 = 9000;
pub const DEFAULT_CONTROL_PORT: u16 = 9090;
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for one squeezelite player instance.
///
/// Immutable once built; `PlayerConfigBuilder::build` validates that the
/// player binary exists on disk so a bad path fails before any network
/// or process activity.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    binary: PathBuf,
    name: String,
    mac: String,
    server: Option<String>,
    extra_args: Vec<String>,
    server_port: u16,
    control_port: u16,
    discovery_timeout: Duration,
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Path to the squeezelite binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Player name announced to the server.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MAC address identifying the player on the server.
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Statically configured server address, if any. When absent the
    /// supervisor falls back to SSDP discovery.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Extra launch arguments appended verbatim after the standard flags.
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    /// Port the server advertises over discovery (LMS web port).
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Port of the line-oriented control interface (LMS CLI).
    pub fn control_port(&self) -> u16 {
        self.control_port
    }

    /// Listen window for a single discovery query.
    pub fn discovery_timeout(&self) -> Duration {
        self.discovery_timeout
    }
}

/// Builder for [`PlayerConfig`]. Every field has a default matching a
/// stock squeezelite/LMS install.
#[derive(Debug, Clone)]
pub struct PlayerConfigBuilder {
    binary: PathBuf,
    name: String,
    mac: String,
    server: Option<String>,
    extra_args: Vec<String>,
    server_port: u16,
    control_port: u16,
    discovery_timeout: Duration,
}

impl Default for PlayerConfigBuilder {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            name: DEFAULT_NAME.to_string(),
            mac: DEFAULT_MAC.to_string(),
            server: None,
            extra_args: Vec::new(),
            server_port: DEFAULT_SERVER_PORT,
            control_port: DEFAULT_CONTROL_PORT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

impl PlayerConfigBuilder {
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    pub fn server(mut self, address: impl Into<String>) -> Self {
        self.server = Some(address.into());
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    pub fn control_port(mut self, port: u16) -> Self {
        self.control_port = port;
        self
    }

    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// Fails with `Configuration` when the binary path does not point at
    /// an existing file.
    pub fn build(self) -> Result<PlayerConfig> {
        if !self.binary.is_file() {
            return Err(SqueezeliteError::Configuration(format!(
                "can't find squeezelite at {}",
                self.binary.display()
            )));
        }

        Ok(PlayerConfig {
            binary: self.binary,
            name: self.name,
            mac: self.mac,
            server: self.server,
            extra_args: self.extra_args,
            server_port: self.server_port,
            control_port: self.control_port,
            discovery_timeout: self.discovery_timeout,
        })
    }
}
