use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// How the registry client reaches its tool provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// MCP streamable HTTP.
    Http,
    /// MCP over the stdio pipes of a spawned server process.
    Stdio,
    /// In-process arithmetic and catalog tools.
    Builtin,
}

impl TransportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "http" | "streamable-http" => Some(TransportKind::Http),
            "stdio" => Some(TransportKind::Stdio),
            "builtin" | "local" => Some(TransportKind::Builtin),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Http => "http",
            TransportKind::Stdio => "stdio",
            TransportKind::Builtin => "builtin",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub transport: TransportKind,
    pub url: Option<String>,
    pub command: Option<PathBuf>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    /// Bound on the liveness check performed by `connect`.
    pub connect_timeout: Duration,
    /// Bound on each registry request: the reqwest timeout for HTTP, the
    /// per-request response wait for stdio.
    pub request_timeout: Duration,
}

impl RegistrySettings {
    /// Label used in logs and error messages.
    pub fn display_name(&self) -> String {
        match self.transport {
            TransportKind::Http => self.url.clone().unwrap_or_default(),
            TransportKind::Stdio => self
                .command
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            TransportKind::Builtin => "builtin".to_string(),
        }
    }

    /// Re-checks the transport-specific requirements after CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.transport {
            TransportKind::Http if self.url.as_deref().is_none_or(str::is_empty) => {
                Err(ConfigError::MissingRegistryUrl)
            }
            TransportKind::Stdio if self.command.is_none() => {
                Err(ConfigError::MissingRegistryCommand)
            }
            _ => Ok(()),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::Http,
            url: Some(DEFAULT_REGISTRY_URL.to_string()),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRegistry {
    #[serde(default)]
    transport: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    workdir: Option<String>,
    #[serde(default)]
    connect_timeout_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

impl RawRegistry {
    pub(crate) fn build(self) -> Result<RegistrySettings, ConfigError> {
        let transport = match self.transport {
            Some(name) => TransportKind::parse(&name)
                .ok_or(ConfigError::UnsupportedTransport { transport: name })?,
            None => TransportKind::Http,
        };

        let url = match (self.url, transport) {
            (Some(url), _) => Some(expand(&url)),
            (None, TransportKind::Http) => Some(DEFAULT_REGISTRY_URL.to_string()),
            (None, _) => None,
        };

        let connect_secs = self
            .connect_timeout_secs
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if connect_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "registry.connect_timeout_secs",
            });
        }
        let request_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "registry.request_timeout_secs",
            });
        }

        let settings = RegistrySettings {
            transport,
            url,
            command: self.command.map(|cmd| PathBuf::from(expand(&cmd))),
            args: self.args.iter().map(|arg| expand(arg)).collect(),
            env: self.env,
            workdir: self.workdir.map(|dir| PathBuf::from(expand(&dir))),
            connect_timeout: Duration::from_secs(connect_secs),
            request_timeout: Duration::from_secs(request_secs),
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
