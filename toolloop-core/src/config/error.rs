use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("model name is empty - set [model].model or the MODEL_NAME environment variable")]
    MissingModel,

    #[error("unsupported model provider '{provider}' (expected gemini or ollama)")]
    UnsupportedProvider { provider: String },

    #[error("unsupported registry transport '{transport}' (expected http, stdio or builtin)")]
    UnsupportedTransport { transport: String },

    #[error("registry transport 'http' requires [registry].url")]
    MissingRegistryUrl,

    #[error("registry transport 'stdio' requires [registry].command")]
    MissingRegistryCommand,

    #[error("'{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
}
