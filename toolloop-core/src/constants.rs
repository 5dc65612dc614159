//! Application constants
//!
//! Single source of truth for paths, defaults, and protocol identifiers.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/toolloop.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Environment variable consulted when the config file names no model
pub const MODEL_NAME_ENV: &str = "MODEL_NAME";

/// Default model provider type
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default model identifier when neither the config nor `MODEL_NAME` provides one
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini endpoint
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini API path (fallback when not specified in config)
pub const DEFAULT_GEMINI_API_PATH: &str = "v1beta/models";

/// Default environment variable holding the Gemini API key
pub const DEFAULT_GEMINI_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://127.0.0.1:11434";

/// Default bound on a single model generation, in seconds
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 10;

/// Default streamable-HTTP registry endpoint
pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:8000/mcp";

/// Default bound on the registry liveness check, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default transport-level timeout for registry HTTP requests, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of tool dispatches per request
pub const DEFAULT_MAX_STEPS: usize = 8;

/// MCP protocol revision announced during `initialize`
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Header carrying the streamable-HTTP session identifier
pub const MCP_SESSION_HEADER: &str = "mcp-session-id";
