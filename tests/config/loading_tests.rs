// Config loading tests - testing AppConfig::load against files on disk
//
// Covers the explicit-path contract and the TOML sections the loop reads.

use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use toolloop_core::config::{AppConfig, ConfigError, ProviderKind, TransportKind};

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("toolloop.toml");
    fs::write(&path, content).expect("Failed to write toolloop.toml");
    path
}

#[test]
fn returns_error_when_explicit_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/toolloop.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn loads_complete_file() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
provider = "gemini"
model = "gemini-2.0-flash"
api_key = "TOOLLOOP_TEST_GEMINI_KEY"
timeout_secs = 15

[registry]
transport = "http"
url = "http://127.0.0.1:9000/mcp"
connect_timeout_secs = 2
request_timeout_secs = 20

[agent]
max_steps = 4

[prompt]
role = "You are a catalog assistant."
few_shot = "FINAL_ANSWER: example"
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");
    assert_eq!(config.model.provider, ProviderKind::Gemini);
    assert_eq!(config.model.model, "gemini-2.0-flash");
    assert_eq!(config.model.api_key.as_deref(), Some("TOOLLOOP_TEST_GEMINI_KEY"));
    assert_eq!(config.model.timeout, Duration::from_secs(15));
    assert_eq!(config.registry.transport, TransportKind::Http);
    assert_eq!(
        config.registry.url.as_deref(),
        Some("http://127.0.0.1:9000/mcp")
    );
    assert_eq!(config.registry.connect_timeout, Duration::from_secs(2));
    assert_eq!(config.registry.request_timeout, Duration::from_secs(20));
    assert_eq!(config.agent.max_steps, 4);
    assert_eq!(config.prompt.role, "You are a catalog assistant.");
    assert_eq!(config.prompt.few_shot, "FINAL_ANSWER: example");
}

#[test]
fn empty_file_uses_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[model]\nmodel = \"m\"\n");

    let config = AppConfig::load(Some(&path)).expect("config loads");
    assert_eq!(config.model.timeout, Duration::from_secs(10));
    assert_eq!(config.agent.max_steps, 8);
    assert_eq!(config.registry.transport, TransportKind::Http);
}

#[test]
fn stdio_registry_expands_command() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
model = "m"

[registry]
transport = "stdio"
command = "~/bin/tools-server"
args = ["--verbose"]
env = { LOG_LEVEL = "debug" }
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");
    let command = config.registry.command.expect("command");
    assert!(!command.to_string_lossy().starts_with('~'));
    assert_eq!(config.registry.args, ["--verbose"]);
    assert_eq!(
        config.registry.env.get("LOG_LEVEL").map(String::as_str),
        Some("debug")
    );
}

#[test]
fn returns_error_for_zero_model_timeout() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[model]\nmodel = \"m\"\ntimeout_secs = 0\n");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::ZeroValue {
            field: "model.timeout_secs"
        })
    ));
}

#[test]
fn returns_error_for_http_registry_without_url() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        "[model]\nmodel = \"m\"\n\n[registry]\ntransport = \"http\"\nurl = \"\"\n",
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::MissingRegistryUrl)));
}

#[test]
fn returns_parse_error_for_wrong_types() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[agent]\nmax_steps = \"many\"\n");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
