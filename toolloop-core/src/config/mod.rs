pub mod app;
pub mod error;
pub mod loader;
pub mod model;
pub mod registry;

pub use crate::constants::CONFIG_PATH;

pub use app::{AgentSettings, AppConfig, PromptSettings};
pub use error::ConfigError;
pub use model::{ModelSettings, ProviderKind};
pub use registry::{RegistrySettings, TransportKind};
