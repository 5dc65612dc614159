//! Model infrastructure module
//!
//! Text-generation backends behind a single `prompt -> text` boundary.
//!
//! # Structure
//! - `types` - Error type shared by every client
//! - `traits` - The `ModelClient` trait
//! - `factory` - Provider factory for creating clients from settings
//! - `clients` - Individual client implementations

pub mod clients;
pub mod factory;
pub mod traits;
pub mod types;

pub use factory::ProviderFactory;
pub use traits::ModelClient;
pub use types::ModelError;
