//! Model clients

mod base;
mod blocking;
mod gemini;
mod ollama;

pub use base::HttpClientBase;
pub use blocking::BlockingModelClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
