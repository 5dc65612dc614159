pub mod agent;
pub mod gateway;
pub mod prompt;
pub mod registry;
