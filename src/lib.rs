pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod sheets;
pub mod validation;

pub use error::{Error, Result};

// Declare tests module only when testing
#[cfg(test)]
pub mod tests;
