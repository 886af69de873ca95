pub mod client;
#[cfg(test)]
pub mod fake;
pub mod models;
pub mod retry;

pub use client::{ModelBackend, ModelError, ModelRole, NimClient, Prompt};
