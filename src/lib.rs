pub mod cache;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod transform;
pub mod types;

// Collaborator boundaries and their adapters
pub mod app;
pub mod infra;
