//! Benji daemon library - exposes modules for testing.

pub mod config;
pub mod gateway;
pub mod generators;
pub mod instructions;
pub mod orchestrator;
pub mod routes;
pub mod server;
pub mod store;
pub mod tools;
