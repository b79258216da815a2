//! Spec-driven API integration designer.
//!
//! A run ingests an OpenAPI/Swagger document, builds a normalized API model,
//! designs a workflow for a free-text task, and generates client, flow and
//! test modules, optionally integrating them into a target repository.
pub mod api;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod repo;
pub mod report;
pub mod state;
pub mod templates;
pub mod util;

pub use api::{design_and_generate_integration, IntegrationRequest, IntegrationResult};
