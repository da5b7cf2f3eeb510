//! HTTP clients for the pipeline API and the backend service.
//!
//! - [`api::ApiClient`]: authenticated GET/POST/DELETE against the
//!   pipeline REST API, with typed story endpoints in [`stories`].
//! - [`baas::BaasClient`]: row updates and signed storage URLs against
//!   the backend-as-a-service.
//! - [`config::ClientConfig`]: environment-driven configuration.

pub mod api;
pub mod baas;
pub mod config;
pub mod stories;

pub use api::{ApiClient, ApiError};
pub use baas::{BaasClient, BaasSetupError};
pub use config::{ClientConfig, ConfigError};
