//! # Registrar Config
//!
//! Configuration types for the Registrar API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`matricule`]: identifier generation (prefix table, retry bound, country code)
//! - [`database`]: storage backend and PostgreSQL pool settings
//! - [`server`]: HTTP listen address, log directory and metrics switch
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//!
//! # Example
//!
//! ```ignore
//! use registrar_config::{CorsConfig, DatabaseConfig, MatriculeConfig, ServerConfig};
//!
//! // Load all configs from environment
//! let matricule_config = MatriculeConfig::from_env();
//! let database_config = DatabaseConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod matricule;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use database::{DatabaseConfig, StoreBackend};
pub use matricule::MatriculeConfig;
pub use server::ServerConfig;

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
