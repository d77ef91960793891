//! # Registrar DB
//!
//! Storage for accounts, enrollments and their identifiers.
//!
//! - [`store`]: the [`MatriculeStore`] trait, filters and [`StoreError`]
//! - [`postgres`]: SQLx/PostgreSQL backend and schema migrations
//! - [`memory`]: in-memory backend with the same constraints
//! - [`backend`]: the runtime-selected [`Backend`]
//!
//! # Example
//!
//! ```ignore
//! use registrar_config::DatabaseConfig;
//! use registrar_db::{Backend, IdentifierColumn, MatriculeStore};
//!
//! let store = Backend::connect(&DatabaseConfig::from_env()).await?;
//! let taken = store.exists(IdentifierColumn::Matricule, "PROF26001").await?;
//! ```

pub mod backend;
pub mod memory;
pub mod postgres;
pub mod store;

pub use backend::Backend;
pub use memory::MemoryStore;
pub use postgres::{MIGRATOR, PgMatriculeStore};
pub use store::{
    AccountFilter, EnrollmentFilter, IdentifierColumn, MatriculeStore, StoreError, UniqueField,
};

// Re-export PgPool for convenience
pub use sqlx::PgPool;
