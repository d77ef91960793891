//! # Registrar API
//!
//! Generates and manages the identifiers a school hands out: staff
//! matricules, student matricules and enrollment registration numbers.
//!
//! ## Identifier formats
//!
//! | Identifier | Shape | Example |
//! |------------|-------|---------|
//! | User matricule | `{PREFIX}{YY}{NNN}` | `PROF26003` |
//! | Student matricule | `{SCHOOL}STU{YY}{NNN}` | `ECOSTU26001` |
//! | Registration number | `REG-{SCHOOL}-{YYYY}-{NNN}` | `REG-TG-2026-014` |
//!
//! The prefix of a user matricule comes from the account's primary role:
//!
//! | Role | Prefix |
//! |------|--------|
//! | administrateur | `ADM` |
//! | directeur | `DIR` |
//! | enseignant | `PROF` |
//! | comptabilité | `COMPT` |
//! | secrétariat | `SEC` |
//! | anything else | `USR` |
//!
//! ## Generation
//!
//! The sequence is the number of identifiers already stored in the same
//! scope (prefix and year) plus one. Two concurrent requests can read the
//! same count; the unique indexes on `users.natricule` and
//! `students.registration_number` reject the second write, and the
//! [`hooks`] retry with a fresh count up to `MATRICULE_MAX_ATTEMPTS` times.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── registrar-core/    # Formats, prefix table, clock, errors
//! ├── registrar-config/  # Environment configuration
//! ├── registrar-models/  # Accounts, enrollments, events, ids
//! ├── registrar-db/      # MatriculeStore: PostgreSQL and in-memory
//! └── registrar-cli/     # Batch generation and seeding
//! src/
//! ├── hooks.rs           # Pre-insert identifier assignment with retry
//! ├── events.rs          # MatriculeGenerated sinks
//! └── modules/
//!     ├── matricules/    # Generator, sequence counter, rules, batch
//!     ├── users/         # Account creation and regeneration
//!     └── students/      # Enrollment and student matricules
//! ```
//!
//! ## API Documentation
//!
//! When the server is running:
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`
//! - Prometheus metrics: `http://localhost:3000/metrics`

pub mod docs;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod metrics;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use registrar_config;
pub use registrar_core;
pub use registrar_db;
pub use registrar_models;
