//! # Registrar Core
//!
//! Identifier formats, role prefixes, and error types for the Registrar API.
//!
//! This crate holds everything about matricules that does not touch storage:
//!
//! - [`format`]: rendering, parsing, and validating the three identifier shapes
//! - [`prefixes`]: the role → prefix table used for staff matricules
//! - [`clock`]: the source of "current year" for generated identifiers
//! - [`errors`]: the matricule error taxonomy and its HTTP mapping
//!
//! # Example
//!
//! ```ignore
//! use registrar_core::format::{format_user_matricule, parse};
//! use registrar_core::prefixes::{RolePrefixTable, roles};
//!
//! let table = RolePrefixTable::default();
//! let prefix = table.prefix_or_default(roles::TEACHER);
//! let matricule = format_user_matricule(prefix, "26", 1);
//! assert_eq!(matricule, "PROF26001");
//! assert_eq!(parse(&matricule).unwrap().year, "2026");
//! ```

pub mod clock;
pub mod errors;
pub mod format;
pub mod prefixes;

// Re-export commonly used types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{AppError, ErrorResponse, MatriculeError};
pub use format::{IdentifierKind, ParsedMatricule};
pub use prefixes::{PrefixTableError, RoleLookup, RolePrefix, RolePrefixTable};
