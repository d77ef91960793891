//! # Registrar Models
//!
//! Domain models and DTOs for the Registrar API.
//!
//! # Modules
//!
//! - [`ids`]: typed UUID identifiers
//! - [`accounts`]: accounts (users) and their creation DTOs
//! - [`students`]: enrollments and their creation DTOs
//! - [`schools`]: schools, classes, and the class context of an enrollment
//! - [`events`]: the `matricule.generated` event
//!
//! # Example
//!
//! ```ignore
//! use registrar_models::accounts::{CreateAccountDto, NewAccountRecord};
//!
//! let record = NewAccountRecord::from(dto);
//! assert_eq!(record.primary_role(), Some("enseignant"));
//! ```

pub mod accounts;
pub mod events;
pub mod ids;
pub mod schools;
pub mod students;

// Re-export commonly used types at crate root for convenience
pub use accounts::{
    Account, AccountWithRoles, CreateAccountDto, NewAccountRecord, RegenerateMatriculeDto,
};
pub use events::{MatriculeGenerated, SubjectKind};
pub use ids::{ClassId, SchoolId, StudentId, UserId};
pub use schools::{Class, ClassContext, School};
pub use students::{CreateEnrollmentDto, Enrollment, NewEnrollmentRecord, StudentMatriculeDto};
