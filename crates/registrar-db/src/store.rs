//! The `MatriculeStore` trait and supporting types.
//!
//! The generator and the lifecycle hooks depend on this trait only. The
//! PostgreSQL and in-memory backends implement it with the same uniqueness
//! guarantees: `users.natricule`, `users.email` and
//! `students.registration_number` are unique, and a write that would break
//! that fails with [`StoreError::UniqueViolation`].

use std::fmt;
use std::future::Future;

use registrar_core::MatriculeError;
use registrar_models::{
    Account, Class, ClassContext, ClassId, Enrollment, NewAccountRecord, NewEnrollmentRecord,
    School, StudentId, UserId,
};
use uuid::Uuid;

/// Persisted column an identifier is counted or looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierColumn {
    /// `users.natricule`, all accounts.
    Matricule,
    /// `users.natricule` of accounts that have an enrollment.
    StudentMatricule,
    /// `students.registration_number`.
    RegistrationNumber,
}

impl IdentifierColumn {
    /// The unique field a write to this column can conflict on.
    pub fn unique_field(&self) -> UniqueField {
        match self {
            Self::Matricule | Self::StudentMatricule => UniqueField::Matricule,
            Self::RegistrationNumber => UniqueField::RegistrationNumber,
        }
    }
}

/// A uniqueness-constrained field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Matricule,
    RegistrationNumber,
    Email,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matricule => "matricule",
            Self::RegistrationNumber => "registration_number",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(UniqueField),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// The conflicting field, if this is a uniqueness failure.
    pub fn unique_field(&self) -> Option<UniqueField> {
        match self {
            Self::UniqueViolation(field) => Some(*field),
            _ => None,
        }
    }
}

impl From<StoreError> for MatriculeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => MatriculeError::AlreadyExists(field.to_string()),
            StoreError::NotFound { kind, id } => MatriculeError::ModelNotFound { kind, id },
            StoreError::Database(e) => MatriculeError::Storage(anyhow::Error::from(e)),
        }
    }
}

/// Which accounts a batch run visits.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub id: Option<UserId>,
    pub missing_matricule_only: bool,
}

/// Which enrollments a batch run visits.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub id: Option<StudentId>,
    pub class_id: Option<ClassId>,
}

/// Storage operations used by identifier generation and the entity hooks.
///
/// All methods return `Send` futures so the store can be shared across
/// tokio worker threads.
pub trait MatriculeStore: Send + Sync {
    /// Number of rows whose `column` starts with `prefix`.
    ///
    /// `prefix` is matched literally; LIKE metacharacters in it are escaped.
    fn count_like(
        &self,
        column: IdentifierColumn,
        prefix: &str,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn exists(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Id of the row holding `value`: the account for matricules, the
    /// enrollment for registration numbers.
    fn find_owner(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> impl Future<Output = Result<Option<Uuid>, StoreError>> + Send;

    /// Insert an account and its roles atomically.
    fn insert_account(
        &self,
        record: &NewAccountRecord,
        matricule: Option<&str>,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;

    fn insert_enrollment(
        &self,
        record: &NewEnrollmentRecord,
        registration_number: &str,
    ) -> impl Future<Output = Result<Enrollment, StoreError>> + Send;

    fn find_account(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    fn find_enrollment(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Option<Enrollment>, StoreError>> + Send;

    /// Roles of an account in assignment order.
    fn account_roles(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// The first role assigned to an account.
    fn primary_role_of(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Overwrite an account's matricule.
    fn set_matricule(
        &self,
        id: UserId,
        matricule: &str,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;

    fn set_registration_number(
        &self,
        id: StudentId,
        registration_number: &str,
    ) -> impl Future<Output = Result<Enrollment, StoreError>> + Send;

    /// Accounts matching `filter`, oldest first.
    fn list_accounts(
        &self,
        filter: AccountFilter,
    ) -> impl Future<Output = Result<Vec<Account>, StoreError>> + Send;

    /// Enrollments matching `filter`, oldest first.
    fn list_enrollments(
        &self,
        filter: EnrollmentFilter,
    ) -> impl Future<Output = Result<Vec<Enrollment>, StoreError>> + Send;

    /// School and class codes of a class, `None` if the class does not exist.
    fn class_context(
        &self,
        class_id: ClassId,
    ) -> impl Future<Output = Result<Option<ClassContext>, StoreError>> + Send;

    fn insert_school(&self, school: &School)
    -> impl Future<Output = Result<School, StoreError>> + Send;

    fn insert_class(&self, class: &Class) -> impl Future<Output = Result<Class, StoreError>> + Send;
}

/// Escape `%`, `_` and `\` so `prefix` matches literally under `LIKE ... ESCAPE '\'`,
/// then append the trailing wildcard.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
