//! Pre-insert identifier assignment.
//!
//! Entities that receive an identifier when they are created implement
//! [`MatriculeSubject`]. The creating service asks the subject whether it
//! still needs one, lets it generate a candidate, and writes the row through
//! [`retry_on_conflict`]: a uniqueness conflict on the identifier means a
//! concurrent writer took the same sequence, so the count is re-read and a
//! new candidate is tried.

use std::future::Future;

use registrar_core::MatriculeError;
use registrar_core::prefixes::roles;
use registrar_db::{IdentifierColumn, MatriculeStore, StoreError, UniqueField};
use registrar_models::{ClassContext, NewAccountRecord, NewEnrollmentRecord, SubjectKind};
use tracing::warn;

use crate::metrics::track_identifier_conflict;
use crate::modules::matricules::service::MatriculeService;

/// A record about to be inserted that carries a generated identifier.
pub trait MatriculeSubject {
    fn kind(&self) -> SubjectKind;

    /// Column the identifier is stored in.
    fn identifier_column(&self) -> IdentifierColumn;

    /// The identifier supplied by the caller, if any.
    fn identifier(&self) -> Option<&str>;

    fn needs_identifier(&self) -> bool {
        self.identifier().is_none_or(|value| value.trim().is_empty())
    }

    /// Produce a candidate identifier for this record.
    fn generate_identifier<S: MatriculeStore>(
        &self,
        service: &MatriculeService<S>,
    ) -> impl Future<Output = Result<String, MatriculeError>> + Send;
}

/// An account awaiting insertion.
#[derive(Debug, Clone)]
pub struct PendingAccount {
    pub record: NewAccountRecord,
}

impl PendingAccount {
    pub fn new(record: NewAccountRecord) -> Self {
        Self { record }
    }

    /// Role reported on events: the primary role, or `unknown`.
    pub fn event_role(&self) -> &str {
        self.record.primary_role().unwrap_or(roles::UNKNOWN)
    }
}

impl MatriculeSubject for PendingAccount {
    fn kind(&self) -> SubjectKind {
        SubjectKind::User
    }

    fn identifier_column(&self) -> IdentifierColumn {
        IdentifierColumn::Matricule
    }

    fn identifier(&self) -> Option<&str> {
        self.record.matricule.as_deref()
    }

    fn generate_identifier<S: MatriculeStore>(
        &self,
        service: &MatriculeService<S>,
    ) -> impl Future<Output = Result<String, MatriculeError>> + Send {
        // No role takes the default prefix.
        let role = self.record.primary_role().unwrap_or_default();
        service.generate_user_matricule(role, None)
    }
}

/// An enrollment awaiting insertion, with the codes of its class.
#[derive(Debug, Clone)]
pub struct PendingEnrollment {
    pub record: NewEnrollmentRecord,
    pub context: ClassContext,
}

impl PendingEnrollment {
    pub fn new(record: NewEnrollmentRecord, context: ClassContext) -> Self {
        Self { record, context }
    }
}

impl MatriculeSubject for PendingEnrollment {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Student
    }

    fn identifier_column(&self) -> IdentifierColumn {
        IdentifierColumn::RegistrationNumber
    }

    fn identifier(&self) -> Option<&str> {
        self.record.registration_number.as_deref()
    }

    fn generate_identifier<S: MatriculeStore>(
        &self,
        service: &MatriculeService<S>,
    ) -> impl Future<Output = Result<String, MatriculeError>> + Send {
        service.generate_registration_number(
            self.context.school_code.as_deref(),
            self.context.class_code.as_deref(),
        )
    }
}

/// Generate an identifier and write it, regenerating while the write hits a
/// uniqueness conflict on `field`.
///
/// Gives up with `GenerationFailed` after `max_attempts` conflicting writes.
/// A conflict on any other field is not retried; `describe` names the
/// offending value for the `AlreadyExists` error.
pub async fn retry_on_conflict<T, G, GFut, W, WFut, D>(
    max_attempts: u32,
    field: UniqueField,
    mut generate: G,
    mut write: W,
    describe: D,
) -> Result<(T, String), MatriculeError>
where
    G: FnMut() -> GFut,
    GFut: Future<Output = Result<String, MatriculeError>>,
    W: FnMut(String) -> WFut,
    WFut: Future<Output = Result<T, StoreError>>,
    D: Fn(UniqueField) -> String,
{
    let max_attempts = max_attempts.max(1);
    let mut last = String::new();

    for attempt in 1..=max_attempts {
        let identifier = generate().await?;

        match write(identifier.clone()).await {
            Ok(written) => return Ok((written, identifier)),
            Err(StoreError::UniqueViolation(conflict)) if conflict == field => {
                track_identifier_conflict(field.as_str());
                warn!(
                    %identifier,
                    attempt,
                    max_attempts,
                    "Identifier taken by a concurrent write, regenerating"
                );
                last = identifier;
            }
            Err(StoreError::UniqueViolation(other)) => {
                return Err(MatriculeError::AlreadyExists(describe(other)));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(MatriculeError::generation_failed(
        last,
        format!("{max_attempts} attempts conflicted on {field}"),
    ))
}

/// Write a caller-supplied identifier once. Conflicts are reported, never retried.
pub async fn write_verbatim<T, W, WFut, D>(
    identifier: &str,
    field: UniqueField,
    write: W,
    describe: D,
) -> Result<T, MatriculeError>
where
    W: FnOnce() -> WFut,
    WFut: Future<Output = Result<T, StoreError>>,
    D: Fn(UniqueField) -> String,
{
    match write().await {
        Ok(written) => Ok(written),
        Err(StoreError::UniqueViolation(conflict)) if conflict == field => {
            Err(MatriculeError::AlreadyExists(identifier.to_string()))
        }
        Err(StoreError::UniqueViolation(other)) => {
            Err(MatriculeError::AlreadyExists(describe(other)))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_after_conflicts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let (written, identifier) = retry_on_conflict(
            5,
            UniqueField::Matricule,
            move || async move {
                Ok(format!("ADM2600{}", counter.fetch_add(1, Ordering::SeqCst) + 1))
            },
            |candidate| async move {
                if candidate == "ADM26003" {
                    Ok(candidate.len())
                } else {
                    Err(StoreError::UniqueViolation(UniqueField::Matricule))
                }
            },
            |f| f.to_string(),
        )
        .await
        .unwrap();

        assert_eq!(identifier, "ADM26003");
        assert_eq!(written, 8);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let result: Result<((), String), _> = retry_on_conflict(
            2,
            UniqueField::RegistrationNumber,
            || async { Ok("REG-TG-2026-001".to_string()) },
            |_| async { Err(StoreError::UniqueViolation(UniqueField::RegistrationNumber)) },
            |f| f.to_string(),
        )
        .await;

        assert!(matches!(
            result,
            Err(MatriculeError::GenerationFailed { ref scope, .. }) if scope == "REG-TG-2026-001"
        ));
    }

    #[tokio::test]
    async fn test_other_conflicts_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<((), String), _> = retry_on_conflict(
            5,
            UniqueField::Matricule,
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("ADM26001".to_string())
            },
            |_| async { Err(StoreError::UniqueViolation(UniqueField::Email)) },
            |_| "email a@example.com".to_string(),
        )
        .await;

        assert!(matches!(
            result,
            Err(MatriculeError::AlreadyExists(ref v)) if v == "email a@example.com"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_needs_identifier() {
        let mut record = NewAccountRecord {
            id: Default::default(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.c".into(),
            matricule: None,
            school_id: None,
            roles: vec![],
        };
        assert!(PendingAccount::new(record.clone()).needs_identifier());
        assert_eq!(PendingAccount::new(record.clone()).event_role(), "unknown");

        record.matricule = Some("X".into());
        assert!(!PendingAccount::new(record).needs_identifier());
    }
}
