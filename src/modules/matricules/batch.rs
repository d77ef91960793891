//! Backfill of identifiers for rows that were created without one.
//!
//! Each record is handled on its own; a failure is recorded in the report
//! and the run carries on with the next record.

use registrar_core::MatriculeError;
use registrar_db::{AccountFilter, EnrollmentFilter, MatriculeStore};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::events::EventSink;
use crate::metrics::track_batch;
use crate::modules::students::service::EnrollmentService;
use crate::modules::users::service::AccountService;

use super::MatriculeService;
use super::model::MatriculeAssignment;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub generated: usize,
    pub skipped: usize,
    /// Identifiers written by this run, in visiting order.
    pub assignments: Vec<MatriculeAssignment>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    fn record(&mut self, id: Uuid, outcome: Result<MatriculeAssignment, MatriculeError>) {
        self.processed += 1;
        match outcome {
            Ok(assignment) if assignment.generated => {
                self.generated += 1;
                self.assignments.push(assignment);
            }
            Ok(_) => self.skipped += 1,
            Err(err) => self.fail(id, err),
        }
    }

    /// A failure not tied to a visited record, such as a missing target.
    fn fail(&mut self, id: Uuid, err: MatriculeError) {
        warn!(%id, error = %err, "Batch record failed");
        self.failures.push(BatchFailure {
            id,
            error: err.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Which identifier a student batch assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudentBatchTarget {
    /// Student matricule on the enrolled account.
    #[default]
    Matricule,
    /// Registration number on the enrollment.
    RegistrationNumber,
}

/// Assign matricules to accounts matching `filter`.
///
/// Without `force` only accounts lacking a matricule are visited. A single
/// account named by `filter.id` is always visited: a missing account is a
/// failure and an existing matricule without `force` counts as skipped.
#[instrument(skip(matricules, events))]
pub async fn run_user_batch<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    events: &dyn EventSink,
    mut filter: AccountFilter,
    force: bool,
) -> Result<BatchReport, MatriculeError> {
    let mut report = BatchReport::default();

    if let Some(id) = filter.id {
        let outcome = AccountService::regenerate_matricule(matricules, events, id, force).await;
        report.record(id.into_inner(), outcome);
    } else {
        if !force {
            filter.missing_matricule_only = true;
        }

        for account in matricules.store().list_accounts(filter).await? {
            let outcome =
                AccountService::regenerate_matricule(matricules, events, account.id, force).await;
            report.record(account.id.into_inner(), outcome);
        }
    }

    track_batch("user", report.generated, report.skipped, report.failures.len());
    info!(
        processed = report.processed,
        generated = report.generated,
        failed = report.failures.len(),
        "User batch finished"
    );
    Ok(report)
}

/// Assign student matricules or registration numbers to enrollments
/// matching `filter`.
///
/// A class named by `filter.class_id` must exist and have enrollments;
/// otherwise the report carries a failure for the class.
#[instrument(skip(matricules, events))]
pub async fn run_student_batch<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    events: &dyn EventSink,
    filter: EnrollmentFilter,
    target: StudentBatchTarget,
    force: bool,
) -> Result<BatchReport, MatriculeError> {
    let store = matricules.store();
    let class_id = filter.class_id;
    let enrollments = store.list_enrollments(filter).await?;
    let mut report = BatchReport::default();

    if let Some(class_id) = class_id.filter(|_| enrollments.is_empty()) {
        let err = match store.class_context(class_id).await? {
            None => MatriculeError::model_not_found("class", class_id),
            Some(_) => MatriculeError::model_not_found("enrollment in class", class_id),
        };
        report.fail(class_id.into_inner(), err);
    }

    for enrollment in enrollments {
        let outcome = match target {
            StudentBatchTarget::Matricule => {
                EnrollmentService::generate_student_matricule(
                    matricules,
                    events,
                    enrollment.id,
                    force,
                )
                .await
            }
            StudentBatchTarget::RegistrationNumber => {
                EnrollmentService::regenerate_registration_number(
                    matricules,
                    events,
                    enrollment.id,
                    force,
                )
                .await
            }
        };
        report.record(enrollment.id.into_inner(), outcome);
    }

    track_batch("student", report.generated, report.skipped, report.failures.len());
    info!(
        processed = report.processed,
        generated = report.generated,
        failed = report.failures.len(),
        "Student batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use registrar_config::MatriculeConfig;
    use registrar_core::FixedClock;
    use registrar_core::prefixes::roles;
    use registrar_db::MemoryStore;
    use registrar_models::{
        Class, ClassId, NewAccountRecord, NewEnrollmentRecord, School, SchoolId, UserId,
    };

    use crate::events::RecordingEventSink;

    fn service() -> MatriculeService<MemoryStore> {
        let clock = FixedClock::at_year(2026).unwrap();
        MatriculeService::with_clock(
            MemoryStore::new(),
            MatriculeConfig::default(),
            Arc::new(clock),
        )
    }

    async fn account(
        matricules: &MatriculeService<MemoryStore>,
        email: &str,
        role: &str,
        matricule: Option<&str>,
    ) -> UserId {
        let record = NewAccountRecord {
            id: UserId::new(),
            first_name: "Komi".into(),
            last_name: "Agbeko".into(),
            email: email.into(),
            matricule: None,
            school_id: None,
            roles: vec![role.to_string()],
        };
        matricules
            .store()
            .insert_account(&record, matricule)
            .await
            .unwrap();
        record.id
    }

    #[tokio::test]
    async fn test_user_batch_fills_missing_only() {
        let matricules = service();
        let events = RecordingEventSink::new();
        account(&matricules, "a@example.com", roles::TEACHER, Some("PROF26001")).await;
        let missing = account(&matricules, "b@example.com", roles::TEACHER, None).await;
        account(&matricules, "c@example.com", roles::DIRECTOR, None).await;

        let report = run_user_batch(&matricules, &events, AccountFilter::default(), false)
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.generated, 2);
        assert_eq!(report.assignments.len(), 2);
        assert!(report.is_clean());

        let account = matricules.store().find_account(missing).await.unwrap().unwrap();
        assert_eq!(account.matricule.as_deref(), Some("PROF26002"));
        assert_eq!(events.events().len(), 2);
    }

    #[tokio::test]
    async fn test_student_batch_assigns_missing_matricules() {
        let matricules = service();
        let events = RecordingEventSink::new();
        let store = matricules.store();
        let today = matricules.clock().now().date_naive();

        let first = account(&matricules, "a@example.com", roles::STUDENT, None).await;
        let second = account(&matricules, "b@example.com", roles::STUDENT, Some("ECOSTU26001")).await;
        store
            .insert_enrollment(&NewEnrollmentRecord::for_user(first, None, today), "REG-TG-2026-001")
            .await
            .unwrap();
        store
            .insert_enrollment(&NewEnrollmentRecord::for_user(second, None, today), "REG-TG-2026-002")
            .await
            .unwrap();

        let report = run_student_batch(
            &matricules,
            &events,
            EnrollmentFilter::default(),
            StudentBatchTarget::Matricule,
            false,
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.generated, 1);
        assert_eq!(report.skipped, 1);

        let account = store.find_account(first).await.unwrap().unwrap();
        assert_eq!(account.matricule.as_deref(), Some("ECOSTU26002"));
    }

    #[tokio::test]
    async fn test_registration_batch_without_force_skips_everything() {
        let matricules = service();
        let events = RecordingEventSink::new();
        let today = matricules.clock().now().date_naive();
        let user = account(&matricules, "a@example.com", roles::STUDENT, None).await;
        matricules
            .store()
            .insert_enrollment(&NewEnrollmentRecord::for_user(user, None, today), "REG-TG-2026-001")
            .await
            .unwrap();

        let report = run_student_batch(
            &matricules,
            &events,
            EnrollmentFilter::default(),
            StudentBatchTarget::RegistrationNumber,
            false,
        )
        .await
        .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.generated, 0);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_user_batch_reports_missing_account() {
        let matricules = service();
        let events = RecordingEventSink::new();
        let ghost = UserId::new();
        let filter = AccountFilter {
            id: Some(ghost),
            missing_matricule_only: false,
        };

        let report = run_user_batch(&matricules, &events, filter, false)
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.generated, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, ghost.into_inner());
        assert!(report.failures[0].error.contains("user not found"));
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_user_batch_counts_assigned_account_as_skipped() {
        let matricules = service();
        let events = RecordingEventSink::new();
        let id = account(&matricules, "d@example.com", roles::DIRECTOR, Some("DIR26001")).await;
        let filter = AccountFilter {
            id: Some(id),
            missing_matricule_only: false,
        };

        let report = run_user_batch(&matricules, &events, filter.clone(), false)
            .await
            .unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.is_clean());
        assert!(events.events().is_empty());

        let forced = run_user_batch(&matricules, &events, filter, true)
            .await
            .unwrap();
        assert_eq!(forced.generated, 1);
        assert_eq!(forced.assignments[0].identifier, "DIR26002");
    }

    #[tokio::test]
    async fn test_student_batch_reports_unknown_or_empty_class() {
        let matricules = service();
        let events = RecordingEventSink::new();

        let unknown = ClassId::new();
        let report = run_student_batch(
            &matricules,
            &events,
            EnrollmentFilter {
                id: None,
                class_id: Some(unknown),
            },
            StudentBatchTarget::Matricule,
            false,
        )
        .await
        .unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("class not found"));

        let school = School {
            id: SchoolId::new(),
            name: "Collège Adidogomé".into(),
            code: Some("CAD".into()),
        };
        let class = Class {
            id: ClassId::new(),
            school_id: school.id,
            name: "Sixième A".into(),
            code: Some("6A".into()),
        };
        matricules.store().insert_school(&school).await.unwrap();
        matricules.store().insert_class(&class).await.unwrap();

        let report = run_student_batch(
            &matricules,
            &events,
            EnrollmentFilter {
                id: None,
                class_id: Some(class.id),
            },
            StudentBatchTarget::Matricule,
            false,
        )
        .await
        .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, class.id.into_inner());
        assert!(report.failures[0].error.contains("enrollment in class not found"));
    }
}
