use registrar_core::MatriculeError;
use registrar_db::{MatriculeStore, UniqueField};
use registrar_models::{
    ClassContext, ClassId, CreateEnrollmentDto, Enrollment, MatriculeGenerated,
    NewEnrollmentRecord, StudentId,
};
use tracing::{info, instrument};

use crate::events::EventSink;
use crate::hooks::{MatriculeSubject, PendingEnrollment, retry_on_conflict, write_verbatim};
use crate::metrics::{track_generation_failure, track_matricule_generated};
use crate::modules::matricules::MatriculeService;
use crate::modules::matricules::model::MatriculeAssignment;
use crate::modules::matricules::rules::UniqueRegistrationNumber;

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enroll an account, assigning a registration number when none was
    /// supplied.
    ///
    /// A supplied registration number must be well formed and unused unless
    /// custom formats are allowed.
    #[instrument(skip(matricules, events, dto), fields(user_id = %dto.user_id))]
    pub async fn create_enrollment<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        events: &dyn EventSink,
        dto: CreateEnrollmentDto,
    ) -> Result<Enrollment, MatriculeError> {
        let store = matricules.store();

        if store.find_account(dto.user_id).await?.is_none() {
            return Err(MatriculeError::model_not_found("user", dto.user_id));
        }
        let context = Self::class_context(matricules, dto.class_id).await?;

        let today = matricules.clock().now().date_naive();
        let pending = PendingEnrollment::new(NewEnrollmentRecord::from_dto(dto, today), context);
        let record = &pending.record;

        let enrollment = if let Some(supplied) = record.registration_number.as_deref() {
            if !matricules.config().allow_custom_format {
                UniqueRegistrationNumber::default()
                    .check(store, supplied)
                    .await?;
            }
            write_verbatim(
                supplied,
                UniqueField::RegistrationNumber,
                || store.insert_enrollment(record, supplied),
                |field| field.to_string(),
            )
            .await?
        } else {
            let subject = &pending;
            let (enrollment, number) = retry_on_conflict(
                matricules.config().max_attempts,
                UniqueField::RegistrationNumber,
                move || subject.generate_identifier(matricules),
                move |candidate| async move { store.insert_enrollment(record, &candidate).await },
                |field| field.to_string(),
            )
            .await
            .inspect_err(|err| {
                if matches!(err, MatriculeError::GenerationFailed { .. }) {
                    track_generation_failure("registration_number");
                }
            })?;

            track_matricule_generated(subject.kind().as_str());
            events.publish(&MatriculeGenerated::for_student(
                &number,
                enrollment.id.into_inner(),
            ));
            enrollment
        };

        info!(
            student_id = %enrollment.id,
            registration_number = %enrollment.registration_number,
            "Enrollment created"
        );
        Ok(enrollment)
    }

    #[instrument(skip(matricules))]
    pub async fn get_enrollment<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        id: StudentId,
    ) -> Result<Enrollment, MatriculeError> {
        matricules
            .store()
            .find_enrollment(id)
            .await?
            .ok_or_else(|| MatriculeError::model_not_found("student", id))
    }

    /// Give the account behind an enrollment a student matricule such as
    /// `ECOSTU26001`. An existing matricule is kept unless `force` is set.
    #[instrument(skip(matricules, events))]
    pub async fn generate_student_matricule<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        events: &dyn EventSink,
        id: StudentId,
        force: bool,
    ) -> Result<MatriculeAssignment, MatriculeError> {
        let store = matricules.store();
        let enrollment = Self::get_enrollment(matricules, id).await?;
        let user_id = enrollment.user_id;
        let account = store
            .find_account(user_id)
            .await?
            .ok_or_else(|| MatriculeError::model_not_found("user", user_id))?;

        if let Some(existing) = account.matricule.filter(|_| !force) {
            return Ok(MatriculeAssignment {
                subject_id: id.into_inner(),
                identifier: existing,
                generated: false,
            });
        }

        let context = Self::class_context(matricules, enrollment.class_id).await?;
        let school_code = context.school_code.as_deref();
        let class_code = context.class_code.as_deref();

        let (_, matricule) = retry_on_conflict(
            matricules.config().max_attempts,
            UniqueField::Matricule,
            move || matricules.generate_student_matricule(school_code, class_code),
            move |candidate| async move { store.set_matricule(user_id, &candidate).await },
            |field| field.to_string(),
        )
        .await
        .inspect_err(|err| {
            if matches!(err, MatriculeError::GenerationFailed { .. }) {
                track_generation_failure("student_matricule");
            }
        })?;

        track_matricule_generated("student");
        events.publish(&MatriculeGenerated::for_student_matricule(
            &matricule,
            id.into_inner(),
            &enrollment.registration_number,
        ));
        info!(student_id = %id, %matricule, "Student matricule assigned");

        Ok(MatriculeAssignment {
            subject_id: id.into_inner(),
            identifier: matricule,
            generated: true,
        })
    }

    /// Replace an enrollment's registration number.
    ///
    /// Every enrollment already has one, so nothing changes unless `force`
    /// is set.
    #[instrument(skip(matricules, events))]
    pub async fn regenerate_registration_number<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        events: &dyn EventSink,
        id: StudentId,
        force: bool,
    ) -> Result<MatriculeAssignment, MatriculeError> {
        let store = matricules.store();
        let enrollment = Self::get_enrollment(matricules, id).await?;

        if !force {
            return Ok(MatriculeAssignment {
                subject_id: id.into_inner(),
                identifier: enrollment.registration_number,
                generated: false,
            });
        }

        let context = Self::class_context(matricules, enrollment.class_id).await?;
        let school_code = context.school_code.as_deref();
        let class_code = context.class_code.as_deref();

        let (_, number) = retry_on_conflict(
            matricules.config().max_attempts,
            UniqueField::RegistrationNumber,
            move || matricules.generate_registration_number(school_code, class_code),
            move |candidate| async move { store.set_registration_number(id, &candidate).await },
            |field| field.to_string(),
        )
        .await
        .inspect_err(|err| {
            if matches!(err, MatriculeError::GenerationFailed { .. }) {
                track_generation_failure("registration_number");
            }
        })?;

        track_matricule_generated("student");
        events.publish(&MatriculeGenerated::for_student(&number, id.into_inner()));
        info!(student_id = %id, registration_number = %number, "Registration number assigned");

        Ok(MatriculeAssignment {
            subject_id: id.into_inner(),
            identifier: number,
            generated: true,
        })
    }

    /// Codes of the enrollment's class; empty when it has none.
    async fn class_context<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        class_id: Option<ClassId>,
    ) -> Result<ClassContext, MatriculeError> {
        let Some(class_id) = class_id else {
            return Ok(ClassContext::default());
        };

        matricules
            .store()
            .class_context(class_id)
            .await?
            .ok_or_else(|| MatriculeError::model_not_found("class", class_id))
    }
}
