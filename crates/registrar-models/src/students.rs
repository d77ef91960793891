//! Enrollment (student) models and DTOs.
//!
//! An enrollment links an account to a class and carries the mandatory
//! registration number. The student matricule itself is stored on the
//! enrolled account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{ClassId, StudentId, UserId};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Enrollment {
    pub id: StudentId,
    pub user_id: UserId,
    pub class_id: Option<ClassId>,
    #[schema(example = "REG-TG-2026-001")]
    pub registration_number: String,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
    pub enrollment_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/students`.
#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateEnrollmentDto {
    pub user_id: UserId,
    pub class_id: Option<ClassId>,
    /// Supplied registration numbers are stored verbatim; omit to have one generated.
    #[validate(length(min = 1, max = 64))]
    pub registration_number: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub parent_name: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub parent_phone: Option<String>,
    #[validate(email)]
    pub parent_email: Option<String>,
    /// Defaults to today.
    pub enrollment_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

/// Everything needed to insert an enrollment row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnrollmentRecord {
    pub id: StudentId,
    pub user_id: UserId,
    pub class_id: Option<ClassId>,
    pub registration_number: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
    pub enrollment_date: NaiveDate,
    pub active: bool,
}

impl NewEnrollmentRecord {
    pub fn from_dto(dto: CreateEnrollmentDto, today: NaiveDate) -> Self {
        Self {
            id: StudentId::new(),
            user_id: dto.user_id,
            class_id: dto.class_id,
            registration_number: dto.registration_number.filter(|r| !r.trim().is_empty()),
            parent_name: dto.parent_name,
            parent_phone: dto.parent_phone,
            parent_email: dto.parent_email,
            enrollment_date: dto.enrollment_date.unwrap_or(today),
            active: dto.active.unwrap_or(true),
        }
    }

    /// A bare enrollment of `user_id`, active from `today`.
    pub fn for_user(user_id: UserId, class_id: Option<ClassId>, today: NaiveDate) -> Self {
        Self {
            id: StudentId::new(),
            user_id,
            class_id,
            registration_number: None,
            parent_name: None,
            parent_phone: None,
            parent_email: None,
            enrollment_date: today,
            active: true,
        }
    }
}

/// Request body for `POST /api/students/{id}/matricule`.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct StudentMatriculeDto {
    /// Replace a matricule the account already has.
    #[serde(default)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreateEnrollmentDto {
        CreateEnrollmentDto {
            user_id: UserId::new(),
            class_id: None,
            registration_number: None,
            parent_name: Some("Afi Kodjo".into()),
            parent_phone: Some("+22890000000".into()),
            parent_email: Some("afi@example.com".into()),
            enrollment_date: None,
            active: None,
        }
    }

    #[test]
    fn test_create_enrollment_dto_validation() {
        assert!(dto().validate().is_ok());

        let mut invalid = dto();
        invalid.parent_email = Some("nope".into());
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_from_dto_applies_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut input = dto();
        input.registration_number = Some(" ".into());

        let record = NewEnrollmentRecord::from_dto(input, today);
        assert_eq!(record.enrollment_date, today);
        assert!(record.active);
        assert_eq!(record.registration_number, None);
    }

    #[test]
    fn test_from_dto_keeps_supplied_values() {
        let today = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        let mut input = dto();
        input.registration_number = Some("REG-TG-2025-014".into());
        input.enrollment_date = Some(date);
        input.active = Some(false);

        let record = NewEnrollmentRecord::from_dto(input, today);
        assert_eq!(record.registration_number.as_deref(), Some("REG-TG-2025-014"));
        assert_eq!(record.enrollment_date, date);
        assert!(!record.active);
    }
}
