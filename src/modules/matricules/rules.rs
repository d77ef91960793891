//! Validation rules for identifiers proposed by callers.
//!
//! Rules return `Ok(())` when the value is acceptable and a
//! [`MatriculeError`] describing the first problem otherwise.

use registrar_core::MatriculeError;
use registrar_core::format::{
    is_valid_registration_number, is_valid_student_matricule, is_valid_user_matricule,
};
use registrar_db::{IdentifierColumn, MatriculeStore};
use registrar_models::{StudentId, UserId};

fn is_matricule_shaped(value: &str) -> bool {
    is_valid_user_matricule(value) || is_valid_student_matricule(value)
}

/// Accepts user and student matricules by shape alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidMatriculeFormat;

impl ValidMatriculeFormat {
    pub fn check(&self, value: &str) -> Result<(), MatriculeError> {
        if is_matricule_shaped(value) {
            Ok(())
        } else {
            Err(MatriculeError::InvalidFormat(value.to_string()))
        }
    }
}

/// Accepts a well-formed matricule nobody else holds.
///
/// The account in `ignore` may already own the value; that is the edit case.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueMatricule {
    pub ignore: Option<UserId>,
}

impl UniqueMatricule {
    pub fn ignoring(id: UserId) -> Self {
        Self { ignore: Some(id) }
    }

    pub async fn check<S: MatriculeStore>(
        &self,
        store: &S,
        value: &str,
    ) -> Result<(), MatriculeError> {
        ValidMatriculeFormat.check(value)?;

        match store.find_owner(IdentifierColumn::Matricule, value).await? {
            None => Ok(()),
            Some(owner) if self.ignore.map(UserId::into_inner) == Some(owner) => Ok(()),
            Some(_) => Err(MatriculeError::AlreadyExists(value.to_string())),
        }
    }
}

/// Accepts a well-formed registration number no other enrollment holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueRegistrationNumber {
    pub ignore: Option<StudentId>,
}

impl UniqueRegistrationNumber {
    pub async fn check<S: MatriculeStore>(
        &self,
        store: &S,
        value: &str,
    ) -> Result<(), MatriculeError> {
        if !is_valid_registration_number(value) {
            return Err(MatriculeError::InvalidFormat(value.to_string()));
        }

        match store
            .find_owner(IdentifierColumn::RegistrationNumber, value)
            .await?
        {
            None => Ok(()),
            Some(owner) if self.ignore.map(StudentId::into_inner) == Some(owner) => Ok(()),
            Some(_) => Err(MatriculeError::AlreadyExists(value.to_string())),
        }
    }
}
