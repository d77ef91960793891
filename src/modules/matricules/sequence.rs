//! Next-sequence lookup for each identifier scope.
//!
//! The next sequence is the number of identifiers already persisted in the
//! scope plus one. Two callers reading the same count get the same number;
//! the unique indexes catch the second write and the lifecycle hooks retry.

use registrar_core::format::{
    registration_scope_prefix, student_scope_prefix, user_scope_prefix,
};
use registrar_db::{IdentifierColumn, MatriculeStore, StoreError};
use tracing::instrument;

#[derive(Debug)]
pub struct SequenceCounter<'a, S> {
    store: &'a S,
}

impl<'a, S: MatriculeStore> SequenceCounter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `count(users.natricule LIKE '{prefix}{yy}%') + 1`
    #[instrument(skip(self))]
    pub async fn next_user_sequence(
        &self,
        prefix: &str,
        year_two_digit: &str,
    ) -> Result<u32, StoreError> {
        self.next_in(
            IdentifierColumn::Matricule,
            &user_scope_prefix(prefix, year_two_digit),
        )
        .await
    }

    /// Counts enrolled accounts whose matricule starts with `{school}STU{yy}`.
    #[instrument(skip(self))]
    pub async fn next_student_sequence(
        &self,
        school_code: &str,
        year_two_digit: &str,
    ) -> Result<u32, StoreError> {
        self.next_in(
            IdentifierColumn::StudentMatricule,
            &student_scope_prefix(school_code, year_two_digit),
        )
        .await
    }

    /// `count(students.registration_number LIKE 'REG-{school}-{yyyy}-%') + 1`
    #[instrument(skip(self))]
    pub async fn next_registration_sequence(
        &self,
        school_code: &str,
        year_four_digit: &str,
    ) -> Result<u32, StoreError> {
        self.next_in(
            IdentifierColumn::RegistrationNumber,
            &registration_scope_prefix(school_code, year_four_digit),
        )
        .await
    }

    async fn next_in(&self, column: IdentifierColumn, scope: &str) -> Result<u32, StoreError> {
        let count = self.store.count_like(column, scope).await?;
        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        Ok(count.saturating_add(1))
    }
}
