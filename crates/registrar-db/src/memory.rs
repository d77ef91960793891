//! In-memory implementation of [`MatriculeStore`].
//!
//! Tables live behind a single mutex and enforce the same unique and
//! foreign-key constraints as the PostgreSQL schema. `count_like` yields to
//! the scheduler between reading the count and returning it, so concurrent
//! generations interleave the way they do against a real database.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use registrar_models::{
    Account, Class, ClassContext, ClassId, Enrollment, NewAccountRecord, NewEnrollmentRecord,
    School, StudentId, UserId,
};

use crate::store::{
    AccountFilter, EnrollmentFilter, IdentifierColumn, MatriculeStore, StoreError, UniqueField,
};

#[derive(Debug, Default)]
struct Tables {
    schools: Vec<School>,
    classes: Vec<Class>,
    accounts: Vec<Account>,
    /// `(user_id, role)` in assignment order.
    roles: Vec<(UserId, String)>,
    enrollments: Vec<Enrollment>,
}

impl Tables {
    fn account(&self, id: UserId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn matricule_taken(&self, value: &str, except: Option<UserId>) -> bool {
        self.accounts
            .iter()
            .any(|a| a.matricule.as_deref() == Some(value) && Some(a.id) != except)
    }

    fn registration_taken(&self, value: &str, except: Option<StudentId>) -> bool {
        self.enrollments
            .iter()
            .any(|e| e.registration_number == value && Some(e.id) != except)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MatriculeStore for MemoryStore {
    #[instrument(skip(self))]
    async fn count_like(&self, column: IdentifierColumn, prefix: &str) -> Result<i64, StoreError> {
        let count = {
            let tables = self.tables();
            match column {
                IdentifierColumn::Matricule => tables
                    .accounts
                    .iter()
                    .filter_map(|a| a.matricule.as_deref())
                    .filter(|m| m.starts_with(prefix))
                    .count(),
                IdentifierColumn::StudentMatricule => tables
                    .enrollments
                    .iter()
                    .filter_map(|e| tables.account(e.user_id))
                    .filter_map(|a| a.matricule.as_deref())
                    .filter(|m| m.starts_with(prefix))
                    .count(),
                IdentifierColumn::RegistrationNumber => tables
                    .enrollments
                    .iter()
                    .filter(|e| e.registration_number.starts_with(prefix))
                    .count(),
            }
        };

        tokio::task::yield_now().await;
        Ok(count as i64)
    }

    async fn exists(&self, column: IdentifierColumn, value: &str) -> Result<bool, StoreError> {
        Ok(self.find_owner(column, value).await?.is_some())
    }

    async fn find_owner(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let tables = self.tables();
        let owner = match column {
            IdentifierColumn::Matricule | IdentifierColumn::StudentMatricule => tables
                .accounts
                .iter()
                .find(|a| a.matricule.as_deref() == Some(value))
                .map(|a| a.id.into_inner()),
            IdentifierColumn::RegistrationNumber => tables
                .enrollments
                .iter()
                .find(|e| e.registration_number == value)
                .map(|e| e.id.into_inner()),
        };
        Ok(owner)
    }

    #[instrument(skip(self, record), fields(account_id = %record.id))]
    async fn insert_account(
        &self,
        record: &NewAccountRecord,
        matricule: Option<&str>,
    ) -> Result<Account, StoreError> {
        let mut tables = self.tables();

        if let Some(value) = matricule {
            if tables.matricule_taken(value, None) {
                return Err(StoreError::UniqueViolation(UniqueField::Matricule));
            }
        }
        if tables.accounts.iter().any(|a| a.email == record.email) {
            return Err(StoreError::UniqueViolation(UniqueField::Email));
        }
        if let Some(school_id) = record.school_id {
            if !tables.schools.iter().any(|s| s.id == school_id) {
                return Err(StoreError::not_found("school", school_id));
            }
        }

        let now = Utc::now();
        let account = Account {
            id: record.id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            matricule: matricule.map(str::to_string),
            school_id: record.school_id,
            created_at: now,
            updated_at: now,
        };

        tables.accounts.push(account.clone());
        tables
            .roles
            .extend(record.roles.iter().map(|role| (record.id, role.clone())));

        Ok(account)
    }

    #[instrument(skip(self, record), fields(enrollment_id = %record.id))]
    async fn insert_enrollment(
        &self,
        record: &NewEnrollmentRecord,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        let mut tables = self.tables();

        if tables.registration_taken(registration_number, None) {
            return Err(StoreError::UniqueViolation(UniqueField::RegistrationNumber));
        }
        if tables.account(record.user_id).is_none() {
            return Err(StoreError::not_found("user", record.user_id));
        }
        if let Some(class_id) = record.class_id {
            if !tables.classes.iter().any(|c| c.id == class_id) {
                return Err(StoreError::not_found("class", class_id));
            }
        }

        let now = Utc::now();
        let enrollment = Enrollment {
            id: record.id,
            user_id: record.user_id,
            class_id: record.class_id,
            registration_number: registration_number.to_string(),
            parent_name: record.parent_name.clone(),
            parent_phone: record.parent_phone.clone(),
            parent_email: record.parent_email.clone(),
            enrollment_date: record.enrollment_date,
            active: record.active,
            created_at: now,
            updated_at: now,
        };

        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn find_account(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        Ok(self.tables().account(id).cloned())
    }

    async fn find_enrollment(&self, id: StudentId) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables()
            .enrollments
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn account_roles(&self, id: UserId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .tables()
            .roles
            .iter()
            .filter(|(user_id, _)| *user_id == id)
            .map(|(_, role)| role.clone())
            .collect())
    }

    async fn primary_role_of(&self, id: UserId) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables()
            .roles
            .iter()
            .find(|(user_id, _)| *user_id == id)
            .map(|(_, role)| role.clone()))
    }

    #[instrument(skip(self))]
    async fn set_matricule(&self, id: UserId, matricule: &str) -> Result<Account, StoreError> {
        let mut tables = self.tables();

        if tables.matricule_taken(matricule, Some(id)) {
            return Err(StoreError::UniqueViolation(UniqueField::Matricule));
        }

        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        account.matricule = Some(matricule.to_string());
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    #[instrument(skip(self))]
    async fn set_registration_number(
        &self,
        id: StudentId,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        let mut tables = self.tables();

        if tables.registration_taken(registration_number, Some(id)) {
            return Err(StoreError::UniqueViolation(UniqueField::RegistrationNumber));
        }

        let enrollment = tables
            .enrollments
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("student", id))?;
        enrollment.registration_number = registration_number.to_string();
        enrollment.updated_at = Utc::now();
        Ok(enrollment.clone())
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .tables()
            .accounts
            .iter()
            .filter(|a| filter.id.is_none_or(|id| a.id == id))
            .filter(|a| !filter.missing_matricule_only || a.matricule.is_none())
            .cloned()
            .collect())
    }

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .tables()
            .enrollments
            .iter()
            .filter(|e| filter.id.is_none_or(|id| e.id == id))
            .filter(|e| filter.class_id.is_none_or(|id| e.class_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn class_context(&self, class_id: ClassId) -> Result<Option<ClassContext>, StoreError> {
        let tables = self.tables();
        let Some(class) = tables.classes.iter().find(|c| c.id == class_id) else {
            return Ok(None);
        };
        let school_code = tables
            .schools
            .iter()
            .find(|s| s.id == class.school_id)
            .and_then(|s| s.code.clone());

        Ok(Some(ClassContext {
            school_code,
            class_code: class.code.clone(),
        }))
    }

    async fn insert_school(&self, school: &School) -> Result<School, StoreError> {
        self.tables().schools.push(school.clone());
        Ok(school.clone())
    }

    async fn insert_class(&self, class: &Class) -> Result<Class, StoreError> {
        let mut tables = self.tables();
        if !tables.schools.iter().any(|s| s.id == class.school_id) {
            return Err(StoreError::not_found("school", class.school_id));
        }
        tables.classes.push(class.clone());
        Ok(class.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn account(email: &str, roles: &[&str]) -> NewAccountRecord {
        NewAccountRecord {
            id: UserId::new(),
            first_name: "Yao".into(),
            last_name: "Dossou".into(),
            email: email.into(),
            matricule: None,
            school_id: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    #[tokio::test]
    async fn test_insert_account_enforces_unique_matricule() {
        let store = MemoryStore::new();
        store
            .insert_account(&account("a@example.com", &[]), Some("ADM26001"))
            .await
            .unwrap();

        let err = store
            .insert_account(&account("b@example.com", &[]), Some("ADM26001"))
            .await
            .unwrap_err();
        assert_eq!(err.unique_field(), Some(UniqueField::Matricule));
    }

    #[tokio::test]
    async fn test_insert_account_enforces_unique_email() {
        let store = MemoryStore::new();
        store
            .insert_account(&account("a@example.com", &[]), None)
            .await
            .unwrap();

        let err = store
            .insert_account(&account("a@example.com", &[]), None)
            .await
            .unwrap_err();
        assert_eq!(err.unique_field(), Some(UniqueField::Email));
    }

    #[tokio::test]
    async fn test_accounts_without_matricule_do_not_collide() {
        let store = MemoryStore::new();
        store
            .insert_account(&account("a@example.com", &[]), None)
            .await
            .unwrap();
        store
            .insert_account(&account("b@example.com", &[]), None)
            .await
            .unwrap();

        let missing = store
            .list_accounts(AccountFilter {
                missing_matricule_only: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(missing.len(), 2);
    }

    #[tokio::test]
    async fn test_count_like_is_prefix_scoped() {
        let store = MemoryStore::new();
        for (email, matricule) in [
            ("a@example.com", "PROF26001"),
            ("b@example.com", "PROF26002"),
            ("c@example.com", "PROF25001"),
            ("d@example.com", "ADM26001"),
        ] {
            store
                .insert_account(&account(email, &[]), Some(matricule))
                .await
                .unwrap();
        }

        let count = store
            .count_like(IdentifierColumn::Matricule, "PROF26")
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_roles_keep_assignment_order() {
        let store = MemoryStore::new();
        let record = account("a@example.com", &["secrétariat", "administrateur"]);
        store.insert_account(&record, None).await.unwrap();

        assert_eq!(
            store.primary_role_of(record.id).await.unwrap().as_deref(),
            Some("secrétariat")
        );
        assert_eq!(
            store.account_roles(record.id).await.unwrap(),
            vec!["secrétariat", "administrateur"]
        );
    }

    #[tokio::test]
    async fn test_enrollment_requires_existing_account() {
        let store = MemoryStore::new();
        let record = NewEnrollmentRecord::for_user(UserId::new(), None, today());

        let err = store
            .insert_enrollment(&record, "REG-TG-2026-001")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "user", .. }));
    }

    #[tokio::test]
    async fn test_set_matricule_allows_same_owner() {
        let store = MemoryStore::new();
        let record = account("a@example.com", &[]);
        store
            .insert_account(&record, Some("SEC26001"))
            .await
            .unwrap();

        let updated = store.set_matricule(record.id, "SEC26001").await.unwrap();
        assert_eq!(updated.matricule.as_deref(), Some("SEC26001"));

        let err = store
            .set_matricule(UserId::new(), "SEC26002")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "user", .. }));
    }

    #[tokio::test]
    async fn test_class_context() {
        let store = MemoryStore::new();
        let school = School {
            id: registrar_models::SchoolId::new(),
            name: "École Lomé".into(),
            code: Some("LOM".into()),
        };
        store.insert_school(&school).await.unwrap();
        let class = Class {
            id: ClassId::new(),
            school_id: school.id,
            name: "6e A".into(),
            code: Some("6A".into()),
        };
        store.insert_class(&class).await.unwrap();

        let context = store.class_context(class.id).await.unwrap().unwrap();
        assert_eq!(context.school_code.as_deref(), Some("LOM"));
        assert_eq!(context.class_code.as_deref(), Some("6A"));

        assert!(store.class_context(ClassId::new()).await.unwrap().is_none());
    }
}
