#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use registrar::events::RecordingEventSink;
use registrar::modules::matricules::MatriculeService;
use registrar::state::AppState;
use registrar_config::{CorsConfig, MatriculeConfig};
use registrar_core::FixedClock;
use registrar_db::{
    AccountFilter, Backend, EnrollmentFilter, IdentifierColumn, MatriculeStore, MemoryStore,
    StoreError,
};
use registrar_models::{
    Account, Class, ClassContext, ClassId, Enrollment, NewAccountRecord, NewEnrollmentRecord,
    School, SchoolId, StudentId, UserId,
};
use uuid::Uuid;

pub const YEAR: i32 = 2026;

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_year(YEAR).unwrap())
}

pub fn memory_service(config: MatriculeConfig) -> MatriculeService<MemoryStore> {
    MatriculeService::with_clock(MemoryStore::new(), config, clock())
}

/// App state on the in-memory backend with a recording event sink.
pub fn memory_state() -> (AppState, Arc<RecordingEventSink>) {
    memory_state_with(MatriculeConfig::default())
}

pub fn memory_state_with(config: MatriculeConfig) -> (AppState, Arc<RecordingEventSink>) {
    let events = Arc::new(RecordingEventSink::new());
    let matricules = MatriculeService::with_clock(Backend::memory(), config, clock());
    let state = AppState::new(matricules, events.clone(), CorsConfig::default());
    (state, events)
}

pub fn unique_email() -> String {
    format!("test+{}@example.com", Uuid::new_v4().simple())
}

pub fn account_record(roles: &[&str]) -> NewAccountRecord {
    NewAccountRecord {
        id: UserId::new(),
        first_name: "Test".into(),
        last_name: "User".into(),
        email: unique_email(),
        matricule: None,
        school_id: None,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub async fn create_class<S: MatriculeStore>(store: &S, school_code: Option<&str>) -> ClassId {
    let school = School {
        id: SchoolId::new(),
        name: "Test School".into(),
        code: school_code.map(str::to_string),
    };
    store.insert_school(&school).await.unwrap();

    let class = Class {
        id: ClassId::new(),
        school_id: school.id,
        name: "Test Class".into(),
        code: Some("6A".into()),
    };
    store.insert_class(&class).await.unwrap();
    class.id
}

/// A store where another writer takes each generated identifier just
/// before the insert lands: matricules for the first `steals` account
/// inserts, registration numbers for the first `registration_steals`
/// enrollment inserts.
#[derive(Debug, Default)]
pub struct RacingStore {
    pub inner: MemoryStore,
    steals: AtomicU32,
    registration_steals: AtomicU32,
}

impl RacingStore {
    pub fn stealing(steals: u32) -> Self {
        Self {
            steals: AtomicU32::new(steals),
            ..Self::default()
        }
    }

    pub fn stealing_registrations(steals: u32) -> Self {
        Self {
            registration_steals: AtomicU32::new(steals),
            ..Self::default()
        }
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl MatriculeStore for RacingStore {
    async fn count_like(&self, column: IdentifierColumn, prefix: &str) -> Result<i64, StoreError> {
        self.inner.count_like(column, prefix).await
    }

    async fn exists(&self, column: IdentifierColumn, value: &str) -> Result<bool, StoreError> {
        self.inner.exists(column, value).await
    }

    async fn find_owner(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        self.inner.find_owner(column, value).await
    }

    async fn insert_account(
        &self,
        record: &NewAccountRecord,
        matricule: Option<&str>,
    ) -> Result<Account, StoreError> {
        if let Some(value) = matricule {
            if Self::take(&self.steals) {
                self.inner
                    .insert_account(&account_record(&[]), Some(value))
                    .await?;
            }
        }
        self.inner.insert_account(record, matricule).await
    }

    async fn insert_enrollment(
        &self,
        record: &NewEnrollmentRecord,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        if Self::take(&self.registration_steals) {
            let other = account_record(&[]);
            self.inner.insert_account(&other, None).await?;
            let stolen = NewEnrollmentRecord::for_user(other.id, None, record.enrollment_date);
            self.inner
                .insert_enrollment(&stolen, registration_number)
                .await?;
        }
        self.inner
            .insert_enrollment(record, registration_number)
            .await
    }

    async fn find_account(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        self.inner.find_account(id).await
    }

    async fn find_enrollment(&self, id: StudentId) -> Result<Option<Enrollment>, StoreError> {
        self.inner.find_enrollment(id).await
    }

    async fn account_roles(&self, id: UserId) -> Result<Vec<String>, StoreError> {
        self.inner.account_roles(id).await
    }

    async fn primary_role_of(&self, id: UserId) -> Result<Option<String>, StoreError> {
        self.inner.primary_role_of(id).await
    }

    async fn set_matricule(&self, id: UserId, matricule: &str) -> Result<Account, StoreError> {
        self.inner.set_matricule(id, matricule).await
    }

    async fn set_registration_number(
        &self,
        id: StudentId,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        self.inner
            .set_registration_number(id, registration_number)
            .await
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, StoreError> {
        self.inner.list_accounts(filter).await
    }

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        self.inner.list_enrollments(filter).await
    }

    async fn class_context(&self, class_id: ClassId) -> Result<Option<ClassContext>, StoreError> {
        self.inner.class_context(class_id).await
    }

    async fn insert_school(&self, school: &School) -> Result<School, StoreError> {
        self.inner.insert_school(school).await
    }

    async fn insert_class(&self, class: &Class) -> Result<Class, StoreError> {
        self.inner.insert_class(class).await
    }
}
