//! Runtime-selected store backend.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use registrar_config::{DatabaseConfig, StoreBackend};
use registrar_models::{
    Account, Class, ClassContext, ClassId, Enrollment, NewAccountRecord, NewEnrollmentRecord,
    School, StudentId, UserId,
};

use crate::memory::MemoryStore;
use crate::postgres::PgMatriculeStore;
use crate::store::{AccountFilter, EnrollmentFilter, IdentifierColumn, MatriculeStore, StoreError};

/// The store chosen by `STORE_BACKEND`.
#[derive(Clone, Debug)]
pub enum Backend {
    Postgres(PgMatriculeStore),
    Memory(MemoryStore),
}

impl Backend {
    /// Open the configured backend, running migrations for PostgreSQL when enabled.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data will not survive a restart");
                Ok(Self::Memory(MemoryStore::new()))
            }
            StoreBackend::Postgres => {
                let url = config
                    .url
                    .as_deref()
                    .context("DATABASE_URL must be set for the postgres backend")?;

                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await
                    .context("Failed to connect to database")?;

                let store = PgMatriculeStore::new(pool);
                if config.run_migrations {
                    store
                        .migrate()
                        .await
                        .context("Failed to run database migrations")?;
                    tracing::info!("Database migrations applied");
                }

                Ok(Self::Postgres(store))
            }
        }
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub fn kind(&self) -> StoreBackend {
        match self {
            Self::Postgres(_) => StoreBackend::Postgres,
            Self::Memory(_) => StoreBackend::Memory,
        }
    }
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Postgres($store) => $call.await,
            Backend::Memory($store) => $call.await,
        }
    };
}

impl MatriculeStore for Backend {
    async fn count_like(&self, column: IdentifierColumn, prefix: &str) -> Result<i64, StoreError> {
        delegate!(self, store => store.count_like(column, prefix))
    }

    async fn exists(&self, column: IdentifierColumn, value: &str) -> Result<bool, StoreError> {
        delegate!(self, store => store.exists(column, value))
    }

    async fn find_owner(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        delegate!(self, store => store.find_owner(column, value))
    }

    async fn insert_account(
        &self,
        record: &NewAccountRecord,
        matricule: Option<&str>,
    ) -> Result<Account, StoreError> {
        delegate!(self, store => store.insert_account(record, matricule))
    }

    async fn insert_enrollment(
        &self,
        record: &NewEnrollmentRecord,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        delegate!(self, store => store.insert_enrollment(record, registration_number))
    }

    async fn find_account(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        delegate!(self, store => store.find_account(id))
    }

    async fn find_enrollment(&self, id: StudentId) -> Result<Option<Enrollment>, StoreError> {
        delegate!(self, store => store.find_enrollment(id))
    }

    async fn account_roles(&self, id: UserId) -> Result<Vec<String>, StoreError> {
        delegate!(self, store => store.account_roles(id))
    }

    async fn primary_role_of(&self, id: UserId) -> Result<Option<String>, StoreError> {
        delegate!(self, store => store.primary_role_of(id))
    }

    async fn set_matricule(&self, id: UserId, matricule: &str) -> Result<Account, StoreError> {
        delegate!(self, store => store.set_matricule(id, matricule))
    }

    async fn set_registration_number(
        &self,
        id: StudentId,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        delegate!(self, store => store.set_registration_number(id, registration_number))
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, StoreError> {
        delegate!(self, store => store.list_accounts(filter))
    }

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        delegate!(self, store => store.list_enrollments(filter))
    }

    async fn class_context(&self, class_id: ClassId) -> Result<Option<ClassContext>, StoreError> {
        delegate!(self, store => store.class_context(class_id))
    }

    async fn insert_school(&self, school: &School) -> Result<School, StoreError> {
        delegate!(self, store => store.insert_school(school))
    }

    async fn insert_class(&self, class: &Class) -> Result<Class, StoreError> {
        delegate!(self, store => store.insert_class(class))
    }
}
