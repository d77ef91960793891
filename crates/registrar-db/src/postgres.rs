//! PostgreSQL implementation of [`MatriculeStore`].

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::instrument;
use uuid::Uuid;

use registrar_models::{
    Account, Class, ClassContext, ClassId, Enrollment, NewAccountRecord, NewEnrollmentRecord,
    School, StudentId, UserId,
};

use crate::store::{
    AccountFilter, EnrollmentFilter, IdentifierColumn, MatriculeStore, StoreError, UniqueField,
    like_prefix_pattern,
};

/// Schema migrations under the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, email, natricule, school_id, created_at, updated_at";

const ENROLLMENT_COLUMNS: &str = "id, user_id, class_id, registration_number, parent_name, \
     parent_phone, parent_email, enrollment_date, active, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgMatriculeStore {
    pool: PgPool,
}

impl PgMatriculeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

/// Translate constraint failures into typed store errors.
fn map_db_error(err: sqlx::Error) -> StoreError {
    map_db_error_with(err, |_| String::from("referenced row"))
}

/// Like [`map_db_error`], naming the missing row of a foreign-key failure
/// through `referenced`.
fn map_db_error_with<F>(err: sqlx::Error, referenced: F) -> StoreError
where
    F: Fn(&'static str) -> String,
{
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("users_natricule_unique") => Some(UniqueField::Matricule),
                Some("users_email_unique") => Some(UniqueField::Email),
                Some("students_registration_number_unique") => {
                    Some(UniqueField::RegistrationNumber)
                }
                _ => None,
            };
            if let Some(field) = field {
                return StoreError::UniqueViolation(field);
            }
        }

        if db_err.is_foreign_key_violation() {
            let kind = match db_err.constraint() {
                Some("students_user_id_fkey") => "user",
                Some("students_class_id_fkey") => "class",
                Some("users_school_id_fkey") | Some("classes_school_id_fkey") => "school",
                _ => "record",
            };
            return StoreError::NotFound {
                kind,
                id: referenced(kind),
            };
        }
    }

    StoreError::Database(err)
}

impl MatriculeStore for PgMatriculeStore {
    #[instrument(skip(self))]
    async fn count_like(&self, column: IdentifierColumn, prefix: &str) -> Result<i64, StoreError> {
        let sql = match column {
            IdentifierColumn::Matricule => {
                r"SELECT COUNT(*) FROM users WHERE natricule LIKE $1 ESCAPE '\'"
            }
            IdentifierColumn::StudentMatricule => {
                r"SELECT COUNT(*) FROM students s
                  JOIN users u ON u.id = s.user_id
                  WHERE u.natricule LIKE $1 ESCAPE '\'"
            }
            IdentifierColumn::RegistrationNumber => {
                r"SELECT COUNT(*) FROM students WHERE registration_number LIKE $1 ESCAPE '\'"
            }
        };

        sqlx::query_scalar::<_, i64>(sql)
            .bind(like_prefix_pattern(prefix))
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn exists(&self, column: IdentifierColumn, value: &str) -> Result<bool, StoreError> {
        Ok(self.find_owner(column, value).await?.is_some())
    }

    #[instrument(skip(self))]
    async fn find_owner(
        &self,
        column: IdentifierColumn,
        value: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let sql = match column {
            IdentifierColumn::Matricule | IdentifierColumn::StudentMatricule => {
                "SELECT id FROM users WHERE natricule = $1"
            }
            IdentifierColumn::RegistrationNumber => {
                "SELECT id FROM students WHERE registration_number = $1"
            }
        };

        sqlx::query_scalar::<_, Uuid>(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self, record), fields(account_id = %record.id))]
    async fn insert_account(
        &self,
        record: &NewAccountRecord,
        matricule: Option<&str>,
    ) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO users (id, first_name, last_name, email, natricule, school_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(record.id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(matricule)
        .bind(record.school_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_db_error_with(e, |_| {
                record
                    .school_id
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            })
        })?;

        for (position, role) in record.roles.iter().enumerate() {
            sqlx::query("INSERT INTO user_roles (user_id, role, position) VALUES ($1, $2, $3)")
                .bind(record.id)
                .bind(role)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(account)
    }

    #[instrument(skip(self, record), fields(enrollment_id = %record.id))]
    async fn insert_enrollment(
        &self,
        record: &NewEnrollmentRecord,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO students (id, user_id, class_id, registration_number, parent_name,
                                   parent_phone, parent_email, enrollment_date, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.class_id)
        .bind(registration_number)
        .bind(&record.parent_name)
        .bind(&record.parent_phone)
        .bind(&record.parent_email)
        .bind(record.enrollment_date)
        .bind(record.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error_with(e, |kind| match kind {
                "class" => record
                    .class_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                _ => record.user_id.to_string(),
            })
        })
    }

    #[instrument(skip(self))]
    async fn find_account(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn find_enrollment(&self, id: StudentId) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn account_roles(&self, id: UserId) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY position, role",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn primary_role_of(&self, id: UserId) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY position, role LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn set_matricule(&self, id: UserId, matricule: &str) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE users SET natricule = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(matricule)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| StoreError::not_found("user", id))
    }

    #[instrument(skip(self))]
    async fn set_registration_number(
        &self,
        id: StudentId,
        registration_number: &str,
    ) -> Result<Enrollment, StoreError> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "UPDATE students SET registration_number = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(registration_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| StoreError::not_found("student", id))
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, StoreError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users
             WHERE ($1::uuid IS NULL OR id = $1)
               AND (NOT $2 OR natricule IS NULL)
             ORDER BY created_at, id"
        ))
        .bind(filter.id)
        .bind(filter.missing_matricule_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM students
             WHERE ($1::uuid IS NULL OR id = $1)
               AND ($2::uuid IS NULL OR class_id = $2)
             ORDER BY created_at, id"
        ))
        .bind(filter.id)
        .bind(filter.class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn class_context(&self, class_id: ClassId) -> Result<Option<ClassContext>, StoreError> {
        sqlx::query_as::<_, ClassContext>(
            "SELECT s.code AS school_code, c.code AS class_code
             FROM classes c
             JOIN schools s ON s.id = c.school_id
             WHERE c.id = $1",
        )
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn insert_school(&self, school: &School) -> Result<School, StoreError> {
        sqlx::query_as::<_, School>(
            "INSERT INTO schools (id, name, code) VALUES ($1, $2, $3)
             RETURNING id, name, code",
        )
        .bind(school.id)
        .bind(&school.name)
        .bind(&school.code)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn insert_class(&self, class: &Class) -> Result<Class, StoreError> {
        sqlx::query_as::<_, Class>(
            "INSERT INTO classes (id, school_id, name, code) VALUES ($1, $2, $3, $4)
             RETURNING id, school_id, name, code",
        )
        .bind(class.id)
        .bind(class.school_id)
        .bind(&class.name)
        .bind(&class.code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error_with(e, |_| class.school_id.to_string()))
    }
}
