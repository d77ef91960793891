//! Account (user) models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{SchoolId, UserId};

/// A persisted account.
///
/// The matricule lives in the `natricule` column and is exposed as
/// `matricule` everywhere else.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Account {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[sqlx(rename = "natricule")]
    #[schema(example = "PROF26001")]
    pub matricule: Option<String>,
    pub school_id: Option<SchoolId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account together with its roles, primary role first.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct AccountWithRoles {
    #[serde(flatten)]
    pub account: Account,
    pub roles: Vec<String>,
}

/// Request body for `POST /api/users`.
#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateAccountDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    /// Supplied matricules are stored verbatim; omit to have one generated.
    #[validate(length(min = 1, max = 64))]
    pub matricule: Option<String>,
    pub school_id: Option<SchoolId>,
    /// Role names in priority order. The first one selects the matricule prefix.
    #[serde(default)]
    #[schema(example = json!(["enseignant"]))]
    pub roles: Vec<String>,
}

/// Everything needed to insert an account row and its roles.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccountRecord {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub matricule: Option<String>,
    pub school_id: Option<SchoolId>,
    pub roles: Vec<String>,
}

impl NewAccountRecord {
    /// The first role, if any role was given.
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

impl From<CreateAccountDto> for NewAccountRecord {
    fn from(dto: CreateAccountDto) -> Self {
        let mut roles: Vec<String> = Vec::with_capacity(dto.roles.len());
        for role in dto.roles.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }

        Self {
            id: UserId::new(),
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            matricule: dto.matricule.filter(|m| !m.trim().is_empty()),
            school_id: dto.school_id,
            roles,
        }
    }
}

/// Request body for `POST /api/users/{id}/matricule`.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegenerateMatriculeDto {
    /// Overwrite an existing matricule.
    #[serde(default)]
    pub force: bool,
}
