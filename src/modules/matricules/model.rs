use registrar_core::{IdentifierKind, ParsedMatricule, RolePrefix};
use registrar_models::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// What is known about an identifier string.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct MatriculeInfo {
    pub value: String,
    pub kind: IdentifierKind,
    /// Present for user matricules only.
    pub parsed: Option<ParsedMatricule>,
    pub role: Option<String>,
    pub exists: bool,
    /// Account id for matricules, enrollment id for registration numbers.
    pub owner_id: Option<Uuid>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PrefixesResponse {
    pub prefixes: Vec<RolePrefix>,
    #[schema(example = "USR")]
    pub default_prefix: String,
}

/// Which rule `POST /api/matricules/validate` applies.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTarget {
    /// Matricule format and availability.
    #[default]
    Matricule,
    /// Matricule format only.
    Format,
    /// Registration number format and availability.
    RegistrationNumber,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct ValidateMatriculeDto {
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "PROF26001")]
    pub value: String,
    /// Account being edited; its own matricule is not a conflict.
    pub ignore_user_id: Option<UserId>,
    #[serde(default)]
    pub target: ValidationTarget,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ValidationResponse {
    pub value: String,
    pub valid: bool,
}

/// Outcome of an explicit (re)generation request.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct MatriculeAssignment {
    /// Account or enrollment the identifier belongs to.
    pub subject_id: Uuid,
    pub identifier: String,
    /// `false` when an existing identifier was kept.
    pub generated: bool,
}
