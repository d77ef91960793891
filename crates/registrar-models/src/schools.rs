//! Schools and classes: the context student identifiers are derived from.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::{ClassId, SchoolId};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    /// Short code used in student identifiers, e.g. `ECO` or `TG`.
    pub code: Option<String>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Class {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
    pub code: Option<String>,
}

/// School and class codes of an enrollment's class.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct ClassContext {
    pub school_code: Option<String>,
    pub class_code: Option<String>,
}
