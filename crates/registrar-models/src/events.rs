//! Domain events published after an identifier is persisted.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What kind of record received the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    User,
    Student,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Student => "student",
        }
    }
}

/// Emitted once per generated identifier, after the write that stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MatriculeGenerated {
    pub identifier: String,
    pub kind: SubjectKind,
    /// Account id for `user`, enrollment id for `student`.
    pub subject_id: Uuid,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

impl MatriculeGenerated {
    /// Event name used by consumers.
    pub const NAME: &'static str = "matricule.generated";

    pub fn for_user(identifier: impl Into<String>, subject_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: SubjectKind::User,
            subject_id,
            role: role.into(),
            registration_number: None,
        }
    }

    pub fn for_student(registration_number: impl Into<String>, subject_id: Uuid) -> Self {
        let registration_number = registration_number.into();
        Self {
            identifier: registration_number.clone(),
            kind: SubjectKind::Student,
            subject_id,
            role: registrar_core::prefixes::roles::STUDENT.to_string(),
            registration_number: Some(registration_number),
        }
    }

    /// A student matricule assigned to the account behind an enrollment.
    pub fn for_student_matricule(
        matricule: impl Into<String>,
        subject_id: Uuid,
        registration_number: impl Into<String>,
    ) -> Self {
        Self {
            identifier: matricule.into(),
            kind: SubjectKind::Student,
            subject_id,
            role: registrar_core::prefixes::roles::STUDENT.to_string(),
            registration_number: Some(registration_number.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_event_shape() {
        let id = Uuid::new_v4();
        let event = MatriculeGenerated::for_student("REG-TG-2026-001", id);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["identifier"], "REG-TG-2026-001");
        assert_eq!(json["kind"], "student");
        assert_eq!(json["role"], "student");
        assert_eq!(json["registration_number"], "REG-TG-2026-001");
        assert_eq!(json["subject_id"], id.to_string());
    }

    #[test]
    fn test_user_event_omits_registration_number() {
        let event = MatriculeGenerated::for_user("ADM26001", Uuid::new_v4(), "administrateur");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "user");
        assert!(json.get("registration_number").is_none());
    }
}
