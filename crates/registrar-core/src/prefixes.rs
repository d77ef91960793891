//! Role → matricule prefix table.
//!
//! The table is an immutable value handed to the generator at construction.
//! Deployments can override it through configuration; nothing mutates it at
//! runtime.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::format;

/// Role names as stored in `user_roles.role`.
pub mod roles {
    pub const ADMINISTRATOR: &str = "administrateur";
    pub const DIRECTOR: &str = "directeur";
    pub const TEACHER: &str = "enseignant";
    pub const ACCOUNTING: &str = "comptabilité";
    pub const SECRETARIAT: &str = "secrétariat";
    /// Reported on events for enrollments.
    pub const STUDENT: &str = "student";
    /// Reported on events for accounts without a role.
    pub const UNKNOWN: &str = "unknown";
}

/// Prefix for roles absent from the table.
pub const DEFAULT_PREFIX: &str = "USR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RolePrefix {
    #[schema(example = "enseignant")]
    pub role: String,
    #[schema(example = "PROF")]
    pub prefix: String,
}

impl RolePrefix {
    pub fn new(role: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            prefix: prefix.into(),
        }
    }
}

/// How a matricule is mapped back to its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLookup {
    /// Parse the matricule and match its whole prefix.
    #[default]
    Exact,
    /// Match the first three characters only. `PROF` and `COMPT` matricules
    /// resolve to no role under this mode.
    LegacyThreeChar,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrefixTableError {
    #[error("prefix {0:?} must be 3 to 5 uppercase ASCII letters")]
    InvalidPrefix(String),
    #[error("role name must not be empty")]
    EmptyRole,
    #[error("role {0:?} is listed more than once")]
    DuplicateRole(String),
    #[error("prefix {0:?} is assigned to more than one role")]
    DuplicatePrefix(String),
}

/// Ordered role → prefix mapping. Roles and prefixes are both unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePrefixTable {
    entries: Vec<RolePrefix>,
}

impl Default for RolePrefixTable {
    fn default() -> Self {
        Self {
            entries: vec![
                RolePrefix::new(roles::ADMINISTRATOR, "ADM"),
                RolePrefix::new(roles::DIRECTOR, "DIR"),
                RolePrefix::new(roles::TEACHER, "PROF"),
                RolePrefix::new(roles::ACCOUNTING, "COMPT"),
                RolePrefix::new(roles::SECRETARIAT, "SEC"),
            ],
        }
    }
}

impl RolePrefixTable {
    pub fn new(entries: Vec<RolePrefix>) -> Result<Self, PrefixTableError> {
        let mut table = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            table.push(entry)?;
        }
        Ok(table)
    }

    /// Replace the prefix of an existing role or append a new role.
    pub fn with_override(mut self, entry: RolePrefix) -> Result<Self, PrefixTableError> {
        validate_prefix(&entry.prefix)?;
        if let Some(owner) = self
            .entries
            .iter()
            .find(|e| e.prefix == entry.prefix && e.role != entry.role)
        {
            return Err(PrefixTableError::DuplicatePrefix(owner.prefix.clone()));
        }

        match self.entries.iter_mut().find(|e| e.role == entry.role) {
            Some(existing) => existing.prefix = entry.prefix,
            None => self.push(entry)?,
        }
        Ok(self)
    }

    fn push(&mut self, entry: RolePrefix) -> Result<(), PrefixTableError> {
        if entry.role.trim().is_empty() {
            return Err(PrefixTableError::EmptyRole);
        }
        validate_prefix(&entry.prefix)?;
        if self.entries.iter().any(|e| e.role == entry.role) {
            return Err(PrefixTableError::DuplicateRole(entry.role));
        }
        if self.entries.iter().any(|e| e.prefix == entry.prefix) {
            return Err(PrefixTableError::DuplicatePrefix(entry.prefix));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn prefix_for(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.prefix.as_str())
    }

    /// Prefix for `role`, or [`DEFAULT_PREFIX`] when the role is unknown.
    pub fn prefix_or_default(&self, role: &str) -> &str {
        self.prefix_for(role).unwrap_or(DEFAULT_PREFIX)
    }

    pub fn role_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.prefix == prefix)
            .map(|e| e.role.as_str())
    }

    /// Role that issued `matricule`, if any.
    pub fn role_for_identifier(&self, matricule: &str, lookup: RoleLookup) -> Option<&str> {
        match lookup {
            RoleLookup::Exact => {
                let parsed = format::parse(matricule)?;
                self.role_for_prefix(&parsed.prefix)
            }
            RoleLookup::LegacyThreeChar => {
                let head = matricule.get(..3)?;
                self.role_for_prefix(head)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RolePrefix> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_prefix(prefix: &str) -> Result<(), PrefixTableError> {
    let valid = (3..=5).contains(&prefix.len()) && prefix.bytes().all(|b| b.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(PrefixTableError::InvalidPrefix(prefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let table = RolePrefixTable::default();
        assert_eq!(table.prefix_for(roles::ADMINISTRATOR), Some("ADM"));
        assert_eq!(table.prefix_for(roles::DIRECTOR), Some("DIR"));
        assert_eq!(table.prefix_for(roles::TEACHER), Some("PROF"));
        assert_eq!(table.prefix_for(roles::ACCOUNTING), Some("COMPT"));
        assert_eq!(table.prefix_for(roles::SECRETARIAT), Some("SEC"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_unknown_role_falls_back_to_usr() {
        let table = RolePrefixTable::default();
        assert_eq!(table.prefix_for("janitor"), None);
        assert_eq!(table.prefix_or_default("janitor"), "USR");
        assert_eq!(table.prefix_or_default(""), "USR");
    }

    #[test]
    fn test_role_for_identifier_exact() {
        let table = RolePrefixTable::default();
        assert_eq!(
            table.role_for_identifier("ADM26001", RoleLookup::Exact),
            Some(roles::ADMINISTRATOR)
        );
        assert_eq!(
            table.role_for_identifier("PROF26001", RoleLookup::Exact),
            Some(roles::TEACHER)
        );
        assert_eq!(
            table.role_for_identifier("COMPT26001", RoleLookup::Exact),
            Some(roles::ACCOUNTING)
        );
        assert_eq!(table.role_for_identifier("USR26001", RoleLookup::Exact), None);
        assert_eq!(table.role_for_identifier("garbage", RoleLookup::Exact), None);
    }

    #[test]
    fn test_role_for_identifier_legacy_truncates() {
        let table = RolePrefixTable::default();
        assert_eq!(
            table.role_for_identifier("ADM26001", RoleLookup::LegacyThreeChar),
            Some(roles::ADMINISTRATOR)
        );
        assert_eq!(
            table.role_for_identifier("SEC26001", RoleLookup::LegacyThreeChar),
            Some(roles::SECRETARIAT)
        );
        assert_eq!(
            table.role_for_identifier("PROF26001", RoleLookup::LegacyThreeChar),
            None
        );
        assert_eq!(
            table.role_for_identifier("COMPT26001", RoleLookup::LegacyThreeChar),
            None
        );
        assert_eq!(table.role_for_identifier("AD", RoleLookup::LegacyThreeChar), None);
    }

    #[test]
    fn test_new_rejects_bad_tables() {
        assert_eq!(
            RolePrefixTable::new(vec![RolePrefix::new("x", "ab")]),
            Err(PrefixTableError::InvalidPrefix("ab".into()))
        );
        assert_eq!(
            RolePrefixTable::new(vec![RolePrefix::new("x", "TOOLONG")]),
            Err(PrefixTableError::InvalidPrefix("TOOLONG".into()))
        );
        assert_eq!(
            RolePrefixTable::new(vec![RolePrefix::new("", "ABC")]),
            Err(PrefixTableError::EmptyRole)
        );
        assert_eq!(
            RolePrefixTable::new(vec![RolePrefix::new("a", "ABC"), RolePrefix::new("a", "DEF")]),
            Err(PrefixTableError::DuplicateRole("a".into()))
        );
        assert_eq!(
            RolePrefixTable::new(vec![RolePrefix::new("a", "ABC"), RolePrefix::new("b", "ABC")]),
            Err(PrefixTableError::DuplicatePrefix("ABC".into()))
        );
    }

    #[test]
    fn test_with_override() {
        let table = RolePrefixTable::default()
            .with_override(RolePrefix::new(roles::TEACHER, "ENS"))
            .unwrap()
            .with_override(RolePrefix::new("bibliothécaire", "BIB"))
            .unwrap();

        assert_eq!(table.prefix_for(roles::TEACHER), Some("ENS"));
        assert_eq!(table.prefix_for("bibliothécaire"), Some("BIB"));
        assert_eq!(table.len(), 6);

        let clash = RolePrefixTable::default().with_override(RolePrefix::new("other", "ADM"));
        assert_eq!(clash, Err(PrefixTableError::DuplicatePrefix("ADM".into())));
    }
}
