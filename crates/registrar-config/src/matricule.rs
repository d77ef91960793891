//! Identifier generation settings.

use std::env;

use registrar_core::prefixes::{PrefixTableError, RoleLookup, RolePrefix, RolePrefixTable};
use registrar_core::format::DEFAULT_REGISTRATION_SCHOOL_CODE;

use crate::parse_flag;

/// Identifier generation settings loaded from environment variables.
///
/// # Environment Variables
///
/// - `MATRICULE_MAX_ATTEMPTS`: insert attempts before giving up on a
///   uniqueness conflict (default: `5`, minimum `1`)
/// - `MATRICULE_COUNTRY_CODE`: school code used in registration numbers when a
///   class has no school code (default: `TG`)
/// - `MATRICULE_ROLE_PREFIXES`: `role=PREFIX` pairs, comma separated, applied
///   over the default table (e.g. `enseignant=ENS,bibliothécaire=BIB`)
/// - `MATRICULE_LEGACY_ROLE_LOOKUP`: map matricules back to roles by their
///   first three characters (default: `false`)
/// - `MATRICULE_AUTO_GENERATE_USER`: assign a matricule when an account is
///   created without one (default: `true`)
/// - `MATRICULE_ALLOW_CUSTOM`: accept caller-supplied identifiers that do not
///   follow the generated formats (default: `false`)
#[derive(Clone, Debug)]
pub struct MatriculeConfig {
    pub max_attempts: u32,
    pub country_code: String,
    pub role_prefixes: RolePrefixTable,
    pub role_lookup: RoleLookup,
    pub auto_generate_user: bool,
    pub allow_custom_format: bool,
}

impl MatriculeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key → value source.
    ///
    /// Malformed values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_attempts = lookup("MATRICULE_MAX_ATTEMPTS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|v| v.max(1))
            .unwrap_or(defaults.max_attempts);

        let country_code = lookup("MATRICULE_COUNTRY_CODE")
            .map(|v| v.trim().to_ascii_uppercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.country_code);

        let role_prefixes = match lookup("MATRICULE_ROLE_PREFIXES") {
            Some(raw) => match parse_role_prefixes(&raw) {
                Ok(table) => table,
                Err(err) => {
                    tracing::warn!(%err, "Ignoring MATRICULE_ROLE_PREFIXES");
                    defaults.role_prefixes
                }
            },
            None => defaults.role_prefixes,
        };

        let role_lookup = match lookup("MATRICULE_LEGACY_ROLE_LOOKUP").and_then(|v| parse_flag(&v))
        {
            Some(true) => RoleLookup::LegacyThreeChar,
            _ => RoleLookup::Exact,
        };

        let auto_generate_user = lookup("MATRICULE_AUTO_GENERATE_USER")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.auto_generate_user);

        let allow_custom_format = lookup("MATRICULE_ALLOW_CUSTOM")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.allow_custom_format);

        Self {
            max_attempts,
            country_code,
            role_prefixes,
            role_lookup,
            auto_generate_user,
            allow_custom_format,
        }
    }
}

impl Default for MatriculeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            country_code: DEFAULT_REGISTRATION_SCHOOL_CODE.to_string(),
            role_prefixes: RolePrefixTable::default(),
            role_lookup: RoleLookup::Exact,
            auto_generate_user: true,
            allow_custom_format: false,
        }
    }
}

/// Apply `role=PREFIX,...` overrides to the default prefix table.
pub fn parse_role_prefixes(raw: &str) -> Result<RolePrefixTable, PrefixTableError> {
    let mut table = RolePrefixTable::default();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (role, prefix) = pair.split_once('=').unwrap_or((pair, ""));
        table = table.with_override(RolePrefix::new(role.trim(), prefix.trim()))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::prefixes::roles;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> MatriculeConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MatriculeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.country_code, "TG");
        assert_eq!(config.role_lookup, RoleLookup::Exact);
        assert!(config.auto_generate_user);
        assert!(!config.allow_custom_format);
        assert_eq!(config.role_prefixes, RolePrefixTable::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MATRICULE_MAX_ATTEMPTS", "9"),
            ("MATRICULE_COUNTRY_CODE", "bj"),
            ("MATRICULE_LEGACY_ROLE_LOOKUP", "true"),
            ("MATRICULE_AUTO_GENERATE_USER", "no"),
            ("MATRICULE_ALLOW_CUSTOM", "1"),
            ("MATRICULE_ROLE_PREFIXES", "enseignant=ENS, bibliothécaire=BIB"),
        ]);

        assert_eq!(config.max_attempts, 9);
        assert_eq!(config.country_code, "BJ");
        assert_eq!(config.role_lookup, RoleLookup::LegacyThreeChar);
        assert!(!config.auto_generate_user);
        assert!(config.allow_custom_format);
        assert_eq!(config.role_prefixes.prefix_for(roles::TEACHER), Some("ENS"));
        assert_eq!(config.role_prefixes.prefix_for("bibliothécaire"), Some("BIB"));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let config = config_from(&[("MATRICULE_MAX_ATTEMPTS", "0")]);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = config_from(&[
            ("MATRICULE_MAX_ATTEMPTS", "lots"),
            ("MATRICULE_ROLE_PREFIXES", "enseignant=prof"),
        ]);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.role_prefixes, RolePrefixTable::default());
    }

    #[test]
    fn test_parse_role_prefixes_rejects_missing_prefix() {
        assert!(matches!(
            parse_role_prefixes("enseignant"),
            Err(PrefixTableError::InvalidPrefix(_))
        ));
        assert!(parse_role_prefixes("").is_ok());
    }
}
