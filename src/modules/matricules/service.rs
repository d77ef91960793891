use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distributions::Alphanumeric;
use registrar_config::MatriculeConfig;
use registrar_core::format::{
    self, MAX_SEQUENCE, ParsedMatricule, four_digit_year, registration_school_code,
    student_school_code, two_digit_year,
};
use registrar_core::prefixes::RolePrefixTable;
use registrar_core::{Clock, IdentifierKind, MatriculeError, SystemClock};
use registrar_db::{IdentifierColumn, MatriculeStore};
use tracing::{debug, instrument};

use super::model::MatriculeInfo;
use super::sequence::SequenceCounter;

/// Candidates tried by [`MatriculeService::generate_random_matricule`].
const RANDOM_ATTEMPTS: u32 = 16;
const RANDOM_SUFFIX_LEN: usize = 8;

/// Generates and inspects matricules and registration numbers.
///
/// Generation is count based: the next sequence in a scope is the number of
/// identifiers already stored there plus one, skipping values that are
/// taken. The result is provisional until it is written; callers persist it
/// through a uniqueness-constrained write and retry on conflict.
#[derive(Debug)]
pub struct MatriculeService<S> {
    store: S,
    config: MatriculeConfig,
    clock: Arc<dyn Clock>,
}

impl<S: MatriculeStore> MatriculeService<S> {
    pub fn new(store: S, config: MatriculeConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, config: MatriculeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MatriculeConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn prefixes(&self) -> &RolePrefixTable {
        &self.config.role_prefixes
    }

    /// Prefix used for `role`; `USR` when the role is not in the table.
    pub fn prefix_for_role(&self, role: &str) -> &str {
        self.config.role_prefixes.prefix_or_default(role)
    }

    pub fn role_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.config.role_prefixes.role_for_prefix(prefix)
    }

    /// Next matricule for `role` in the current year, e.g. `PROF26003`.
    ///
    /// Unknown roles use the `USR` prefix. `school_code` does not take part
    /// in the user matricule format.
    #[instrument(skip(self))]
    pub async fn generate_user_matricule(
        &self,
        role: &str,
        school_code: Option<&str>,
    ) -> Result<String, MatriculeError> {
        let prefix = self.prefix_for_role(role);
        let year = two_digit_year(self.clock.year());

        let sequence = SequenceCounter::new(&self.store)
            .next_user_sequence(prefix, &year)
            .await?;

        let scope = format::user_scope_prefix(prefix, &year);
        let matricule = self
            .first_free(IdentifierColumn::Matricule, &scope, sequence, |seq| {
                format::format_user_matricule(prefix, &year, seq)
            })
            .await?;

        debug!(%matricule, "Generated user matricule");
        Ok(matricule)
    }

    /// Next student matricule for the school, e.g. `ECOSTU26001`.
    ///
    /// `class_code` is accepted for callers that have one but does not
    /// affect the result.
    #[instrument(skip(self))]
    pub async fn generate_student_matricule(
        &self,
        school_code: Option<&str>,
        class_code: Option<&str>,
    ) -> Result<String, MatriculeError> {
        let school = student_school_code(school_code);
        let year = two_digit_year(self.clock.year());

        let sequence = SequenceCounter::new(&self.store)
            .next_student_sequence(&school, &year)
            .await?;

        let scope = format::student_scope_prefix(&school, &year);
        let matricule = self
            .first_free(IdentifierColumn::StudentMatricule, &scope, sequence, |seq| {
                format::format_student_matricule(Some(&school), &year, seq)
            })
            .await?;

        debug!(%matricule, "Generated student matricule");
        Ok(matricule)
    }

    /// Next registration number, e.g. `REG-TG-2026-001`.
    ///
    /// Without a school code the configured country code is used.
    #[instrument(skip(self))]
    pub async fn generate_registration_number(
        &self,
        school_code: Option<&str>,
        class_code: Option<&str>,
    ) -> Result<String, MatriculeError> {
        let code = school_code
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.config.country_code);
        let school = registration_school_code(Some(code));
        let year = four_digit_year(self.clock.year());

        let sequence = SequenceCounter::new(&self.store)
            .next_registration_sequence(&school, &year)
            .await?;

        let scope = format::registration_scope_prefix(&school, &year);
        let number = self
            .first_free(IdentifierColumn::RegistrationNumber, &scope, sequence, |seq| {
                format::format_registration_number(Some(&school), &year, seq)
            })
            .await?;

        debug!(registration_number = %number, "Generated registration number");
        Ok(number)
    }

    /// Starting at `sequence`, the first formatted value not already stored.
    ///
    /// Count-based sequences collide with existing rows when a scope has
    /// gaps; stepping forward keeps generation total in that case.
    async fn first_free<F>(
        &self,
        column: IdentifierColumn,
        scope: &str,
        mut sequence: u32,
        render: F,
    ) -> Result<String, MatriculeError>
    where
        F: Fn(u32) -> String + Send + Sync,
    {
        loop {
            if sequence > MAX_SEQUENCE {
                return Err(MatriculeError::generation_failed(
                    scope,
                    format!("sequence {sequence} exceeds {MAX_SEQUENCE}"),
                ));
            }

            let candidate = render(sequence);
            if !self.store.exists(column, &candidate).await? {
                return Ok(candidate);
            }
            sequence += 1;
        }
    }

    #[instrument(skip(self))]
    pub async fn matricule_exists(&self, value: &str) -> Result<bool, MatriculeError> {
        Ok(self.store.exists(IdentifierColumn::Matricule, value).await?)
    }

    #[instrument(skip(self))]
    pub async fn registration_number_exists(&self, value: &str) -> Result<bool, MatriculeError> {
        Ok(self
            .store
            .exists(IdentifierColumn::RegistrationNumber, value)
            .await?)
    }

    pub fn parse_matricule(&self, value: &str) -> Option<ParsedMatricule> {
        format::parse(value)
    }

    /// Role whose prefix issued `value`, honouring the configured lookup mode.
    pub fn role_from_matricule(&self, value: &str) -> Option<&str> {
        self.config
            .role_prefixes
            .role_for_identifier(value, self.config.role_lookup)
    }

    /// A non-sequential matricule `{prefix}-{unix_ts}-{8 alphanumerics}` for
    /// manual cases. Retries while the candidate is taken.
    #[instrument(skip(self))]
    pub async fn generate_random_matricule(&self, prefix: &str) -> Result<String, MatriculeError> {
        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = random_matricule(prefix);
            if !self.matricule_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(MatriculeError::generation_failed(
            prefix,
            format!("{RANDOM_ATTEMPTS} random candidates were all taken"),
        ))
    }

    /// Shape, parse result, role and ownership of `value`.
    #[instrument(skip(self))]
    pub async fn inspect(&self, value: &str) -> Result<MatriculeInfo, MatriculeError> {
        let kind = IdentifierKind::detect(value)
            .ok_or_else(|| MatriculeError::ParsingFailed(value.to_string()))?;

        let column = match kind {
            IdentifierKind::UserMatricule => IdentifierColumn::Matricule,
            IdentifierKind::StudentMatricule => IdentifierColumn::StudentMatricule,
            IdentifierKind::RegistrationNumber => IdentifierColumn::RegistrationNumber,
        };
        let owner = self.store.find_owner(column, value).await?;

        Ok(MatriculeInfo {
            value: value.to_string(),
            kind,
            parsed: self.parse_matricule(value),
            role: self.role_from_matricule(value).map(str::to_string),
            exists: owner.is_some(),
            owner_id: owner,
        })
    }
}

fn random_matricule(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("{prefix}-{timestamp}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::FixedClock;
    use registrar_core::prefixes::roles;
    use registrar_db::MemoryStore;

    fn service() -> MatriculeService<MemoryStore> {
        let clock = FixedClock::at_year(2026).unwrap();
        MatriculeService::with_clock(
            MemoryStore::new(),
            MatriculeConfig::default(),
            Arc::new(clock),
        )
    }

    #[tokio::test]
    async fn test_generate_user_matricule_uses_role_prefix() {
        let service = service();
        for (role, expected) in [
            (roles::ADMINISTRATOR, "ADM26001"),
            (roles::DIRECTOR, "DIR26001"),
            (roles::TEACHER, "PROF26001"),
            (roles::ACCOUNTING, "COMPT26001"),
            (roles::SECRETARIAT, "SEC26001"),
            ("janitor", "USR26001"),
        ] {
            assert_eq!(
                service.generate_user_matricule(role, None).await.unwrap(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_generate_registration_number_defaults_to_country_code() {
        let service = service();
        assert_eq!(
            service.generate_registration_number(None, None).await.unwrap(),
            "REG-TG-2026-001"
        );
        assert_eq!(
            service
                .generate_registration_number(Some("ECO"), Some("6A"))
                .await
                .unwrap(),
            "REG-EC-2026-001"
        );
    }

    #[tokio::test]
    async fn test_generate_student_matricule_truncates_school() {
        let service = service();
        let matricule = service
            .generate_student_matricule(Some("LOME"), None)
            .await
            .unwrap();
        assert_eq!(matricule, "LOMSTU26001");
    }

    #[tokio::test]
    async fn test_random_matricule_shape() {
        let service = service();
        let value = service.generate_random_matricule("TMP").await.unwrap();
        let parts: Vec<&str> = value.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TMP");
        assert!(parts[1].parse::<u64>().is_ok());
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_role_from_matricule_round_trip() {
        let service = service();
        for entry in service.prefixes().iter() {
            let matricule = format::format_user_matricule(&entry.prefix, "26", 1);
            assert_eq!(
                service.role_from_matricule(&matricule),
                Some(entry.role.as_str())
            );
        }
        assert_eq!(service.role_from_matricule("USR26001"), None);
    }

    #[tokio::test]
    async fn test_inspect_rejects_unknown_shapes() {
        let service = service();
        let err = service.inspect("hello").await.unwrap_err();
        assert!(matches!(err, MatriculeError::ParsingFailed(_)));

        let info = service.inspect("PROF26001").await.unwrap();
        assert_eq!(info.kind, IdentifierKind::UserMatricule);
        assert_eq!(info.role.as_deref(), Some(roles::TEACHER));
        assert!(!info.exists);
    }
}
