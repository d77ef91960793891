use registrar_core::MatriculeError;
use registrar_db::{MatriculeStore, StoreError, UniqueField};
use registrar_models::{
    AccountWithRoles, CreateAccountDto, MatriculeGenerated, NewAccountRecord, UserId,
};
use tracing::{info, instrument};

use crate::events::EventSink;
use crate::hooks::{MatriculeSubject, PendingAccount, retry_on_conflict, write_verbatim};
use crate::metrics::{track_generation_failure, track_matricule_generated};
use crate::modules::matricules::MatriculeService;
use crate::modules::matricules::model::MatriculeAssignment;
use crate::modules::matricules::rules::UniqueMatricule;
use registrar_core::prefixes::roles;

pub struct AccountService;

impl AccountService {
    /// Insert an account, assigning a matricule from its primary role when
    /// none was supplied.
    ///
    /// A supplied matricule must be well formed and unused unless custom
    /// formats are allowed.
    #[instrument(skip(matricules, events, dto), fields(email = %dto.email))]
    pub async fn create_account<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        events: &dyn EventSink,
        dto: CreateAccountDto,
    ) -> Result<AccountWithRoles, MatriculeError> {
        let pending = PendingAccount::new(NewAccountRecord::from(dto));
        let store = matricules.store();
        let record = &pending.record;
        let describe = |field: UniqueField| match field {
            UniqueField::Email => format!("email {}", record.email),
            other => other.to_string(),
        };

        let account = if let Some(supplied) = record.matricule.as_deref() {
            if !matricules.config().allow_custom_format {
                UniqueMatricule::default().check(store, supplied).await?;
            }
            write_verbatim(
                supplied,
                UniqueField::Matricule,
                || store.insert_account(record, Some(supplied)),
                describe,
            )
            .await?
        } else if !matricules.config().auto_generate_user {
            store
                .insert_account(record, None)
                .await
                .map_err(|err| match err {
                    StoreError::UniqueViolation(field) => {
                        MatriculeError::AlreadyExists(describe(field))
                    }
                    other => other.into(),
                })?
        } else {
            let subject = &pending;
            let (account, matricule) = retry_on_conflict(
                matricules.config().max_attempts,
                UniqueField::Matricule,
                move || subject.generate_identifier(matricules),
                move |candidate| async move { store.insert_account(record, Some(&candidate)).await },
                describe,
            )
            .await
            .inspect_err(|err| {
                if matches!(err, MatriculeError::GenerationFailed { .. }) {
                    track_generation_failure("user");
                }
            })?;

            track_matricule_generated(subject.kind().as_str());
            events.publish(&MatriculeGenerated::for_user(
                &matricule,
                account.id.into_inner(),
                pending.event_role(),
            ));
            account
        };

        info!(user_id = %account.id, matricule = ?account.matricule, "Account created");

        let roles = store.account_roles(account.id).await?;
        Ok(AccountWithRoles { account, roles })
    }

    #[instrument(skip(matricules))]
    pub async fn get_account<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        id: UserId,
    ) -> Result<AccountWithRoles, MatriculeError> {
        let store = matricules.store();
        let account = store
            .find_account(id)
            .await?
            .ok_or_else(|| MatriculeError::model_not_found("user", id))?;
        let roles = store.account_roles(id).await?;

        Ok(AccountWithRoles { account, roles })
    }

    /// Give an existing account a matricule from its primary role.
    ///
    /// An account that already has one keeps it unless `force` is set.
    #[instrument(skip(matricules, events))]
    pub async fn regenerate_matricule<S: MatriculeStore>(
        matricules: &MatriculeService<S>,
        events: &dyn EventSink,
        id: UserId,
        force: bool,
    ) -> Result<MatriculeAssignment, MatriculeError> {
        let store = matricules.store();
        let account = store
            .find_account(id)
            .await?
            .ok_or_else(|| MatriculeError::model_not_found("user", id))?;

        if let Some(existing) = account.matricule.filter(|_| !force) {
            return Ok(MatriculeAssignment {
                subject_id: id.into_inner(),
                identifier: existing,
                generated: false,
            });
        }

        let role = store.primary_role_of(id).await?;
        let role = role.as_deref();

        let (_, matricule) = retry_on_conflict(
            matricules.config().max_attempts,
            UniqueField::Matricule,
            move || matricules.generate_user_matricule(role.unwrap_or_default(), None),
            move |candidate| async move { store.set_matricule(id, &candidate).await },
            |field| field.to_string(),
        )
        .await
        .inspect_err(|err| {
            if matches!(err, MatriculeError::GenerationFailed { .. }) {
                track_generation_failure("user");
            }
        })?;

        track_matricule_generated("user");
        events.publish(&MatriculeGenerated::for_user(
            &matricule,
            id.into_inner(),
            role.unwrap_or(roles::UNKNOWN),
        ));
        info!(user_id = %id, %matricule, "Matricule assigned");

        Ok(MatriculeAssignment {
            subject_id: id.into_inner(),
            identifier: matricule,
            generated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use registrar_config::MatriculeConfig;
    use registrar_core::FixedClock;
    use registrar_db::MemoryStore;

    use crate::events::RecordingEventSink;

    fn service(config: MatriculeConfig) -> MatriculeService<MemoryStore> {
        let clock = FixedClock::at_year(2026).unwrap();
        MatriculeService::with_clock(MemoryStore::new(), config, Arc::new(clock))
    }

    fn dto(email: &str, roles: &[&str]) -> CreateAccountDto {
        CreateAccountDto {
            first_name: "Kossi".into(),
            last_name: "Mensah".into(),
            email: email.into(),
            matricule: None,
            school_id: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_account_generates_from_primary_role() {
        let matricules = service(MatriculeConfig::default());
        let events = RecordingEventSink::new();

        let created = AccountService::create_account(
            &matricules,
            &events,
            dto("kossi@example.com", &[roles::TEACHER, roles::SECRETARIAT]),
        )
        .await
        .unwrap();

        assert_eq!(created.account.matricule.as_deref(), Some("PROF26001"));
        assert_eq!(created.roles, vec![roles::TEACHER, roles::SECRETARIAT]);

        let recorded = events.events();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].identifier, "PROF26001");
        assert_eq!(recorded[0].role, roles::TEACHER);
        assert_eq!(recorded[0].subject_id, created.account.id.into_inner());
    }

    #[tokio::test]
    async fn test_supplied_matricule_must_be_well_formed() {
        let matricules = service(MatriculeConfig::default());
        let events = RecordingEventSink::new();

        let mut request = dto("ama@example.com", &[roles::TEACHER]);
        request.matricule = Some("hello world; drop".into());
        let err = AccountService::create_account(&matricules, &events, request)
            .await
            .unwrap_err();
        assert!(matches!(err, MatriculeError::InvalidFormat(ref v) if v == "hello world; drop"));
        assert!(
            matricules
                .store()
                .list_accounts(Default::default())
                .await
                .unwrap()
                .is_empty()
        );

        let mut request = dto("ama@example.com", &[roles::TEACHER]);
        request.matricule = Some("PROF25014".into());
        let created = AccountService::create_account(&matricules, &events, request)
            .await
            .unwrap();
        assert_eq!(created.account.matricule.as_deref(), Some("PROF25014"));
        assert!(events.events().is_empty());

        let mut request = dto("yawa@example.com", &[roles::TEACHER]);
        request.matricule = Some("PROF25014".into());
        let err = AccountService::create_account(&matricules, &events, request)
            .await
            .unwrap_err();
        assert!(matches!(err, MatriculeError::AlreadyExists(ref v) if v == "PROF25014"));
    }

    #[tokio::test]
    async fn test_custom_matricule_allowed_by_config() {
        let config = MatriculeConfig {
            allow_custom_format: true,
            ..MatriculeConfig::default()
        };
        let matricules = service(config);
        let events = RecordingEventSink::new();

        let mut request = dto("ama@example.com", &[roles::TEACHER]);
        request.matricule = Some("CUSTOM-1".into());
        let created = AccountService::create_account(&matricules, &events, request)
            .await
            .unwrap();

        assert_eq!(created.account.matricule.as_deref(), Some("CUSTOM-1"));
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_reported() {
        let matricules = service(MatriculeConfig::default());
        let events = RecordingEventSink::new();

        AccountService::create_account(&matricules, &events, dto("dup@example.com", &[]))
            .await
            .unwrap();
        let err = AccountService::create_account(&matricules, &events, dto("dup@example.com", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, MatriculeError::AlreadyExists(ref v) if v == "email dup@example.com"));
    }

    #[tokio::test]
    async fn test_auto_generation_can_be_disabled() {
        let config = MatriculeConfig {
            auto_generate_user: false,
            ..MatriculeConfig::default()
        };
        let matricules = service(config);
        let events = RecordingEventSink::new();

        let created = AccountService::create_account(
            &matricules,
            &events,
            dto("yao@example.com", &[roles::DIRECTOR]),
        )
        .await
        .unwrap();

        assert_eq!(created.account.matricule, None);
        assert!(events.events().is_empty());

        let assignment =
            AccountService::regenerate_matricule(&matricules, &events, created.account.id, false)
                .await
                .unwrap();
        assert!(assignment.generated);
        assert_eq!(assignment.identifier, "DIR26001");
        assert_eq!(events.events().len(), 1);
    }

    #[tokio::test]
    async fn test_regenerate_keeps_existing_without_force() {
        let matricules = service(MatriculeConfig::default());
        let events = RecordingEventSink::new();
        let created = AccountService::create_account(
            &matricules,
            &events,
            dto("efua@example.com", &[roles::ACCOUNTING]),
        )
        .await
        .unwrap();

        let kept =
            AccountService::regenerate_matricule(&matricules, &events, created.account.id, false)
                .await
                .unwrap();
        assert!(!kept.generated);
        assert_eq!(kept.identifier, "COMPT26001");

        let forced =
            AccountService::regenerate_matricule(&matricules, &events, created.account.id, true)
                .await
                .unwrap();
        assert!(forced.generated);
        assert_eq!(forced.identifier, "COMPT26002");
    }

    #[tokio::test]
    async fn test_get_missing_account() {
        let matricules = service(MatriculeConfig::default());
        let err = AccountService::get_account(&matricules, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MatriculeError::ModelNotFound { kind: "user", .. }));
    }
}
