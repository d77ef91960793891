//! Account and student seeding.
//!
//! Staff accounts go through the regular account creation path, so each
//! one receives a matricule from its role. Students are enrolled in the
//! seeded classes and then given a student matricule.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use registrar::events::EventSink;
use registrar::modules::matricules::MatriculeService;
use registrar::modules::students::service::EnrollmentService;
use registrar::modules::users::service::AccountService;
use registrar_core::prefixes::roles;
use registrar_db::MatriculeStore;
use registrar_models::{CreateAccountDto, CreateEnrollmentDto, NewAccountRecord, UserId};
use std::time::Instant;
use uuid::Uuid;

use super::models::{AccountSeed, SeededClass};

const STAFF_ROLES: [&str; 5] = [
    roles::TEACHER,
    roles::TEACHER,
    roles::SECRETARIAT,
    roles::ACCOUNTING,
    roles::ADMINISTRATOR,
];

/// Generates staff accounts in parallel, cycling through the staff roles.
pub fn generate_staff(count: usize) -> Vec<AccountSeed> {
    let batch = batch_tag();
    (0..count)
        .into_par_iter()
        .map(|idx| generate_account(STAFF_ROLES[idx % STAFF_ROLES.len()], &batch, idx))
        .collect()
}

pub fn generate_students(count: usize) -> Vec<AccountSeed> {
    let batch = batch_tag();
    (0..count)
        .into_par_iter()
        .map(|idx| generate_account(roles::STUDENT, &batch, idx))
        .collect()
}

/// Keeps emails unique across seed runs.
fn batch_tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn generate_account(role: &str, batch: &str, idx: usize) -> AccountSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    let email = format!(
        "{}.{}+{}{}@example.com",
        email_part(&first_name),
        email_part(&last_name),
        batch,
        idx
    );

    AccountSeed {
        first_name,
        last_name,
        email,
        role: role.to_string(),
    }
}

fn email_part(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

pub async fn seed_staff<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    events: &dyn EventSink,
    count: usize,
) -> anyhow::Result<usize> {
    let start_time = Instant::now();
    println!("👩‍🏫 Seeding {} staff accounts...", count);

    let mut created = 0;
    for seed in generate_staff(count) {
        let dto = CreateAccountDto {
            first_name: seed.first_name,
            last_name: seed.last_name,
            email: seed.email,
            matricule: None,
            school_id: None,
            roles: vec![seed.role],
        };
        AccountService::create_account(matricules, events, dto).await?;
        created += 1;
    }

    println!(
        "   ✓ Inserted {} staff accounts in {:?}",
        created,
        start_time.elapsed()
    );
    Ok(created)
}

/// Creates student accounts, enrolls them round-robin in `classes` and
/// assigns their student matricules.
pub async fn seed_students<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    events: &dyn EventSink,
    classes: &[SeededClass],
    count: usize,
) -> anyhow::Result<usize> {
    let start_time = Instant::now();
    println!("🎒 Seeding {} students...", count);

    let store = matricules.store();
    let today = matricules.clock().now().date_naive();
    let mut created = 0;

    for (idx, seed) in generate_students(count).into_iter().enumerate() {
        let class = classes.get(idx % classes.len().max(1));
        let record = NewAccountRecord {
            id: UserId::new(),
            first_name: seed.first_name,
            last_name: seed.last_name,
            email: seed.email,
            matricule: None,
            school_id: class.map(|c| c.school_id),
            roles: vec![seed.role],
        };
        store.insert_account(&record, None).await?;

        let enrollment = EnrollmentService::create_enrollment(
            matricules,
            events,
            CreateEnrollmentDto {
                user_id: record.id,
                class_id: class.map(|c| c.class_id),
                registration_number: None,
                parent_name: None,
                parent_phone: None,
                parent_email: None,
                enrollment_date: Some(today),
                active: Some(true),
            },
        )
        .await?;
        EnrollmentService::generate_student_matricule(matricules, events, enrollment.id, false)
            .await?;
        created += 1;
    }

    println!(
        "   ✓ Inserted {} students in {:?}",
        created,
        start_time.elapsed()
    );
    Ok(created)
}
