//! Development data seeding.
//!
//! Everything is written through the same services the API uses, so seeded
//! rows carry real matricules and registration numbers.

pub mod accounts;
pub mod models;
pub mod schools;

use registrar::events::EventSink;
use registrar::modules::matricules::MatriculeService;
use registrar_db::MatriculeStore;
use std::time::Instant;

pub use models::{AccountSeed, SchoolSeed, SeedConfig, SeedSummary, SeededClass};

/// Seeds schools, staff and enrolled students.
pub async fn seed_all<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    events: &dyn EventSink,
    config: SeedConfig,
) -> anyhow::Result<SeedSummary> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let classes = schools::seed_schools(matricules, config.num_schools).await?;
    let accounts = accounts::seed_staff(matricules, events, config.accounts).await?;
    let students =
        accounts::seed_students(matricules, events, &classes, config.students).await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());

    Ok(SeedSummary {
        schools: classes.len(),
        accounts,
        students,
    })
}
