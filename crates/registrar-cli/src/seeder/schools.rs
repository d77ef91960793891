//! School seeding functionality.

use fake::Fake;
use fake::faker::address::en::CityName;
use rayon::prelude::*;
use registrar::modules::matricules::MatriculeService;
use registrar_db::MatriculeStore;
use registrar_models::{Class, ClassId, School, SchoolId};
use std::time::Instant;

use super::models::{SchoolSeed, SeededClass};

const CLASS_NAMES: [(&str, &str); 4] = [
    ("Sixième A", "6A"),
    ("Cinquième B", "5B"),
    ("Seconde C", "2C"),
    ("Terminale D", "TD"),
];

/// Generates school data in parallel using Rayon
pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let city: String = CityName().fake();
            let (class_name, class_code) = CLASS_NAMES[idx % CLASS_NAMES.len()];

            SchoolSeed {
                code: school_code(&city),
                name: format!("Collège de {}", city),
                class_name: class_name.to_string(),
                class_code: class_code.to_string(),
            }
        })
        .collect()
}

/// First three letters of the city, uppercased.
fn school_code(city: &str) -> String {
    city.chars()
        .filter(char::is_ascii_alphabetic)
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Inserts the schools and one class for each.
pub async fn seed_schools<S: MatriculeStore>(
    matricules: &MatriculeService<S>,
    count: usize,
) -> anyhow::Result<Vec<SeededClass>> {
    let start_time = Instant::now();
    println!("📚 Seeding {} schools...", count);

    let store = matricules.store();
    let mut classes = Vec::with_capacity(count);

    for seed in generate_schools(count) {
        let school = store
            .insert_school(&School {
                id: SchoolId::new(),
                name: seed.name,
                code: Some(seed.code),
            })
            .await?;
        let class = store
            .insert_class(&Class {
                id: ClassId::new(),
                school_id: school.id,
                name: seed.class_name,
                code: Some(seed.class_code),
            })
            .await?;

        classes.push(SeededClass {
            school_id: school.id,
            class_id: class.id,
        });
    }

    println!(
        "   ✓ Inserted {} schools in {:?}",
        classes.len(),
        start_time.elapsed()
    );

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_code() {
        assert_eq!(school_code("Lomé"), "LOM");
        assert_eq!(school_code("St. Paul"), "STP");
        assert_eq!(school_code("Xi"), "XI");
    }

    #[test]
    fn test_generate_schools() {
        let schools = generate_schools(6);
        assert_eq!(schools.len(), 6);
        assert!(schools.iter().all(|s| s.name.starts_with("Collège de ")));
    }
}
