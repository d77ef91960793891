//! Data models for database seeding configuration.

use registrar_models::{ClassId, SchoolId};

/// Seed data for creating a school and its first class.
#[derive(Debug, Clone)]
pub struct SchoolSeed {
    pub name: String,
    pub code: String,
    pub class_name: String,
    pub class_code: String,
}

/// Seed data for creating an account.
#[derive(Debug, Clone)]
pub struct AccountSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

/// A seeded class together with its school.
#[derive(Debug, Clone, Copy)]
pub struct SeededClass {
    pub school_id: SchoolId,
    pub class_id: ClassId,
}

/// Complete configuration for database seeding.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub num_schools: usize,
    /// Staff accounts, spread over the known roles.
    pub accounts: usize,
    /// Student accounts, each enrolled in one of the seeded classes.
    pub students: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            num_schools: 1,
            accounts: 20,
            students: 50,
        }
    }
}

impl SeedConfig {
    pub fn new(num_schools: usize) -> Self {
        Self {
            num_schools,
            ..Default::default()
        }
    }

    pub fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }
}

/// Counts of what a seed run inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub schools: usize,
    pub accounts: usize,
    pub students: usize,
}
