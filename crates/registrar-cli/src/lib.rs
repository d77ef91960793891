//! # Registrar CLI
//!
//! Seeding utilities for development databases.
//!
//! ## Usage
//!
//! ```ignore
//! use registrar_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(2).with_accounts(20).with_students(50);
//! seed_all(&matricules, &events, config).await?;
//! ```

pub mod seeder;
